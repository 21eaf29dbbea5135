//! `sheetsync-engine`: in-memory workbook model.
//!
//! Sheets, cells, typed values, formats and validation rules. No file I/O;
//! the `sheetsync-io` crate converts between this model and spreadsheet files.

pub mod address;
pub mod cell;
pub mod sheet;
pub mod validation;
pub mod workbook;

pub use cell::{Cell, CellFormat, CellText, CellValue};
pub use sheet::Sheet;
pub use workbook::Workbook;
