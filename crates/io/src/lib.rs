// Workbook file I/O

pub mod xlsx;
pub mod xlsx_styles;
pub mod xlsx_validation;

pub use xlsx::{export, import, ExportResult, ImportResult};
