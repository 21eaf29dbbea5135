//! `sheetsync-recon`: spreadsheet reconciliation engine.
//!
//! Pure engine crate: receives workbooks through a [`WorkbookStore`], copies
//! values from source sheets into the target sheet, returns a run report.
//! No CLI or file-format dependencies.

pub mod config;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod header;
pub mod index;
pub mod key;
pub mod model;
pub mod output;
pub mod reconcile;

pub use config::SyncConfig;
pub use engine::{run, RunOptions, WorkbookStore};
pub use error::ReconError;
pub use model::{CellUpdate, RunReport, SkippedCell, SkippedSource, SourceSummary};
