//! File-backed workbook store: calamine for reading, rust_xlsxwriter for writing.

use std::path::Path;

use sheetsync_engine::Workbook;
use sheetsync_recon::WorkbookStore;

pub struct XlsxStore;

impl WorkbookStore for XlsxStore {
    fn load(&self, path: &Path) -> Result<Workbook, String> {
        let (workbook, result) = sheetsync_io::import(path)?;
        log::debug!("read {}: {}", path.display(), result.summary());
        if result.has_warnings() {
            for warning in &result.warnings {
                log::warn!("{}: {}", path.display(), warning);
            }
        }
        Ok(workbook)
    }

    fn save(&self, workbook: &Workbook, path: &Path) -> Result<(), String> {
        let result = sheetsync_io::export(workbook, path)?;
        log::debug!("wrote {}: {}", path.display(), result.summary());
        if result.errors_as_text > 0 {
            log::warn!(
                "{}: {} error value(s) written as text",
                path.display(),
                result.errors_as_text
            );
        }
        if result.has_warnings() {
            for warning in &result.warnings {
                log::warn!("{}: {}", path.display(), warning);
            }
        }
        Ok(())
    }
}
