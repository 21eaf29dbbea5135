use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::OutputMode;

/// Format of the suffix added in timestamped mode.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where the reconciled workbook goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    pub path: PathBuf,
    /// Set when the extension had to change to `.xlsx`.
    pub warning: Option<String>,
}

/// Derive the output path for `target`.
///
/// Overwrite mode keeps the target path; timestamped mode writes
/// `<stem><YYYYMMDDHHMMSS>.<ext>` next to it. The writer only produces xlsx,
/// so any other extension is replaced by `xlsx`.
pub fn output_path(target: &Path, mode: OutputMode, now: NaiveDateTime) -> OutputPath {
    let extension = target.extension().and_then(|e| e.to_str());
    let is_xlsx = extension.is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    let extension = if is_xlsx { extension.unwrap_or("xlsx") } else { "xlsx" };

    let path = match mode {
        OutputMode::Overwrite => target.with_extension(extension),
        OutputMode::Timestamped => {
            let stem = target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file_name = format!("{}{}.{}", stem, now.format(TIMESTAMP_FORMAT), extension);
            target.with_file_name(file_name)
        }
    };

    let warning = (!is_xlsx).then(|| {
        format!(
            "{} is not an .xlsx file; writing {} instead",
            target.display(),
            path.display()
        )
    });

    OutputPath { path, warning }
}
