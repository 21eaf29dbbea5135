use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// JSON parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad header row, malformed color, etc.).
    ConfigValidation(String),
    /// The configured target sheet does not exist in the target workbook.
    SheetNotFound { sheet: String, available: Vec<String> },
    /// A target column named by a setting is absent from the header row.
    MissingTargetColumn { setting: &'static str, column: String },
    /// IO error (workbook read/write, config read).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SheetNotFound { sheet, available } => {
                write!(
                    f,
                    "sheet '{sheet}' not found (targetSheetName); workbook has: {}",
                    available.join(", ")
                )
            }
            Self::MissingTargetColumn { setting, column } => {
                write!(f, "target column '{column}' ({setting}) not found in header row")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
