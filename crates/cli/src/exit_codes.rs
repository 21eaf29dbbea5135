//! CLI Exit Code Registry
//!
//! Single source of truth for `sheetsync` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | Success; summary printed                                       |
//! | 1    | Fatal configuration error (invalid config, sheet or column not found) |
//! | 2    | Usage error (bad arguments, missing path with prompting disabled) |
//! | 3    | I/O error (unreadable or unwritable workbook or config)        |
//!
//! clap exits with 2 on its own for malformed arguments, which matches
//! `EXIT_USAGE`.

use sheetsync_recon::ReconError;

/// Success - reconciliation ran (with or without updates).
pub const EXIT_SUCCESS: u8 = 0;

/// Configuration error - the config or the target workbook does not fit.
pub const EXIT_CONFIG: u8 = 1;

/// Usage error - bad arguments, or a path is missing and we may not prompt.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - a workbook or the config could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Io(_) => EXIT_IO,
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::SheetNotFound { .. }
        | ReconError::MissingTargetColumn { .. } => EXIT_CONFIG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_CONFIG, EXIT_USAGE, EXIT_IO];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn recon_errors_map_to_codes() {
        assert_eq!(recon_exit_code(&ReconError::Io("disk".into())), EXIT_IO);
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("eof".into())), EXIT_CONFIG);
        assert_eq!(
            recon_exit_code(&ReconError::SheetNotFound { sheet: "Sheet1".into(), available: vec![] }),
            EXIT_CONFIG
        );
        assert_eq!(
            recon_exit_code(&ReconError::MissingTargetColumn {
                setting: "targetColumnName",
                column: "Status".into(),
            }),
            EXIT_CONFIG
        );
    }
}
