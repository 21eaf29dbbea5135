// sheetsync CLI - copy values from source workbooks into a target sheet

mod exit_codes;
mod prompt;
mod store;
mod sync;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use env_logger::Env;
use sheetsync_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sheetsync")]
#[command(about = "Update a target spreadsheet column from source workbooks, matched by identifier")]
#[command(version)]
#[command(after_help = "\
Examples:
  sheetsync                         # uses ./config.json
  sheetsync jobs/weekly.json --dry-run
  sheetsync config.json --target out/orders.xlsx --json
  RUST_LOG=debug sheetsync config.json")]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(default_value = "config.json", env = "SHEETSYNC_CONFIG")]
    pub config: PathBuf,

    /// Target workbook, overriding targetFileName
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Reconcile and report without writing the workbook
    #[arg(long)]
    pub dry_run: bool,

    /// Never prompt; a missing config or target is a usage error
    #[arg(long)]
    pub no_prompt: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Only warnings and errors in the log stream
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug log stream (-vv for trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

fn init_logger(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.quiet, cli.verbose);

    match sync::cmd_sync(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::SheetNotFound { .. } => Some("check targetSheetName in the config".to_string()),
            ReconError::MissingTargetColumn { setting, .. } => {
                Some(format!("{setting} must match a header in the header row (headerRow)"))
            }
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}
