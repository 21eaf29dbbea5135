//! The `sheetsync` run: read the config, settle paths, reconcile, report.

use std::path::{Path, PathBuf};

use sheetsync_recon::config::resolve_path;
use sheetsync_recon::{RunOptions, RunReport, SyncConfig};

use crate::prompt::{existing_path, PathPrompt, TerminalPrompt};
use crate::store::XlsxStore;
use crate::{Cli, CliError};

pub fn cmd_sync(cli: Cli) -> Result<(), CliError> {
    let interactive = !cli.no_prompt && atty::is(atty::Stream::Stdin);
    let terminal = TerminalPrompt;
    let prompt: Option<&dyn PathPrompt> = if interactive { Some(&terminal as &dyn PathPrompt) } else { None };

    let config_path = existing_path(cli.config, "config file", prompt)?;
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    let mut config = SyncConfig::from_json(&config_str)?;
    log::debug!("config loaded from {}", config_path.display());

    let base_dir = match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if let Some(target) = cli.target {
        config.target_file_name = absolute(&target)?.display().to_string();
    }
    let configured = resolve_path(&base_dir, &config.target_file_name);
    let target = existing_path(configured.clone(), "target workbook", prompt)?;
    if target != configured {
        config.target_file_name = absolute(&target)?.display().to_string();
    }

    let options = RunOptions { base_dir, dry_run: cli.dry_run };
    let report = sheetsync_recon::run(&config, &XlsxStore, &options)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }
    if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

/// Anchor a user-given path to the working directory.
fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::io(format!("cannot read working directory: {e}")))?;
    Ok(cwd.join(path))
}

fn print_summary(report: &RunReport) {
    eprintln!(
        "{} cell(s) updated in {} row(s) of '{}' ({} rows scanned)",
        report.update_count(),
        report.rows_updated,
        report.sheet,
        report.rows_scanned
    );
    for source in &report.sources {
        eprintln!(
            "  source {}: {} keys ({} rows, {} filtered)",
            source.name, source.entries, source.rows_scanned, source.rows_filtered
        );
    }
    for skipped in &report.skipped_sources {
        eprintln!("  skipped {}: {}", skipped.name, skipped.reason);
    }
    for skipped in &report.skipped_cells {
        eprintln!("  not written {} ({}): {}", skipped.cell, skipped.source, skipped.reason);
    }
    match &report.output {
        Some(path) => eprintln!("wrote {path}"),
        None => eprintln!("dry run: nothing written"),
    }
}
