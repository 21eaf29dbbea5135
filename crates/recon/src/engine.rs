use std::path::{Path, PathBuf};

use sheetsync_engine::workbook::Workbook;

use crate::config::{resolve_path, SyncConfig};
use crate::error::ReconError;
use crate::header::HeaderIndex;
use crate::index::{build_source_index, SourceIndex};
use crate::model::{RunMeta, RunReport, SkippedSource, SourceSummary};
use crate::output::output_path;
use crate::reconcile::{Reconciler, SourceLookup};

/// Loads and saves workbooks for a run.
///
/// Errors are plain messages; the engine wraps them in [`ReconError::Io`].
pub trait WorkbookStore {
    fn load(&self, path: &Path) -> Result<Workbook, String>;
    fn save(&self, workbook: &Workbook, path: &Path) -> Result<(), String>;
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory relative file names in the config are resolved against.
    pub base_dir: PathBuf,
    /// Reconcile and report without writing the workbook.
    pub dry_run: bool,
}

/// Run one reconciliation: load the target, index every source, update the
/// target sheet, then write the result.
pub fn run(
    config: &SyncConfig,
    store: &dyn WorkbookStore,
    options: &RunOptions,
) -> Result<RunReport, ReconError> {
    let target_path = resolve_path(&options.base_dir, &config.target_file_name);
    log::info!("reading target {}", target_path.display());
    let mut workbook = store
        .load(&target_path)
        .map_err(|e| ReconError::Io(format!("{}: {e}", target_path.display())))?;

    let sheet_index = workbook
        .sheet_index_by_name(&config.target_sheet_name)
        .ok_or_else(|| ReconError::SheetNotFound {
            sheet: config.target_sheet_name.clone(),
            available: workbook.sheet_names().iter().map(|s| s.to_string()).collect(),
        })?;

    let headers = match workbook.sheets().get(sheet_index) {
        Some(sheet) => HeaderIndex::build(sheet, config.header_row_index()),
        None => HeaderIndex::default(),
    };
    let reconciler = Reconciler::new(config, &headers)?;
    if let Some(col) = reconciler.columns().provenance {
        log::info!("provenance column -> column {}", col + 1);
    }

    let mut warnings = Vec::new();
    let mut skipped_sources = Vec::new();
    let mut indexes: Vec<Option<SourceIndex>> = Vec::with_capacity(config.source_files.len());

    for source in &config.source_files {
        let path = resolve_path(&options.base_dir, &source.file_name);
        let source_workbook = store
            .load(&path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;

        let built = match source_workbook.first_sheet() {
            Some(sheet) => build_source_index(source, sheet, config),
            None => Err("workbook has no worksheets".to_string()),
        };

        match built {
            Ok(index) => {
                log::info!("source '{}': {} entries indexed", source.file_name, index.len());
                indexes.push(Some(index));
            }
            Err(reason) => {
                log::warn!("skipping source '{}': {}", source.file_name, reason);
                skipped_sources.push(SkippedSource {
                    name: source.file_name.clone(),
                    reason,
                });
                indexes.push(None);
            }
        }
        // source_workbook is dropped here; only the index is kept
    }

    let lookups: Vec<SourceLookup<'_>> = config
        .source_files
        .iter()
        .zip(&indexes)
        .map(|(spec, index)| (spec, index.as_ref()))
        .collect();

    let sheet = workbook
        .sheet_mut(sheet_index)
        .ok_or_else(|| ReconError::SheetNotFound {
            sheet: config.target_sheet_name.clone(),
            available: Vec::new(),
        })?;
    let sheet_name = sheet.name.clone();
    let outcome = reconciler.reconcile(sheet, &lookups);
    warnings.extend(outcome.warnings);

    let output = if options.dry_run {
        log::info!("dry run: {} not written", target_path.display());
        None
    } else {
        let destination = output_path(&target_path, config.output_mode, chrono::Local::now().naive_local());
        if let Some(warning) = destination.warning {
            log::warn!("{warning}");
            warnings.push(warning);
        }
        store
            .save(&workbook, &destination.path)
            .map_err(|e| ReconError::Io(format!("{}: {e}", destination.path.display())))?;
        log::info!("wrote {}", destination.path.display());
        Some(destination.path.display().to_string())
    };

    let sources: Vec<SourceSummary> = indexes.iter().flatten().map(SourceIndex::summary).collect();

    Ok(RunReport {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        target: target_path.display().to_string(),
        sheet: sheet_name,
        output,
        rows_scanned: outcome.rows_scanned,
        rows_without_key: outcome.rows_without_key,
        rows_updated: outcome.rows_updated,
        updates: outcome.updates,
        skipped_cells: outcome.skipped_cells,
        sources,
        skipped_sources,
        warnings,
    })
}
