use sheetsync_engine::address::cell_address;
use sheetsync_engine::sheet::Sheet;

use crate::config::{KeyMode, MatchPolicy, SourceSpec, SyncConfig};
use crate::criteria::row_matches;
use crate::error::ReconError;
use crate::header::HeaderIndex;
use crate::index::SourceIndex;
use crate::key::KeyColumns;
use crate::model::{CellUpdate, SkippedCell};

/// Target-side columns, resolved once from the target header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColumns {
    pub key: KeyColumns,
    pub update: usize,
    /// Column receiving the source name when provenance is enabled.
    pub provenance: Option<usize>,
}

impl TargetColumns {
    /// Resolve the configured target columns.
    ///
    /// A missing identifier or update column is fatal. So is a missing
    /// extra key column: builder and reconciler must build keys the same way.
    pub fn resolve(config: &SyncConfig, headers: &HeaderIndex) -> Result<Self, ReconError> {
        let require = |setting: &'static str, column: &str| {
            headers.get(column).ok_or_else(|| ReconError::MissingTargetColumn {
                setting,
                column: column.to_string(),
            })
        };

        let identifier = require("targetIdentifierColumnName", &config.target_identifier_column_name)?;
        log::info!(
            "target identifier column '{}' -> column {}",
            config.target_identifier_column_name,
            identifier + 1
        );
        let update = require("targetColumnName", &config.target_column_name)?;
        log::info!("target update column '{}' -> column {}", config.target_column_name, update + 1);

        let extra = match config.key_mode() {
            KeyMode::Single => None,
            KeyMode::Composite { extra_column } => {
                let col = require("extraKeyColumnName", extra_column)?;
                log::info!("target extra key column '{}' -> column {}", extra_column, col + 1);
                Some(col)
            }
        };

        let provenance = config
            .provenance
            .enabled
            .then(|| update + config.provenance.offset);

        Ok(Self {
            key: KeyColumns { identifier, extra },
            update,
            provenance,
        })
    }
}

/// A configured source with its lookup table; `None` when the source was skipped.
pub type SourceLookup<'a> = (&'a SourceSpec, Option<&'a SourceIndex>);

/// Counters and updates from one pass over the target sheet.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub rows_scanned: usize,
    pub rows_without_key: usize,
    pub rows_updated: usize,
    pub updates: Vec<CellUpdate>,
    /// Differing values the workbook could not hold.
    pub skipped_cells: Vec<SkippedCell>,
    pub warnings: Vec<String>,
}

/// What one source did to one target row.
enum Applied {
    Unchanged,
    Updated(CellUpdate),
    /// The update cell cannot be written; no later source can write it either.
    Blocked(SkippedCell),
}

pub struct Reconciler<'a> {
    config: &'a SyncConfig,
    headers: &'a HeaderIndex,
    columns: TargetColumns,
    highlight: Option<[u8; 4]>,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a SyncConfig, headers: &'a HeaderIndex) -> Result<Self, ReconError> {
        let columns = TargetColumns::resolve(config, headers)?;
        Ok(Self {
            config,
            headers,
            columns,
            highlight: config.highlight_rgba(),
        })
    }

    pub fn columns(&self) -> TargetColumns {
        self.columns
    }

    /// Walk the data rows of `sheet`, applying sources in configuration order.
    pub fn reconcile(&self, sheet: &mut Sheet, sources: &[SourceLookup<'_>]) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let first_row = self.config.first_data_row();
        let last_row = match sheet.last_row() {
            Some(row) if row >= first_row => row,
            _ => {
                log::info!("sheet '{}' has no data rows", sheet.name);
                return outcome;
            }
        };

        for row in first_row..=last_row {
            outcome.rows_scanned += 1;

            let key = self.columns.key.key(sheet, row);
            if key.is_empty() {
                log::info!("skip row {}: empty identifier", row + 1);
                outcome.rows_without_key += 1;
                continue;
            }
            if key.degraded {
                log::warn!(
                    "row {}: identifier {} is degraded ({:?}), using '{}'",
                    row + 1,
                    cell_address(row, self.columns.key.identifier),
                    sheet.value(row, self.columns.key.identifier),
                    key.text
                );
            }

            let before = outcome.updates.len();
            for (spec, index) in sources {
                let Some(index) = index else {
                    continue;
                };
                if self.config.criteria_scope.includes_target()
                    && !row_matches(sheet, self.headers, row, &spec.criteria)
                {
                    log::trace!("row {}: criteria of '{}' not met", row + 1, spec.file_name);
                    continue;
                }

                match self.apply(sheet, row, &key.text, spec, index, &mut outcome.warnings) {
                    Applied::Unchanged => {}
                    Applied::Updated(update) => {
                        outcome.updates.push(update);
                        if self.config.match_policy == MatchPolicy::FirstMatch {
                            break;
                        }
                    }
                    Applied::Blocked(skipped) => {
                        outcome.skipped_cells.push(skipped);
                        break;
                    }
                }
            }
            if outcome.updates.len() > before {
                outcome.rows_updated += 1;
            }
        }

        outcome
    }

    /// Copy the source value into the update cell when it differs.
    ///
    /// A cell hidden under a merged region is never written: the saved
    /// workbook keeps only the merge origin, so the value would be lost.
    fn apply(
        &self,
        sheet: &mut Sheet,
        row: usize,
        key: &str,
        spec: &SourceSpec,
        index: &SourceIndex,
        warnings: &mut Vec<String>,
    ) -> Applied {
        let Some(offered) = index.lookup(key).map(|value| value.resolved()) else {
            return Applied::Unchanged;
        };
        let new_text = offered.normalize();
        if new_text.is_empty() {
            return Applied::Unchanged;
        }

        let col = self.columns.update;
        if sheet.value(row, col).loosely_eq(offered) {
            return Applied::Unchanged;
        }
        if let Some(merge) = sheet.hiding_merge(row, col) {
            let reason = format!("cell is covered by merged range {}", merge.range_ref());
            log::warn!(
                "row {} {}: '{}' from {} not written, {}",
                row + 1,
                cell_address(row, col),
                new_text.text,
                spec.file_name,
                reason
            );
            return Applied::Blocked(SkippedCell {
                row: row + 1,
                cell: cell_address(row, col),
                key: key.to_string(),
                source: spec.file_name.clone(),
                reason,
            });
        }

        let old_text = sheet.value(row, col).text();
        let new_value = offered.clone();
        let numeric = new_value.is_numeric();
        sheet.set_value(row, col, new_value);

        if numeric {
            if let Some(code) = self.config.number_format.as_deref() {
                sheet.set_number_format(row, col, code);
            }
        }
        if let Some(provenance_col) = self.columns.provenance {
            match sheet.hiding_merge(row, provenance_col) {
                Some(merge) => {
                    let warning = format!(
                        "provenance for row {} not written: {} is covered by merged range {}",
                        row + 1,
                        cell_address(row, provenance_col),
                        merge.range_ref()
                    );
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
                None => sheet.set_value(row, provenance_col, spec.file_name.as_str()),
            }
        }
        if let Some(color) = self.highlight {
            let filled = sheet.format(row, col).with_fill(color);
            sheet.set_format(row, col, filled);
        }

        log::info!(
            "updated row {} {}={} {}: '{}' -> '{}' (source: {})",
            row + 1,
            self.config.target_identifier_column_name,
            key,
            self.config.target_column_name,
            old_text,
            new_text.text,
            spec.file_name
        );

        Applied::Updated(CellUpdate {
            row: row + 1,
            cell: cell_address(row, col),
            key: key.to_string(),
            old_value: old_text,
            new_value: new_text.text,
            source: spec.file_name.clone(),
        })
    }
}
