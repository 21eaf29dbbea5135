use std::collections::HashMap;

use sheetsync_engine::cell::CellValue;
use sheetsync_engine::sheet::Sheet;

use crate::config::{KeyMode, LookupMode, SourceSpec, SyncConfig};
use crate::criteria::{missing_headers, row_matches};
use crate::header::HeaderIndex;
use crate::key::KeyColumns;
use crate::model::SourceSummary;

/// What a source holds for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEntry {
    /// The update column's value.
    Value(CellValue),
    /// A snapshot of the whole source row (0-based sheet row).
    Row { cells: Vec<CellValue>, row: usize },
}

static EMPTY: CellValue = CellValue::Empty;

impl SourceEntry {
    /// The value offered for the update column.
    pub fn value(&self, update_col: usize) -> &CellValue {
        match self {
            Self::Value(value) => value,
            Self::Row { cells, .. } => cells.get(update_col).unwrap_or(&EMPTY),
        }
    }
}

/// Read-only key → entry table for one source file.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    pub name: String,
    /// Update column in the source sheet.
    pub update_col: usize,
    entries: HashMap<String, SourceEntry>,
    pub rows_scanned: usize,
    pub rows_filtered: usize,
    pub rows_without_key: usize,
}

impl SourceIndex {
    pub fn get(&self, key: &str) -> Option<&SourceEntry> {
        self.entries.get(key)
    }

    /// The update value for `key`, if the key is indexed.
    pub fn lookup(&self, key: &str) -> Option<&CellValue> {
        self.entries.get(key).map(|entry| entry.value(self.update_col))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            name: self.name.clone(),
            entries: self.entries.len(),
            rows_scanned: self.rows_scanned,
            rows_filtered: self.rows_filtered,
            rows_without_key: self.rows_without_key,
        }
    }
}

/// Build the lookup table for `source` from its first worksheet.
///
/// Returns `Err(reason)` when a required column is missing from the header
/// row; the caller skips the source.
pub fn build_source_index(
    source: &SourceSpec,
    sheet: &Sheet,
    config: &SyncConfig,
) -> Result<SourceIndex, String> {
    let headers = HeaderIndex::build(sheet, config.header_row_index());

    let resolve = |setting: &str, column: &str| {
        headers.get(column).ok_or_else(|| {
            format!(
                "column '{}' ({}) not found in header row {} of sheet '{}'",
                column, setting, config.header_row, sheet.name
            )
        })
    };

    let identifier = resolve("targetIdentifierColumnName", &config.target_identifier_column_name)?;
    let update_col = resolve("targetColumnName", &config.target_column_name)?;
    let extra = match config.key_mode() {
        KeyMode::Single => None,
        KeyMode::Composite { extra_column } => Some(resolve("extraKeyColumnName", extra_column)?),
    };
    let key_columns = KeyColumns { identifier, extra };

    let filter_rows = config.criteria_scope.includes_source() && !source.criteria.is_empty();
    if filter_rows {
        let missing = missing_headers(&headers, &source.criteria);
        if !missing.is_empty() {
            log::warn!(
                "source '{}': criteria header(s) {} not in its header row; no row can match",
                source.file_name,
                missing.join(", ")
            );
        }
    }

    let mut index = SourceIndex {
        name: source.file_name.clone(),
        update_col,
        entries: HashMap::new(),
        rows_scanned: 0,
        rows_filtered: 0,
        rows_without_key: 0,
    };

    let last_row = match sheet.last_row() {
        Some(row) if row >= config.first_data_row() => row,
        _ => return Ok(index),
    };

    for row in config.first_data_row()..=last_row {
        index.rows_scanned += 1;

        if filter_rows && !row_matches(sheet, &headers, row, &source.criteria) {
            index.rows_filtered += 1;
            continue;
        }

        let key = key_columns.key(sheet, row);
        if key.is_empty() {
            log::debug!("source '{}': row {} has no identifier, skipped", source.file_name, row + 1);
            index.rows_without_key += 1;
            continue;
        }
        if key.degraded {
            log::warn!(
                "source '{}': row {} identifier is degraded, indexed as '{}'",
                source.file_name,
                row + 1,
                key.text
            );
        }

        let entry = match config.lookup_mode {
            LookupMode::Value => SourceEntry::Value(sheet.value(row, update_col).clone()),
            LookupMode::Row => SourceEntry::Row { cells: sheet.row_values(row), row },
        };
        // later rows win
        index.entries.insert(key.text, entry);
    }

    Ok(index)
}
