use serde::Serialize;

// ---------------------------------------------------------------------------
// Per-cell results
// ---------------------------------------------------------------------------

/// One value copied into the target sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellUpdate {
    /// 1-based sheet row.
    pub row: usize,
    /// A1 address of the updated cell.
    pub cell: String,
    pub key: String,
    pub old_value: String,
    pub new_value: String,
    pub source: String,
}

/// A differing source value that was not written, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCell {
    /// 1-based sheet row.
    pub row: usize,
    /// A1 address of the update cell.
    pub cell: String,
    pub key: String,
    pub source: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Per-source results
// ---------------------------------------------------------------------------

/// Index statistics for a source that was used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub entries: usize,
    pub rows_scanned: usize,
    pub rows_filtered: usize,
    pub rows_without_key: usize,
}

/// A source that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub target: String,
    pub sheet: String,
    /// Where the workbook was written; `None` on a dry run.
    pub output: Option<String>,
    pub rows_scanned: usize,
    pub rows_without_key: usize,
    /// Distinct target rows that received at least one update.
    pub rows_updated: usize,
    pub updates: Vec<CellUpdate>,
    pub skipped_cells: Vec<SkippedCell>,
    pub sources: Vec<SourceSummary>,
    pub skipped_sources: Vec<SkippedSource>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn update_count(&self) -> usize {
        self.updates.len()
    }
}
