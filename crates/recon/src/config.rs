use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration, read once from JSON and passed by reference afterwards.
///
/// Every field has a default so a partial file is valid. Column settings are
/// header names, matched against the trimmed header row text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub target_file_name: String,
    pub target_sheet_name: String,
    /// Column receiving copied values. Read from the same header in sources.
    #[serde(alias = "targetUpdateColumnName")]
    pub target_column_name: String,
    pub target_identifier_column_name: String,
    /// When set, keys are `extra text + identifier text`.
    pub extra_key_column_name: Option<String>,
    /// ARGB (or RGB) hex; empty disables highlighting.
    pub highlight_color: String,
    /// 1-based header row; data starts on the next row.
    pub header_row: usize,
    pub lookup_mode: LookupMode,
    pub match_policy: MatchPolicy,
    pub criteria_scope: CriteriaScope,
    pub output_mode: OutputMode,
    /// Number format code applied to updated cells that receive a number.
    pub number_format: Option<String>,
    pub provenance: ProvenanceConfig,
    pub source_files: Vec<SourceSpec>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_file_name: "target.xlsx".to_string(),
            target_sheet_name: "Sheet1".to_string(),
            target_column_name: "A".to_string(),
            target_identifier_column_name: "B".to_string(),
            extra_key_column_name: None,
            highlight_color: DEFAULT_HIGHLIGHT.to_string(),
            header_row: 2,
            lookup_mode: LookupMode::default(),
            match_policy: MatchPolicy::default(),
            criteria_scope: CriteriaScope::default(),
            output_mode: OutputMode::default(),
            number_format: None,
            provenance: ProvenanceConfig::default(),
            source_files: Vec::new(),
        }
    }
}

/// Solid yellow.
pub const DEFAULT_HIGHLIGHT: &str = "FFFFFF00";

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    pub file_name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

/// Equality filter: the named column must hold one of `target_values`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub header_name: String,
    #[serde(default)]
    pub target_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvenanceConfig {
    pub enabled: bool,
    /// Provenance column = update column + offset.
    pub offset: usize,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self { enabled: false, offset: 3 }
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// How a key is built from a row. Derived from `extraKeyColumnName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode<'a> {
    /// Identifier text alone.
    Single,
    /// Text of `extra_column` followed by the identifier text.
    Composite { extra_column: &'a str },
}

/// What a source index stores per key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupMode {
    /// The update column's value only.
    #[default]
    Value,
    /// A snapshot of the whole source row.
    Row,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchPolicy {
    /// Every source is applied in order; the last differing value stays.
    #[default]
    AllSources,
    /// Stop at the first source that changes the row.
    FirstMatch,
}

/// Which rows the per-source criteria are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaScope {
    #[default]
    Both,
    Target,
    Source,
}

impl CriteriaScope {
    pub fn includes_target(self) -> bool {
        matches!(self, Self::Both | Self::Target)
    }

    pub fn includes_source(self) -> bool {
        matches!(self, Self::Both | Self::Source)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    #[default]
    Overwrite,
    /// `<stem>YYYYMMDDHHMMSS.<ext>` next to the target.
    Timestamped,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Timestamped => write!(f, "timestamped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        let mut config: SyncConfig =
            serde_json::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// An empty or blank extra key column means "no composite key".
    fn normalize(&mut self) {
        if self
            .extra_key_column_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.extra_key_column_name = None;
        }
        if self.number_format.as_deref().is_some_and(str::is_empty) {
            self.number_format = None;
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.header_row == 0 {
            return Err(ReconError::ConfigValidation(
                "headerRow is 1-based and must be at least 1".to_string(),
            ));
        }

        if !self.highlight_color.is_empty() && parse_argb(&self.highlight_color).is_none() {
            return Err(ReconError::ConfigValidation(format!(
                "highlightColor '{}' is not a 6 or 8 digit hex color",
                self.highlight_color
            )));
        }

        if self.provenance.offset == 0 {
            return Err(ReconError::ConfigValidation(
                "provenance.offset must be at least 1".to_string(),
            ));
        }

        for (i, source) in self.source_files.iter().enumerate() {
            if source.file_name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "sourceFiles[{i}]: fileName is empty"
                )));
            }
            for (j, criterion) in source.criteria.iter().enumerate() {
                if criterion.header_name.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "sourceFiles[{i}].criteria[{j}]: headerName is empty"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn key_mode(&self) -> KeyMode<'_> {
        match self.extra_key_column_name.as_deref() {
            Some(extra_column) => KeyMode::Composite { extra_column },
            None => KeyMode::Single,
        }
    }

    /// 0-based index of the header row.
    pub fn header_row_index(&self) -> usize {
        self.header_row.saturating_sub(1)
    }

    /// 0-based index of the first data row.
    pub fn first_data_row(&self) -> usize {
        self.header_row
    }

    /// Highlight fill as RGBA, `None` when highlighting is disabled.
    pub fn highlight_rgba(&self) -> Option<[u8; 4]> {
        parse_argb(&self.highlight_color)
    }
}

/// Parse `AARRGGBB` or `RRGGBB` hex (optional leading `#`) into RGBA.
pub fn parse_argb(hex: &str) -> Option<[u8; 4]> {
    let s = hex.trim().trim_start_matches('#');
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        8 => Some([byte(2)?, byte(4)?, byte(6)?, byte(0)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 0xFF]),
        _ => None,
    }
}

/// Resolve a configured file name: absolute paths stay, relative ones are
/// taken relative to `base_dir` (the config file's directory).
pub fn resolve_path(base_dir: &Path, file_name: &str) -> PathBuf {
    let path = Path::new(file_name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
