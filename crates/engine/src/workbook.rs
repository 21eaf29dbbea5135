use serde::{Deserialize, Serialize};

use crate::cell::CellFormat;
use crate::sheet::Sheet;

/// A workbook containing multiple sheets, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet: usize,
    /// Workbook base style (style 0), when it differs from the writer's
    /// Calibri 11 default.
    #[serde(default)]
    default_format: Option<CellFormat>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>, active: usize) -> Self {
        let active_sheet = if active < sheets.len() { active } else { 0 };
        Self { sheets, active_sheet, default_format: None }
    }

    pub fn default_format(&self) -> Option<&CellFormat> {
        self.default_format.as_ref()
    }

    pub fn set_default_format(&mut self, format: Option<CellFormat>) {
        self.default_format = format;
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// The first worksheet, whatever its name.
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Exact (case-sensitive) name lookup.
    pub fn sheet_index_by_name(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index_by_name(name).and_then(|i| self.sheets.get(i))
    }
}
