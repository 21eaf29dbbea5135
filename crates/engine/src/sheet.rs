use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::address::cell_address;
use crate::cell::{Cell, CellFormat, CellValue};
use crate::validation::SheetValidation;

static EMPTY: CellValue = CellValue::Empty;

/// A merged cell region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRegion {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl MergedRegion {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start.0 && row <= self.end.0 && col >= self.start.1 && col <= self.end.1
    }

    /// A1 range text, e.g. `B3:B4`.
    pub fn range_ref(&self) -> String {
        format!(
            "{}:{}",
            cell_address(self.start.0, self.start.1),
            cell_address(self.end.0, self.end.1)
        )
    }
}

/// A sparse grid of cells. Rows and columns are 0-based.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
    /// Column widths in Excel character units, for columns that set one.
    pub col_widths: HashMap<usize, f64>,
    pub merged_regions: Vec<MergedRegion>,
    /// Row heights in points, for rows with a custom height.
    pub row_heights: HashMap<usize, f64>,
    pub hidden_rows: BTreeSet<usize>,
    pub hidden_cols: BTreeSet<usize>,
    /// Frozen pane split as (rows, columns); (0, 0) when nothing is frozen.
    pub frozen: (usize, usize),
    pub validations: Vec<SheetValidation>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Value at (row, col); `Empty` for cells that were never set.
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Canonical text at (row, col).
    pub fn text(&self, row: usize, col: usize) -> String {
        self.value(row, col).text()
    }

    pub fn format(&self, row: usize, col: usize) -> CellFormat {
        self.cells
            .get(&(row, col))
            .map(|c| c.format.clone())
            .unwrap_or_default()
    }

    /// Replace the value, keeping whatever format the cell already has.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        self.cells.entry((row, col)).or_default().value = value.into();
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        self.cells.entry((row, col)).or_default().format = format;
    }

    /// Set the number format code of a single cell, keeping its other attributes.
    pub fn set_number_format(&mut self, row: usize, col: usize, code: &str) {
        self.cells.entry((row, col)).or_default().format.number_format = Some(code.to_string());
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &Cell)> {
        self.cells.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Index of the last row holding a non-empty value.
    ///
    /// Cells that only carry formatting do not count as populated.
    pub fn last_row(&self) -> Option<usize> {
        self.cells
            .iter()
            .filter(|(_, c)| c.value != CellValue::Empty)
            .map(|((r, _), _)| *r)
            .max()
    }

    /// Index of the last column holding a non-empty value in `row`.
    pub fn last_col_in_row(&self, row: usize) -> Option<usize> {
        self.cells
            .iter()
            .filter(|((r, _), c)| *r == row && c.value != CellValue::Empty)
            .map(|((_, c), _)| *c)
            .max()
    }

    /// Values of `row` from column 0 through its last populated column.
    pub fn row_values(&self, row: usize) -> Vec<CellValue> {
        match self.last_col_in_row(row) {
            Some(last) => (0..=last).map(|col| self.value(row, col).clone()).collect(),
            None => Vec::new(),
        }
    }

    pub fn add_merged_region(&mut self, start: (usize, usize), end: (usize, usize)) {
        self.merged_regions.push(MergedRegion { start, end });
    }

    /// The merged region hiding (row, col), if the cell is covered by a
    /// merge but is not its top-left origin.
    pub fn hiding_merge(&self, row: usize, col: usize) -> Option<&MergedRegion> {
        self.merged_regions
            .iter()
            .find(|m| m.contains(row, col) && (row, col) != m.start)
    }

    pub fn is_merge_hidden(&self, row: usize, col: usize) -> bool {
        self.hiding_merge(row, col).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_cells_read_as_empty() {
        let sheet = Sheet::new("Data");
        assert_eq!(sheet.value(5, 5), &CellValue::Empty);
        assert_eq!(sheet.text(0, 0), "");
        assert!(sheet.last_row().is_none());
    }

    #[test]
    fn set_value_keeps_format() {
        let mut sheet = Sheet::new("Data");
        sheet.set_format(2, 1, CellFormat { bold: true, ..Default::default() });
        sheet.set_value(2, 1, "Done");
        assert_eq!(sheet.text(2, 1), "Done");
        assert!(sheet.format(2, 1).bold);
    }

    #[test]
    fn last_row_ignores_format_only_cells() {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(3, 0, "x");
        sheet.set_format(10, 0, CellFormat { italic: true, ..Default::default() });
        assert_eq!(sheet.last_row(), Some(3));
    }

    #[test]
    fn row_values_are_dense() {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(2, 0, "a");
        sheet.set_value(2, 3, 4.0);
        let row = sheet.row_values(2);
        assert_eq!(row.len(), 4);
        assert_eq!(row[1], CellValue::Empty);
        assert_eq!(row[3], CellValue::Number(4.0));
        assert!(sheet.row_values(7).is_empty());
    }

    #[test]
    fn merge_hidden_excludes_origin() {
        let mut sheet = Sheet::new("Data");
        sheet.add_merged_region((0, 0), (1, 2));
        assert!(!sheet.is_merge_hidden(0, 0));
        assert!(sheet.is_merge_hidden(0, 1));
        assert!(sheet.is_merge_hidden(1, 2));
        assert!(!sheet.is_merge_hidden(2, 0));
    }

    #[test]
    fn hiding_merge_names_the_range() {
        let mut sheet = Sheet::new("Data");
        sheet.add_merged_region((2, 1), (3, 1));
        assert_eq!(sheet.hiding_merge(3, 1).map(MergedRegion::range_ref).as_deref(), Some("B3:B4"));
        assert!(sheet.hiding_merge(2, 1).is_none());
    }
}
