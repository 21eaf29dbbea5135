use std::collections::HashMap;

use sheetsync_engine::sheet::Sheet;

/// Column name → 0-based column position, read from one header row.
///
/// Names are the trimmed canonical text of the header cells. Empty headers
/// are skipped; when a name repeats, the rightmost column wins.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn build(sheet: &Sheet, header_row: usize) -> Self {
        let mut columns = HashMap::new();
        let last_col = match sheet.last_col_in_row(header_row) {
            Some(col) => col,
            None => return Self { columns },
        };

        for col in 0..=last_col {
            let name = sheet.value(header_row, col).normalize();
            let name = name.text.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(previous) = columns.insert(name.to_string(), col) {
                log::debug!(
                    "sheet '{}': header '{}' repeats, column {} replaces column {}",
                    sheet.name,
                    name,
                    col + 1,
                    previous + 1
                );
            }
        }

        Self { columns }
    }

    /// Position of `name`; the lookup name is trimmed like the headers were.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.columns.get(name.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsync_engine::cell::CellValue;

    fn header_sheet() -> Sheet {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(0, 0, "Report title");
        sheet.set_value(1, 0, "ID");
        sheet.set_value(1, 1, " Status ");
        sheet.set_value(1, 3, 2024.0);
        sheet.set_value(1, 4, "ID");
        sheet
    }

    #[test]
    fn maps_trimmed_names_to_columns() {
        let index = HeaderIndex::build(&header_sheet(), 1);
        assert_eq!(index.get("Status"), Some(1));
        assert_eq!(index.get(" Status"), Some(1));
        assert_eq!(index.get("2024"), Some(3));
        assert_eq!(index.get("Report title"), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn rightmost_duplicate_wins() {
        let index = HeaderIndex::build(&header_sheet(), 1);
        assert_eq!(index.get("ID"), Some(4));
    }

    #[test]
    fn formula_headers_use_cached_text() {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(
            1,
            0,
            CellValue::Formula {
                source: "\"Qty\"".into(),
                cached: Some(Box::new(CellValue::Text("Qty".into()))),
            },
        );
        sheet.set_value(1, 1, CellValue::Formula { source: "X()".into(), cached: None });
        let index = HeaderIndex::build(&sheet, 1);
        assert_eq!(index.get("Qty"), Some(0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn missing_header_row_is_empty() {
        let index = HeaderIndex::build(&header_sheet(), 7);
        assert!(index.is_empty());
    }
}
