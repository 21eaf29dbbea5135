use sheetsync_engine::sheet::Sheet;

use crate::config::Criterion;
use crate::header::HeaderIndex;

/// True when `row` satisfies every criterion.
///
/// A criterion holds when its column's trimmed text equals one of the
/// trimmed acceptable values (case-sensitive). A criterion whose header is
/// not in `headers` fails. An empty list always matches.
pub fn row_matches(sheet: &Sheet, headers: &HeaderIndex, row: usize, criteria: &[Criterion]) -> bool {
    criteria.iter().all(|criterion| criterion_holds(sheet, headers, row, criterion))
}

fn criterion_holds(sheet: &Sheet, headers: &HeaderIndex, row: usize, criterion: &Criterion) -> bool {
    let Some(col) = headers.get(&criterion.header_name) else {
        return false;
    };
    let text = sheet.text(row, col);
    let text = text.trim();
    criterion.target_values.iter().any(|accepted| accepted.trim() == text)
}

/// Criteria headers that `headers` cannot resolve.
pub fn missing_headers<'a>(headers: &HeaderIndex, criteria: &'a [Criterion]) -> Vec<&'a str> {
    criteria
        .iter()
        .filter(|c| headers.get(&c.header_name).is_none())
        .map(|c| c.header_name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(header: &str, values: &[&str]) -> Criterion {
        Criterion {
            header_name: header.to_string(),
            target_values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn sheet() -> (Sheet, HeaderIndex) {
        let mut sheet = Sheet::new("Data");
        sheet.set_value(1, 0, "ID");
        sheet.set_value(1, 1, "Type");
        sheet.set_value(1, 2, "Qty");
        sheet.set_value(2, 0, "001");
        sheet.set_value(2, 1, " A ");
        sheet.set_value(2, 2, 3.0);
        let headers = HeaderIndex::build(&sheet, 1);
        (sheet, headers)
    }

    #[test]
    fn empty_criteria_match() {
        let (sheet, headers) = sheet();
        assert!(row_matches(&sheet, &headers, 2, &[]));
    }

    #[test]
    fn values_compare_trimmed_and_case_sensitive() {
        let (sheet, headers) = sheet();
        assert!(row_matches(&sheet, &headers, 2, &[criterion("Type", &["A", "B"])]));
        assert!(row_matches(&sheet, &headers, 2, &[criterion("Type", &[" A"])]));
        assert!(!row_matches(&sheet, &headers, 2, &[criterion("Type", &["a"])]));
    }

    #[test]
    fn numbers_compare_by_canonical_text() {
        let (sheet, headers) = sheet();
        assert!(row_matches(&sheet, &headers, 2, &[criterion("Qty", &["3"])]));
        assert!(!row_matches(&sheet, &headers, 2, &[criterion("Qty", &["3.0"])]));
    }

    #[test]
    fn all_criteria_must_hold() {
        let (sheet, headers) = sheet();
        let both = [criterion("Type", &["A"]), criterion("Qty", &["3"])];
        assert!(row_matches(&sheet, &headers, 2, &both));
        let one_fails = [criterion("Type", &["A"]), criterion("Qty", &["4"])];
        assert!(!row_matches(&sheet, &headers, 2, &one_fails));
    }

    #[test]
    fn unknown_header_fails() {
        let (sheet, headers) = sheet();
        let criteria = [criterion("Region", &["EU"])];
        assert!(!row_matches(&sheet, &headers, 2, &criteria));
        assert_eq!(missing_headers(&headers, &criteria), vec!["Region"]);
    }

    #[test]
    fn empty_cell_matches_empty_value() {
        let (sheet, headers) = sheet();
        assert!(row_matches(&sheet, &headers, 5, &[criterion("Type", &[""])]));
        assert!(!row_matches(&sheet, &headers, 5, &[criterion("Type", &[])]));
    }
}
