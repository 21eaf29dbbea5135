// A1-style cell addressing helpers.
//
// Rows and columns are 0-based everywhere in the model; these helpers are the
// only place where the 1-based, letter-column notation appears.

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Format a 0-based (row, col) pair as an A1 reference.
pub fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Parse a cell reference like "B5" into (row, col) = (4, 1).
///
/// Absolute markers (`$B$5`) are accepted and ignored.
pub fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let r = r.trim();
    let mut col: usize = 0;
    let mut row: usize = 0;
    let mut seen_col = false;
    let mut seen_row = false;

    for ch in r.chars() {
        match ch {
            '$' => {}
            'A'..='Z' | 'a'..='z' if !seen_row => {
                col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
                seen_col = true;
            }
            '0'..='9' if seen_col => {
                row = row * 10 + ch.to_digit(10)? as usize;
                seen_row = true;
            }
            _ => return None,
        }
    }

    if !seen_col || !seen_row || row == 0 {
        return None;
    }

    Some((row - 1, col - 1))
}

/// Parse a range reference like "A1:C3" into (start_row, start_col, end_row, end_col).
pub fn parse_range_ref(r: &str) -> Option<(usize, usize, usize, usize)> {
    let (start, end) = r.split_once(':')?;
    let (sr, sc) = parse_cell_ref(start)?;
    let (er, ec) = parse_cell_ref(end)?;
    Some((sr, sc, er, ec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn col_letters() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }

    #[test]
    fn cell_refs() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("B5"), Some((4, 1)));
        assert_eq!(parse_cell_ref("$AA$10"), Some((9, 26)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("5B"), None);
        assert_eq!(parse_cell_ref(""), None);
        assert_eq!(cell_address(2, 3), "D3");
    }

    #[test]
    fn range_refs() {
        assert_eq!(parse_range_ref("A1:C3"), Some((0, 0, 2, 2)));
        assert_eq!(parse_range_ref("A1"), None);
    }
}
