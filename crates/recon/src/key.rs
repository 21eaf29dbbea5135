use sheetsync_engine::sheet::Sheet;

/// Columns a row key is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub identifier: usize,
    /// Extra key column for composite keys.
    pub extra: Option<usize>,
}

/// The lookup key of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowKey {
    pub text: String,
    /// Built from an error literal or a formula without a cached result.
    pub degraded: bool,
}

impl RowKey {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl KeyColumns {
    /// Key of `row`. Empty whenever the identifier cell is empty, even if
    /// the extra key column holds text.
    pub fn key(&self, sheet: &Sheet, row: usize) -> RowKey {
        let identifier = sheet.value(row, self.identifier).normalize();
        if identifier.is_empty() {
            return RowKey { text: String::new(), degraded: identifier.degraded };
        }

        match self.extra {
            None => RowKey { text: identifier.text, degraded: identifier.degraded },
            Some(col) => {
                let extra = sheet.value(row, col).normalize();
                RowKey {
                    text: compose_key(Some(&extra.text), &identifier.text),
                    degraded: identifier.degraded || extra.degraded,
                }
            }
        }
    }
}

/// Extra key text followed by identifier text, no separator.
pub fn compose_key(extra: Option<&str>, identifier: &str) -> String {
    match extra {
        Some(extra) => format!("{extra}{identifier}"),
        None => identifier.to_string(),
    }
}
