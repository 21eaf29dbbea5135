use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    CenterAcrossSelection,
}

/// Border line style for one side of a cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellBorders {
    pub top: BorderStyle,
    pub right: BorderStyle,
    pub bottom: BorderStyle,
    pub left: BorderStyle,
}

/// Cell formatting carried through a read/modify/write cycle.
///
/// Colors are RGBA. `number_format` holds the raw format code
/// (e.g. `"0.00"`, `"yyyy-mm-dd"`); `None` means General.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_size: Option<f32>,
    pub font_color: Option<[u8; 4]>,
    pub font_family: Option<String>,
    pub background_color: Option<[u8; 4]>,
    pub number_format: Option<String>,
    pub alignment: Alignment,
    pub wrap: bool,
    pub borders: CellBorders,
}

impl CellFormat {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Copy of this format with a solid background fill.
    pub fn with_fill(&self, color: [u8; 4]) -> Self {
        Self {
            background_color: Some(color),
            ..self.clone()
        }
    }
}

/// A typed cell value.
///
/// `Date` holds an Excel serial (1900 date system). `Formula` keeps the
/// formula source together with the result cached in the file, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(f64),
    Error(String),
    Formula {
        source: String,
        cached: Option<Box<CellValue>>,
    },
}

/// Canonical text form of a value.
///
/// `degraded` is set when the text does not faithfully represent a value:
/// an error literal, or a formula whose result was never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellText {
    pub text: String,
    pub degraded: bool,
}

impl CellText {
    fn clean(text: String) -> Self {
        Self { text, degraded: false }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl CellValue {
    /// Normalize to the canonical comparable/textual form.
    ///
    /// Formulas are represented by their cached result, never by their source.
    pub fn normalize(&self) -> CellText {
        match self {
            CellValue::Empty => CellText::default(),
            CellValue::Text(s) => CellText::clean(s.clone()),
            CellValue::Number(n) => CellText::clean(format_number(*n)),
            CellValue::Boolean(b) => CellText::clean(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Date(serial) => CellText::clean(format_date_serial(*serial)),
            CellValue::Error(e) => CellText { text: e.clone(), degraded: true },
            CellValue::Formula { cached: Some(result), .. } => result.normalize(),
            CellValue::Formula { cached: None, .. } => CellText { text: String::new(), degraded: true },
        }
    }

    /// Shorthand for `normalize().text`.
    pub fn text(&self) -> String {
        self.normalize().text
    }

    /// Loose equality: two values are equal when their canonical texts match.
    ///
    /// `Number(1.0)` equals `Text("1")`; a formula equals its cached result.
    pub fn loosely_eq(&self, other: &CellValue) -> bool {
        self.normalize().text == other.normalize().text
    }

    /// The value a formula resolves to, or the value itself.
    pub fn resolved(&self) -> &CellValue {
        match self {
            CellValue::Formula { cached: Some(result), .. } => result.resolved(),
            other => other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.resolved(), CellValue::Number(_))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Integers print without decimals; everything else uses the shortest
/// round-trip representation.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Convert an Excel serial (1900 date system) to a date-time.
///
/// Serials below 60 predate Excel's phantom 1900-02-29 and use a base one
/// day later.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let days = serial.floor() as i64;
    let secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(secs))
}

/// `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` when the serial carries a time.
pub fn format_date_serial(serial: f64) -> String {
    match serial_to_datetime(serial) {
        Some(dt) if serial.fract().abs() > 1e-9 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => format_number(serial),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}
