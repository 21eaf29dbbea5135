//! XLSX style reader: resolves `styles.xml` into cell formats and pulls
//! per-cell style IDs, sheet layout and data validations out of the
//! worksheet XML.
//!
//! calamine reads values but not formatting, so this walks the ZIP parts
//! directly. Only the attributes `CellFormat` can carry are resolved.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Seek};
use std::path::Path;
use sheetsync_engine::address::{parse_cell_ref, parse_range_ref};
use sheetsync_engine::cell::{Alignment, BorderStyle, CellBorders, CellFormat};
use zip::ZipArchive;

use crate::xlsx_validation::{self, ParsedValidations};

// =============================================================================
// Public types
// =============================================================================

/// Parsed style table from styles.xml: maps cellXfs index → CellFormat.
#[derive(Debug, Default)]
pub struct StyleTable {
    pub styles: Vec<CellFormat>,
}

impl StyleTable {
    pub fn get(&self, id: usize) -> Option<&CellFormat> {
        self.styles.get(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Per-cell style references and layout extracted from one worksheet XML.
#[derive(Debug, Default)]
pub struct SheetFormatting {
    /// (row, col, style_id) triples, 0-based
    pub cell_styles: Vec<(usize, usize, usize)>,
    /// Column widths in raw Excel character-width units
    pub col_widths: HashMap<usize, f64>,
    /// Merged cell regions: (start_row, start_col, end_row, end_col)
    pub merged_regions: Vec<(usize, usize, usize, usize)>,
    /// Custom row heights in points
    pub row_heights: HashMap<usize, f64>,
    pub hidden_rows: BTreeSet<usize>,
    pub hidden_cols: BTreeSet<usize>,
    /// Frozen (rows, cols) from a frozen `<pane>`
    pub frozen: Option<(usize, usize)>,
    pub validations: ParsedValidations,
    /// Sheet features present in the file that export cannot write back
    pub unsupported: BTreeSet<&'static str>,
}

/// Worksheet elements that are read past and lost on save.
fn unsupported_feature(name: &[u8]) -> Option<&'static str> {
    Some(match name {
        b"conditionalFormatting" => "conditional formatting",
        b"autoFilter" => "autofilter",
        b"hyperlinks" => "hyperlinks",
        b"drawing" => "drawings and charts",
        b"legacyDrawing" => "cell comments",
        b"tableParts" => "tables",
        b"sheetProtection" => "sheet protection",
        b"x14:dataValidations" => "cross-sheet data validations",
        _ => return None,
    })
}

// =============================================================================
// Number formats and colors
// =============================================================================

/// Format code for a built-in numFmtId. `None` = General.
fn builtin_number_format(id: u16) -> Option<&'static str> {
    let code = match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Legacy indexed palette, primary entries only.
fn indexed_color(idx: u8) -> Option<[u8; 4]> {
    if idx >= 16 {
        return None;
    }
    let rgb: [u8; 3] = match idx % 8 {
        0 => [0, 0, 0],
        1 => [255, 255, 255],
        2 => [255, 0, 0],
        3 => [0, 255, 0],
        4 => [0, 0, 255],
        5 => [255, 255, 0],
        6 => [255, 0, 255],
        _ => [0, 255, 255],
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}

/// Default Office theme colors; tints are not applied.
fn theme_color(idx: u8) -> Option<[u8; 4]> {
    let rgb: [u8; 3] = match idx {
        0 => [0xFF, 0xFF, 0xFF],
        1 => [0x00, 0x00, 0x00],
        2 => [0xE7, 0xE6, 0xE6],
        3 => [0x44, 0x54, 0x6A],
        4 => [0x44, 0x72, 0xC4],
        5 => [0xED, 0x7D, 0x31],
        6 => [0xA5, 0xA5, 0xA5],
        7 => [0xFF, 0xC0, 0x00],
        8 => [0x5B, 0x9B, 0xD5],
        9 => [0x70, 0xAD, 0x47],
        _ => return None,
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}

/// Parse AARRGGBB or RRGGBB hex into RGBA.
pub fn parse_argb_hex(hex: &str) -> Option<[u8; 4]> {
    let s = hex.trim().trim_start_matches('#');
    let byte = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
    match s.len() {
        8 => Some([byte(2)?, byte(4)?, byte(6)?, byte(0)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        _ => None,
    }
}

/// Resolve a `<color>`/`<fgColor>` element: rgb > indexed > theme.
fn parse_color(e: &BytesStart) -> Option<[u8; 4]> {
    let mut rgb = None;
    let mut indexed = None;
    let mut theme = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"rgb" => rgb = Some(value),
            b"indexed" => indexed = value.parse::<u8>().ok(),
            b"theme" => theme = value.parse::<u8>().ok(),
            _ => {}
        }
    }
    if let Some(hex) = rgb {
        return parse_argb_hex(&hex);
    }
    if let Some(idx) = indexed {
        return indexed_color(idx);
    }
    theme.and_then(theme_color)
}

fn attr_str(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn attr_parse<T: std::str::FromStr>(e: &BytesStart, key: &[u8]) -> Option<T> {
    attr_str(e, key).and_then(|s| s.parse().ok())
}

fn attr_flag(e: &BytesStart, key: &[u8]) -> bool {
    matches!(attr_str(e, key).as_deref(), Some("1") | Some("true"))
}

/// Unescape the 5 predefined XML entities.
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// =============================================================================
// styles.xml parser
// =============================================================================

#[derive(Debug, Clone, Default)]
struct ParsedFont {
    bold: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    size: Option<f32>,
    color: Option<[u8; 4]>,
    family: Option<String>,
}

#[derive(Debug, Default)]
struct XfEntry {
    num_fmt_id: Option<u16>,
    font_id: Option<usize>,
    fill_id: Option<usize>,
    border_id: Option<usize>,
    h_align: Option<String>,
    wrap_text: bool,
}

/// Parse styles.xml content into a StyleTable.
pub fn parse_styles_xml(xml: &str) -> StyleTable {
    let num_fmts = parse_num_fmts(xml);
    let fonts = parse_fonts(xml);
    let fills = parse_fills(xml);
    let borders = parse_borders(xml);

    let styles = parse_cell_xfs(xml)
        .iter()
        .map(|xf| resolve_xf(xf, &num_fmts, &fonts, &fills, &borders))
        .collect();

    StyleTable { styles }
}

/// `<numFmts>` → formatId → formatCode
fn parse_num_fmts(xml: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_num_fmts = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"numFmts" => in_num_fmts = true,
            Ok(Event::End(ref e)) if e.name().as_ref() == b"numFmts" => break,
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_num_fmts && e.name().as_ref() == b"numFmt" =>
            {
                let id = attr_parse::<u16>(e, b"numFmtId");
                let code = attr_str(e, b"formatCode").map(|c| unescape_xml(&c));
                if let (Some(id), Some(code)) = (id, code) {
                    map.insert(id, code);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    map
}

fn parse_fonts(xml: &str) -> Vec<ParsedFont> {
    let mut fonts = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    // 0 = outside, 1 = inside <fonts>, 2 = inside <font>
    let mut depth = 0;
    let mut current = ParsedFont::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fonts" if depth == 0 => depth = 1,
                b"font" if depth == 1 => {
                    depth = 2;
                    current = ParsedFont::default();
                }
                b"color" if depth == 2 => current.color = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth == 2 => match e.name().as_ref() {
                b"b" => current.bold = attr_str(e, b"val").map_or(true, |v| v != "0"),
                b"i" => current.italic = attr_str(e, b"val").map_or(true, |v| v != "0"),
                b"u" => current.underline = attr_str(e, b"val").map_or(true, |v| v != "none"),
                b"strike" => current.strikethrough = attr_str(e, b"val").map_or(true, |v| v != "0"),
                b"sz" => current.size = attr_parse(e, b"val"),
                b"color" => current.color = parse_color(e),
                b"name" => current.family = attr_str(e, b"val"),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"font" if depth == 2 => {
                    fonts.push(std::mem::take(&mut current));
                    depth = 1;
                }
                b"fonts" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fonts
}

/// `<fills>` → solid foreground color per fill (None for pattern "none").
fn parse_fills(xml: &str) -> Vec<Option<[u8; 4]>> {
    let mut fills = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0;
    let mut in_pattern = false;
    let mut current: Option<[u8; 4]> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fills" if depth == 0 => depth = 1,
                b"fill" if depth == 1 => {
                    depth = 2;
                    current = None;
                }
                b"patternFill" if depth == 2 => in_pattern = true,
                b"fgColor" if in_pattern => current = parse_color(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if in_pattern && e.name().as_ref() == b"fgColor" {
                    current = parse_color(e);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"patternFill" => in_pattern = false,
                b"fill" if depth == 2 => {
                    fills.push(current.take());
                    depth = 1;
                    in_pattern = false;
                }
                b"fills" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fills
}

fn parse_border_style(s: &str) -> BorderStyle {
    match s {
        "thin" | "hair" => BorderStyle::Thin,
        "medium" | "mediumDashDot" | "mediumDashDotDot" => BorderStyle::Medium,
        "thick" => BorderStyle::Thick,
        "dashed" | "dashDot" | "dashDotDot" | "mediumDashed" | "slantDashDot" => BorderStyle::Dashed,
        "dotted" => BorderStyle::Dotted,
        "double" => BorderStyle::Double,
        _ => BorderStyle::None,
    }
}

fn set_side(current: &mut CellBorders, e: &BytesStart) {
    let style = attr_str(e, b"style")
        .map(|s| parse_border_style(&s))
        .unwrap_or_default();
    match e.name().as_ref() {
        b"top" => current.top = style,
        b"right" | b"end" => current.right = style,
        b"bottom" => current.bottom = style,
        b"left" | b"start" => current.left = style,
        _ => {}
    }
}

fn parse_borders(xml: &str) -> Vec<CellBorders> {
    let mut borders = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0;
    let mut current = CellBorders::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"borders" if depth == 0 => depth = 1,
                b"border" if depth == 1 => {
                    depth = 2;
                    current = CellBorders::default();
                }
                _ if depth == 2 => set_side(&mut current, e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"border" if depth == 1 => borders.push(CellBorders::default()),
                _ if depth == 2 => set_side(&mut current, e),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"border" if depth == 2 => {
                    borders.push(current);
                    depth = 1;
                }
                b"borders" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    borders
}

fn read_xf_attrs(e: &BytesStart) -> XfEntry {
    XfEntry {
        num_fmt_id: attr_parse(e, b"numFmtId"),
        font_id: attr_parse(e, b"fontId"),
        fill_id: attr_parse(e, b"fillId"),
        border_id: attr_parse(e, b"borderId"),
        ..Default::default()
    }
}

fn read_alignment(xf: &mut XfEntry, e: &BytesStart) {
    xf.h_align = attr_str(e, b"horizontal");
    xf.wrap_text = attr_flag(e, b"wrapText");
}

/// `<cellXfs>` entries in index order.
fn parse_cell_xfs(xml: &str) -> Vec<XfEntry> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;
    let mut current: Option<XfEntry> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => current = Some(read_xf_attrs(e)),
                b"alignment" => {
                    if let Some(xf) = current.as_mut() {
                        read_alignment(xf, e);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"xf" if in_cell_xfs => entries.push(read_xf_attrs(e)),
                b"alignment" => {
                    if let Some(xf) = current.as_mut() {
                        read_alignment(xf, e);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"xf" => {
                    if let Some(xf) = current.take() {
                        entries.push(xf);
                    }
                }
                b"cellXfs" => break,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

fn resolve_xf(
    xf: &XfEntry,
    num_fmts: &HashMap<u16, String>,
    fonts: &[ParsedFont],
    fills: &[Option<[u8; 4]>],
    borders: &[CellBorders],
) -> CellFormat {
    let mut format = CellFormat::default();

    if let Some(font) = xf.font_id.and_then(|id| fonts.get(id)) {
        format.bold = font.bold;
        format.italic = font.italic;
        format.underline = font.underline;
        format.strikethrough = font.strikethrough;
        format.font_size = font.size;
        format.font_color = font.color;
        format.font_family = font.family.clone();
    }

    if let Some(fill) = xf.fill_id.and_then(|id| fills.get(id)) {
        format.background_color = *fill;
    }

    if let Some(border) = xf.border_id.and_then(|id| borders.get(id)) {
        format.borders = *border;
    }

    if let Some(id) = xf.num_fmt_id {
        format.number_format = num_fmts
            .get(&id)
            .cloned()
            .or_else(|| builtin_number_format(id).map(str::to_string));
    }

    format.alignment = match xf.h_align.as_deref() {
        Some("left") => Alignment::Left,
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        Some("centerContinuous") => Alignment::CenterAcrossSelection,
        _ => Alignment::General,
    };
    format.wrap = xf.wrap_text;

    format
}

// =============================================================================
// Worksheet XML parser
// =============================================================================

/// Parse a worksheet XML for per-cell style IDs, layout and validations.
pub fn parse_sheet_formatting(xml: &str) -> SheetFormatting {
    let mut formatting = SheetFormatting::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"c" => {
                    let style_id = attr_parse::<usize>(e, b"s").unwrap_or(0);
                    // style 0 is the workbook default
                    if style_id > 0 {
                        if let Some((row, col)) = attr_str(e, b"r").and_then(|r| parse_cell_ref(&r)) {
                            formatting.cell_styles.push((row, col, style_id));
                        }
                    }
                }
                b"row" => {
                    if let Some(row) = attr_parse::<usize>(e, b"r").filter(|r| *r > 0).map(|r| r - 1) {
                        if attr_flag(e, b"customHeight") {
                            if let Some(height) = attr_parse::<f64>(e, b"ht") {
                                formatting.row_heights.insert(row, height);
                            }
                        }
                        if attr_flag(e, b"hidden") {
                            formatting.hidden_rows.insert(row);
                        }
                    }
                }
                b"col" => {
                    let min = attr_parse::<usize>(e, b"min");
                    let max = attr_parse::<usize>(e, b"max");
                    let width = attr_parse::<f64>(e, b"width");
                    let hidden = attr_flag(e, b"hidden");
                    if let (Some(min), Some(max)) = (min, max) {
                        // A <col> spanning to XFD styles the whole sheet; cap it.
                        for col in min.max(1)..=max.min(min + 255) {
                            if hidden {
                                formatting.hidden_cols.insert(col - 1);
                            }
                            match width {
                                Some(w) if w > 0.0 && attr_flag(e, b"customWidth") => {
                                    formatting.col_widths.insert(col - 1, w);
                                }
                                _ => {}
                            }
                        }
                    }
                }
                b"pane" => {
                    let state = attr_str(e, b"state").unwrap_or_default();
                    if state == "frozen" || state == "frozenSplit" {
                        let split = |key: &[u8]| attr_parse::<f64>(e, key).unwrap_or(0.0).max(0.0) as usize;
                        formatting.frozen = Some((split(b"ySplit"), split(b"xSplit")));
                    } else {
                        formatting.unsupported.insert("split panes");
                    }
                }
                b"mergeCell" => {
                    if let Some(region) = attr_str(e, b"ref").and_then(|r| parse_range_ref(&r)) {
                        formatting.merged_regions.push(region);
                    }
                }
                name => {
                    if let Some(feature) = unsupported_feature(name) {
                        formatting.unsupported.insert(feature);
                    }
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    formatting.validations = xlsx_validation::parse_validations(xml);
    formatting
}

// =============================================================================
// Top-level entry point
// =============================================================================

/// Parse all formatting data from an XLSX file.
///
/// Returns the style table and one `SheetFormatting` per entry of
/// `sheet_names`, in the same order. Parts that are missing from the archive
/// yield empty formatting rather than an error.
pub fn parse_xlsx_formatting(
    path: &Path,
    sheet_names: &[String],
) -> Result<(StyleTable, Vec<SheetFormatting>), String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open XLSX file for styles: {}", e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| format!("Failed to read XLSX as ZIP for styles: {}", e))?;

    let style_table = read_zip_file(&mut archive, "xl/styles.xml")
        .map(|xml| parse_styles_xml(&xml))
        .unwrap_or_default();

    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml").unwrap_or_default();
    let rels_xml = read_zip_file(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let worksheet_paths = resolve_worksheet_paths(&workbook_xml, &rels_xml, sheet_names);

    let sheet_formats = worksheet_paths
        .iter()
        .map(|ws_path| {
            read_zip_file(&mut archive, ws_path)
                .map(|xml| parse_sheet_formatting(&xml))
                .unwrap_or_default()
        })
        .collect();

    Ok((style_table, sheet_formats))
}

fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String, String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| format!("File '{}' not found in XLSX: {}", path, e))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(content)
}

/// Map sheet names to their worksheet part paths via workbook.xml + rels.
///
/// Unknown names map to an empty path, which later reads as "no formatting".
fn resolve_worksheet_paths(workbook_xml: &str, rels_xml: &str, sheet_names: &[String]) -> Vec<String> {
    let mut name_to_rid: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                if let (Some(name), Some(rid)) = (attr_str(e, b"name"), attr_str(e, b"r:id")) {
                    name_to_rid.insert(unescape_xml(&name), rid);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr_str(e, b"Id"), attr_str(e, b"Target")) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet_names
        .iter()
        .map(|name| {
            name_to_rid
                .get(name)
                .and_then(|rid| rid_to_target.get(rid))
                .map(|target| match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                })
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.00"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="12"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"/><right style="thin"/><top style="double"/><bottom style="medium"/></border>
  </borders>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" applyFont="1"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0">
      <alignment horizontal="center" wrapText="1"/>
    </xf>
    <xf numFmtId="2" fontId="0" fillId="0" borderId="0"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn argb_hex() {
        assert_eq!(parse_argb_hex("FF0000FF"), Some([0, 0, 255, 255]));
        assert_eq!(parse_argb_hex("FF0000"), Some([255, 0, 0, 255]));
        assert_eq!(parse_argb_hex("80FF0000"), Some([255, 0, 0, 128]));
        assert_eq!(parse_argb_hex("#FFFFFF00"), Some([255, 255, 0, 255]));
        assert_eq!(parse_argb_hex("xyz"), None);
    }

    #[test]
    fn styles_resolve_fonts_fills_borders() {
        let table = parse_styles_xml(STYLES_XML);
        assert_eq!(table.len(), 4);

        let styled = table.get(1).unwrap();
        assert!(styled.bold);
        assert_eq!(styled.font_size, Some(12.0));
        assert_eq!(styled.font_color, Some([255, 0, 0, 255]));
        assert_eq!(styled.font_family.as_deref(), Some("Arial"));
        assert_eq!(styled.background_color, Some([255, 255, 0, 255]));
        assert_eq!(styled.number_format.as_deref(), Some("\"$\"#,##0.00"));
        assert_eq!(styled.borders.left, BorderStyle::Thin);
        assert_eq!(styled.borders.top, BorderStyle::Double);
        assert_eq!(styled.borders.bottom, BorderStyle::Medium);
    }

    #[test]
    fn styles_builtin_formats_and_alignment() {
        let table = parse_styles_xml(STYLES_XML);
        assert_eq!(table.get(0).unwrap().number_format, None);

        let date = table.get(2).unwrap();
        assert_eq!(date.number_format.as_deref(), Some("mm-dd-yy"));
        assert_eq!(date.alignment, Alignment::Center);
        assert!(date.wrap);
        assert_eq!(date.background_color, None);

        assert_eq!(table.get(3).unwrap().number_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn sheet_formatting_collects_styles_widths_merges() {
        let xml = r#"<worksheet>
  <cols><col min="2" max="3" width="18.5" customWidth="1"/><col min="5" max="5" width="9"/></cols>
  <sheetData>
    <row r="1"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1"><v>2</v></c></row>
    <row r="3"><c r="C3" s="2"/></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A5:B6"/></mergeCells>
</worksheet>"#;
        let sf = parse_sheet_formatting(xml);
        assert_eq!(sf.cell_styles, vec![(0, 0, 1), (2, 2, 2)]);
        assert_eq!(sf.col_widths.get(&1), Some(&18.5));
        assert_eq!(sf.col_widths.get(&2), Some(&18.5));
        assert!(sf.col_widths.get(&4).is_none());
        assert_eq!(sf.merged_regions, vec![(4, 0, 5, 1)]);
        assert!(sf.unsupported.is_empty());
    }

    #[test]
    fn sheet_formatting_collects_layout() {
        let xml = r#"<worksheet>
  <sheetViews><sheetView workbookViewId="0">
    <pane xSplit="1" ySplit="2" topLeftCell="B3" activePane="bottomRight" state="frozen"/>
  </sheetView></sheetViews>
  <cols><col min="4" max="4" width="0" hidden="1" customWidth="1"/></cols>
  <sheetData>
    <row r="2" ht="30" customHeight="1"><c r="A2"><v>1</v></c></row>
    <row r="5" hidden="1"><c r="A5"><v>2</v></c></row>
    <row r="6" ht="15"/>
  </sheetData>
  <dataValidations count="1">
    <dataValidation type="list" allowBlank="1" sqref="B3:B9"><formula1>"Open,Done"</formula1></dataValidation>
  </dataValidations>
  <conditionalFormatting sqref="A1:A9"><cfRule type="expression" priority="1"><formula>A1&gt;1</formula></cfRule></conditionalFormatting>
  <hyperlinks><hyperlink ref="A1" r:id="rId1"/></hyperlinks>
</worksheet>"#;
        let sf = parse_sheet_formatting(xml);
        assert_eq!(sf.frozen, Some((2, 1)));
        assert_eq!(sf.row_heights.get(&1), Some(&30.0));
        assert!(sf.row_heights.get(&5).is_none());
        assert_eq!(sf.hidden_rows.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(sf.hidden_cols.iter().copied().collect::<Vec<_>>(), vec![3]);
        assert!(sf.col_widths.get(&3).is_none());
        assert_eq!(sf.validations.rules.len(), 1);
        assert_eq!(
            sf.unsupported.iter().copied().collect::<Vec<_>>(),
            vec!["conditional formatting", "hyperlinks"]
        );
    }

    #[test]
    fn split_pane_is_unsupported() {
        let xml = r#"<worksheet><sheetViews><sheetView>
  <pane xSplit="2000" ySplit="600" topLeftCell="C4"/>
</sheetView></sheetViews></worksheet>"#;
        let sf = parse_sheet_formatting(xml);
        assert_eq!(sf.frozen, None);
        assert!(sf.unsupported.contains("split panes"));
    }

    #[test]
    fn non_calibri_base_font_resolves_on_style_zero() {
        let xml = r#"<styleSheet>
  <fonts count="1"><font><sz val="11"/><color theme="1"/><name val="MS PGothic"/></font></fonts>
  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
  <borders count="1"><border/></borders>
  <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellXfs>
</styleSheet>"#;
        let table = parse_styles_xml(xml);
        let base = table.get(0).unwrap();
        assert_eq!(base.font_family.as_deref(), Some("MS PGothic"));
        assert_eq!(base.font_size, Some(11.0));
    }

    #[test]
    fn worksheet_paths_follow_relationships() {
        let workbook_xml = r#"<workbook><sheets>
  <sheet name="Data" sheetId="1" r:id="rId1"/>
  <sheet name="R&amp;D" sheetId="2" r:id="rId2"/>
</sheets></workbook>"#;
        let rels_xml = r#"<Relationships>
  <Relationship Id="rId1" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Target="/xl/worksheets/sheet2.xml"/>
</Relationships>"#;
        let names = vec!["R&D".to_string(), "Data".to_string(), "Missing".to_string()];
        let paths = resolve_worksheet_paths(workbook_xml, rels_xml, &names);
        assert_eq!(paths, vec!["xl/worksheets/sheet2.xml", "xl/worksheets/sheet1.xml", ""]);
    }
}
