// Excel file import (xlsx, xlsm, xlsb, xls, ods) and export (xlsx only)
//
// Import keeps typed values, formula sources with their cached results, the
// formatting that CellFormat can carry, sheet layout and data validations.
// Export writes that model back so a workbook survives a read/modify/write
// cycle with its look intact. Sheet features the model cannot carry are
// reported as import warnings.

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Formula, Workbook as XlsxWorkbook,
    Worksheet, XlsxError,
};
use sheetsync_engine::address::cell_address;
use sheetsync_engine::cell::{Alignment, BorderStyle, Cell, CellFormat, CellValue};
use sheetsync_engine::sheet::Sheet;
use sheetsync_engine::workbook::Workbook;

use crate::xlsx_styles::{self, SheetFormatting, StyleTable};
use crate::xlsx_validation;

/// Number format given to date cells that carry none of their own.
const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd";
const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Result of an Excel import operation
#[derive(Debug, Default)]
pub struct ImportResult {
    pub sheets_imported: usize,
    /// Cells holding a value (formatting-only cells are not counted)
    pub cells_imported: usize,
    pub formulas_imported: usize,
    /// Formulas whose result was never cached by the application that saved the file
    pub formulas_without_cached: usize,
    pub dates_imported: usize,
    /// Cells that received a non-default format from the style table
    pub styles_imported: usize,
    pub unique_styles: usize,
    pub merges_imported: usize,
    pub validations_imported: usize,
    /// Actionable warnings (not boilerplate)
    pub warnings: Vec<String>,
    pub import_duration_ms: u128,
}

impl ImportResult {
    /// One-line summary, e.g. "2 sheets · 140 cells · 3 formulas"
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} sheet{}", self.sheets_imported, if self.sheets_imported == 1 { "" } else { "s" }),
            format!("{} cells", self.cells_imported),
        ];
        if self.formulas_imported > 0 {
            parts.push(format!("{} formulas", self.formulas_imported));
        }
        parts.join(" · ")
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Result of an Excel export operation
#[derive(Debug, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub formulas_exported: usize,
    pub merges_exported: usize,
    pub validations_exported: usize,
    /// Rules rust_xlsxwriter refused (Excel length limits, bad ranges)
    pub validations_skipped: usize,
    pub hidden_rows_exported: usize,
    /// Error literals written as text (xlsx has no way to store a bare error)
    pub errors_as_text: usize,
    pub warnings: Vec<String>,
    pub export_duration_ms: u128,
}

impl ExportResult {
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} sheet{}", self.sheets_exported, if self.sheets_exported == 1 { "" } else { "s" }),
            format!("{} cells", self.cells_exported),
        ];
        if self.formulas_exported > 0 {
            parts.push(format!("{} formulas", self.formulas_exported));
        }
        parts.join(", ")
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// =============================================================================
// Import
// =============================================================================

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| candidates.iter().any(|c| e.eq_ignore_ascii_case(c)))
        .unwrap_or(false)
}

/// Import an Excel file (xlsx, xlsm, xlsb, xls, ods).
///
/// Formatting is read for the zip-based OOXML containers only. ODS formulas
/// use a different dialect and are kept as their cached values.
pub fn import(path: &Path) -> Result<(Workbook, ImportResult), String> {
    let start_time = Instant::now();

    let mut source = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = source.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut result = ImportResult::default();

    let (style_table, sheet_formats) = if has_extension(path, &["xlsx", "xlsm"]) {
        match xlsx_styles::parse_xlsx_formatting(path, &sheet_names) {
            Ok(parsed) => parsed,
            Err(e) => {
                result.warnings.push(format!("Formatting not imported: {}", e));
                (StyleTable::default(), Vec::new())
            }
        }
    } else {
        (StyleTable::default(), Vec::new())
    };
    let keep_formulas = !has_extension(path, &["ods"]);
    let base_format = style_table.get(0).filter(|f| !is_writer_default(f)).cloned();
    if let Some(base) = &base_format {
        log::debug!("workbook base style: {:?}", base);
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for (sheet_idx, name) in sheet_names.iter().enumerate() {
        let range = source
            .worksheet_range(name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", name, e))?;

        let mut sheet = Sheet::new(name);
        import_values(&range, &mut sheet, &mut result);

        if keep_formulas {
            match source.worksheet_formula(name) {
                Ok(formulas) => import_formulas(&formulas, &mut sheet, &mut result),
                Err(e) => result
                    .warnings
                    .push(format!("Formulas in '{}' imported as values: {}", name, e)),
            }
        }

        if let Some(formatting) = sheet_formats.get(sheet_idx) {
            apply_formatting(&mut sheet, formatting, &style_table, &mut result);
        }

        log::debug!("imported sheet '{}' ({} cells)", name, sheet.cell_count());
        sheets.push(sheet);
        result.sheets_imported += 1;
    }

    result.unique_styles = style_table.len();
    result.import_duration_ms = start_time.elapsed().as_millis();
    let mut workbook = Workbook::from_sheets(sheets, 0);
    workbook.set_default_format(base_format);
    Ok((workbook, result))
}

/// True when `format` is what rust_xlsxwriter writes for an unstyled cell
/// (Calibri 11, black).
fn is_writer_default(format: &CellFormat) -> bool {
    let mut format = format.clone();
    if format.font_family.as_deref() == Some("Calibri") {
        format.font_family = None;
    }
    if format.font_size == Some(11.0) {
        format.font_size = None;
    }
    if format.font_color == Some([0, 0, 0, 255]) {
        format.font_color = None;
    }
    format.is_default()
}

/// Map a calamine cell to a typed value.
fn convert_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

fn import_values(range: &Range<Data>, sheet: &mut Sheet, result: &mut ImportResult) {
    // used_cells() positions are relative to the range start
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    for (r, c, data) in range.used_cells() {
        let value = convert_data(data);
        if value == CellValue::Empty {
            continue;
        }
        if matches!(value, CellValue::Date(_)) {
            result.dates_imported += 1;
        }
        sheet.set_value(start_row as usize + r, start_col as usize + c, value);
        result.cells_imported += 1;
    }
}

/// Wrap imported values in their formula, keeping the value as cached result.
fn import_formulas(formulas: &Range<String>, sheet: &mut Sheet, result: &mut ImportResult) {
    let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
    for (r, c, source) in formulas.used_cells() {
        if source.is_empty() {
            continue;
        }
        let (row, col) = (start_row as usize + r, start_col as usize + c);
        let cached = match sheet.value(row, col) {
            CellValue::Empty => {
                result.formulas_without_cached += 1;
                result.cells_imported += 1;
                None
            }
            value => Some(Box::new(value.clone())),
        };
        let source = source.strip_prefix('=').unwrap_or(source).to_string();
        sheet.set_value(row, col, CellValue::Formula { source, cached });
        result.formulas_imported += 1;
    }
}

fn apply_formatting(
    sheet: &mut Sheet,
    formatting: &SheetFormatting,
    style_table: &StyleTable,
    result: &mut ImportResult,
) {
    for &(row, col, style_id) in &formatting.cell_styles {
        match style_table.get(style_id) {
            Some(format) if !format.is_default() => {
                sheet.set_format(row, col, format.clone());
                result.styles_imported += 1;
            }
            Some(_) => {}
            None => log::warn!(
                "sheet '{}' cell {} references unknown style {}",
                sheet.name,
                cell_address(row, col),
                style_id
            ),
        }
    }

    sheet.col_widths = formatting.col_widths.clone();
    sheet.row_heights = formatting.row_heights.clone();
    sheet.hidden_rows = formatting.hidden_rows.clone();
    sheet.hidden_cols = formatting.hidden_cols.clone();
    sheet.frozen = formatting.frozen.unwrap_or((0, 0));

    sheet.validations = formatting.validations.rules.clone();
    result.validations_imported += sheet.validations.len();
    if formatting.validations.skipped > 0 {
        result.warnings.push(format!(
            "Sheet '{}': {} data validation(s) not understood, they will not be kept on save",
            sheet.name, formatting.validations.skipped
        ));
    }
    for feature in &formatting.unsupported {
        result.warnings.push(format!(
            "Sheet '{}': {} will not be kept when the workbook is saved",
            sheet.name, feature
        ));
    }

    for &(sr, sc, er, ec) in &formatting.merged_regions {
        if er < sr || ec < sc {
            result.warnings.push(format!(
                "Sheet '{}': ignored malformed merge {}:{}",
                sheet.name,
                cell_address(sr, sc),
                cell_address(er, ec)
            ));
            continue;
        }
        sheet.add_merged_region((sr, sc), (er, ec));
        result.merges_imported += 1;
    }
}

// =============================================================================
// Export
// =============================================================================

/// Export a workbook to an .xlsx file.
///
/// Every sheet is written in order with its cells, formats, layout, merged
/// regions and data validations. Formulas are written with their cached
/// result so that readers which do not recalculate still see a value.
///
/// rust_xlsxwriter always writes Calibri 11 as the base style, so a workbook
/// base style is layered under every written cell instead.
pub fn export(workbook: &Workbook, path: &Path) -> Result<ExportResult, String> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();

    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;

        apply_layout(worksheet, sheet, &mut result)?;

        // merge_range() writes blanks across the region; the origin cell is
        // overwritten with its real value below.
        let merge_format = Format::new();
        for merge in &sheet.merged_regions {
            worksheet
                .merge_range(
                    merge.start.0 as u32,
                    merge.start.1 as u16,
                    merge.end.0 as u32,
                    merge.end.1 as u16,
                    "",
                    &merge_format,
                )
                .map_err(|e| format!("Failed to write merge: {}", e))?;
            result.merges_exported += 1;
        }

        let mut cells: Vec<(&(usize, usize), &Cell)> = sheet.cells_iter().collect();
        cells.sort_by_key(|(pos, _)| **pos);
        for ((row, col), cell) in cells {
            if sheet.is_merge_hidden(*row, *col) {
                continue;
            }
            write_cell(worksheet, *row, *col, cell, workbook.default_format(), &mut result)?;
        }

        write_validations(worksheet, sheet, &mut result);

        result.sheets_exported += 1;
    }

    if let Ok(ws) = xlsx_workbook.worksheet_from_index(workbook.active_sheet_index()) {
        let _ = ws.set_active(true);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok(result)
}

/// Column widths, hidden columns, row heights, hidden rows and frozen panes.
fn apply_layout(worksheet: &mut Worksheet, sheet: &Sheet, result: &mut ExportResult) -> Result<(), String> {
    let mut widths: Vec<(&usize, &f64)> = sheet.col_widths.iter().collect();
    widths.sort_by_key(|(col, _)| **col);
    for (col, width) in widths {
        worksheet
            .set_column_width(*col as u16, *width)
            .map_err(|e| format!("Failed to set width of column {}: {}", col, e))?;
    }
    for col in &sheet.hidden_cols {
        worksheet
            .set_column_hidden(*col as u16)
            .map_err(|e| format!("Failed to hide column {}: {}", col, e))?;
    }

    let mut heights: Vec<(&usize, &f64)> = sheet.row_heights.iter().collect();
    heights.sort_by_key(|(row, _)| **row);
    for (row, height) in heights {
        worksheet
            .set_row_height(*row as u32, *height)
            .map_err(|e| format!("Failed to set height of row {}: {}", row + 1, e))?;
    }
    for row in &sheet.hidden_rows {
        worksheet
            .set_row_hidden(*row as u32)
            .map_err(|e| format!("Failed to hide row {}: {}", row + 1, e))?;
        result.hidden_rows_exported += 1;
    }

    let (rows, cols) = sheet.frozen;
    if rows > 0 || cols > 0 {
        worksheet
            .set_freeze_panes(rows as u32, cols as u16)
            .map_err(|e| format!("Failed to freeze panes: {}", e))?;
    }
    Ok(())
}

/// A rule Excel would reject is dropped with a warning; the rest of the sheet
/// is still written.
fn write_validations(worksheet: &mut Worksheet, sheet: &Sheet, result: &mut ExportResult) {
    for validation in &sheet.validations {
        let (sr, sc) = validation.start;
        let (er, ec) = validation.end;
        let written = xlsx_validation::rule_to_xlsx(&validation.rule).and_then(|dv| {
            worksheet
                .add_data_validation(sr as u32, sc as u16, er as u32, ec as u16, &dv)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
        match written {
            Ok(()) => result.validations_exported += 1,
            Err(reason) => {
                result.validations_skipped += 1;
                result.warnings.push(format!(
                    "Sheet '{}': data validation on {}:{} not written: {}",
                    sheet.name,
                    cell_address(sr, sc),
                    cell_address(er, ec),
                    reason
                ));
            }
        }
    }
}

fn cell_error(row: usize, col: usize, e: XlsxError) -> String {
    format!("Failed to write cell {}: {}", cell_address(row, col), e)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: usize,
    col: usize,
    cell: &Cell,
    base: Option<&CellFormat>,
    result: &mut ExportResult,
) -> Result<(), String> {
    let (row32, col16) = (row as u32, col as u16);
    let format = match base {
        Some(base) => build_excel_format(&layer_over(&cell.format, base), &cell.value),
        None => build_excel_format(&cell.format, &cell.value),
    };

    match &cell.value {
        CellValue::Empty => {
            if cell.format.is_default() {
                return Ok(());
            }
            worksheet
                .write_blank(row32, col16, &format)
                .map_err(|e| cell_error(row, col, e))?;
        }
        CellValue::Text(s) => {
            worksheet
                .write_string_with_format(row32, col16, s, &format)
                .map_err(|e| cell_error(row, col, e))?;
        }
        CellValue::Number(n) | CellValue::Date(n) => {
            worksheet
                .write_number_with_format(row32, col16, *n, &format)
                .map_err(|e| cell_error(row, col, e))?;
        }
        CellValue::Boolean(b) => {
            worksheet
                .write_boolean_with_format(row32, col16, *b, &format)
                .map_err(|e| cell_error(row, col, e))?;
        }
        CellValue::Error(e) => {
            worksheet
                .write_string_with_format(row32, col16, e, &format)
                .map_err(|err| cell_error(row, col, err))?;
            result.errors_as_text += 1;
        }
        CellValue::Formula { source, cached } => {
            let mut formula = Formula::new(source.strip_prefix('=').unwrap_or(source));
            if let Some(value) = cached {
                formula = formula.set_result(value.text());
            }
            worksheet
                .write_formula_with_format(row32, col16, formula, &format)
                .map_err(|e| cell_error(row, col, e))?;
            result.formulas_exported += 1;
        }
    }

    result.cells_exported += 1;
    Ok(())
}

/// Fill the font attributes `format` leaves unset from the workbook base style.
fn layer_over(format: &CellFormat, base: &CellFormat) -> CellFormat {
    let mut layered = format.clone();
    if layered.font_family.is_none() {
        layered.font_family = base.font_family.clone();
    }
    if layered.font_size.is_none() {
        layered.font_size = base.font_size;
    }
    if layered.font_color.is_none() {
        layered.font_color = base.font_color;
    }
    layered
}

fn to_xlsx_color([r, g, b, _]: [u8; 4]) -> Color {
    Color::RGB(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
}

fn border_style_to_xlsx(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Double => FormatBorder::Double,
    }
}

/// Build the rust_xlsxwriter format for a cell.
///
/// Dates without a number format of their own get a default date format,
/// otherwise Excel would show the raw serial.
fn build_excel_format(cell_format: &CellFormat, value: &CellValue) -> Format {
    let mut format = Format::new();

    if cell_format.bold {
        format = format.set_bold();
    }
    if cell_format.italic {
        format = format.set_italic();
    }
    if cell_format.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if cell_format.strikethrough {
        format = format.set_font_strikethrough();
    }
    if let Some(size) = cell_format.font_size {
        format = format.set_font_size(size as f64);
    }
    if let Some(color) = cell_format.font_color {
        format = format.set_font_color(to_xlsx_color(color));
    }
    if let Some(ref family) = cell_format.font_family {
        format = format.set_font_name(family);
    }

    format = match cell_format.alignment {
        Alignment::General => format,
        Alignment::Left => format.set_align(FormatAlign::Left),
        Alignment::Center => format.set_align(FormatAlign::Center),
        Alignment::Right => format.set_align(FormatAlign::Right),
        Alignment::CenterAcrossSelection => format.set_align(FormatAlign::CenterAcross),
    };
    if cell_format.wrap {
        format = format.set_text_wrap();
    }

    if let Some(color) = cell_format.background_color {
        format = format.set_background_color(to_xlsx_color(color));
    }

    let borders = &cell_format.borders;
    if borders.top != BorderStyle::None {
        format = format.set_border_top(border_style_to_xlsx(borders.top));
    }
    if borders.right != BorderStyle::None {
        format = format.set_border_right(border_style_to_xlsx(borders.right));
    }
    if borders.bottom != BorderStyle::None {
        format = format.set_border_bottom(border_style_to_xlsx(borders.bottom));
    }
    if borders.left != BorderStyle::None {
        format = format.set_border_left(border_style_to_xlsx(borders.left));
    }

    let number_format = cell_format.number_format.as_deref().or(match value.resolved() {
        CellValue::Date(serial) if serial.fract() != 0.0 => Some(DEFAULT_DATETIME_FORMAT),
        CellValue::Date(_) => Some(DEFAULT_DATE_FORMAT),
        _ => None,
    });
    if let Some(code) = number_format {
        format = format.set_num_format(code);
    }

    format
}
