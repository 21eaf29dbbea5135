//! XLSX data validation import/export.
//!
//! Import reads `<dataValidation>` elements from worksheet XML; export hands
//! the same rules to rust_xlsxwriter. Constraint operands and list formulas
//! stay formula text both ways, so a rule comes back as it went out.
//!
//! Gotcha: `allowBlank="1"` is the engine's `ignore_blank`, and
//! `showDropDown="1"` HIDES the dropdown.

use std::collections::HashMap;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_xlsxwriter::{DataValidation, DataValidationErrorStyle, DataValidationRule, Formula};
use sheetsync_engine::address::{parse_cell_ref, parse_range_ref};
use sheetsync_engine::validation::{
    ComparisonOperator, Constraint, ErrorAlert, ErrorStyle, InputMessage, ListSource,
    SheetValidation, ValidationRule, ValidationType,
};

// =============================================================================
// Export
// =============================================================================

/// Convert a rule to its rust_xlsxwriter form.
///
/// Fails when the rule breaks an Excel limit (list text over 255 characters,
/// titles over 32 characters, messages over 255 characters).
pub fn rule_to_xlsx(rule: &ValidationRule) -> Result<DataValidation, String> {
    let dv = DataValidation::new();
    let mut dv = match &rule.rule_type {
        ValidationType::AnyValue => dv.allow_any_value(),
        ValidationType::WholeNumber(c) => dv.allow_whole_number_formula(constraint_to_xlsx(c)),
        ValidationType::Decimal(c) => dv.allow_decimal_number_formula(constraint_to_xlsx(c)),
        ValidationType::Date(c) => dv.allow_date_formula(constraint_to_xlsx(c)),
        ValidationType::Time(c) => dv.allow_time_formula(constraint_to_xlsx(c)),
        ValidationType::TextLength(c) => dv.allow_text_length_formula(constraint_to_xlsx(c)),
        ValidationType::List(ListSource::Inline(items)) => {
            dv.allow_list_strings(items).map_err(|e| e.to_string())?
        }
        ValidationType::List(ListSource::Formula(source)) => dv.allow_list_formula(formula(source)),
        ValidationType::Custom(source) => dv.allow_custom(formula(source)),
    };

    dv = dv
        .ignore_blank(rule.ignore_blank)
        .show_dropdown(rule.show_dropdown)
        .show_input_message(rule.input_message.show)
        .show_error_message(rule.error_alert.show)
        .set_error_style(match rule.error_alert.style {
            ErrorStyle::Stop => DataValidationErrorStyle::Stop,
            ErrorStyle::Warning => DataValidationErrorStyle::Warning,
            ErrorStyle::Information => DataValidationErrorStyle::Information,
        });

    let input = &rule.input_message;
    if !input.title.is_empty() {
        dv = dv.set_input_title(&input.title).map_err(|e| e.to_string())?;
    }
    if !input.message.is_empty() {
        dv = dv.set_input_message(&input.message).map_err(|e| e.to_string())?;
    }
    let alert = &rule.error_alert;
    if !alert.title.is_empty() {
        dv = dv.set_error_title(&alert.title).map_err(|e| e.to_string())?;
    }
    if !alert.message.is_empty() {
        dv = dv.set_error_message(&alert.message).map_err(|e| e.to_string())?;
    }

    Ok(dv)
}

fn formula(source: &str) -> Formula {
    Formula::new(source.strip_prefix('=').unwrap_or(source))
}

fn constraint_to_xlsx(constraint: &Constraint) -> DataValidationRule<Formula> {
    let v1 = formula(&constraint.value1);
    let v2 = || formula(constraint.value2.as_deref().unwrap_or(&constraint.value1));

    match constraint.operator {
        ComparisonOperator::Between => DataValidationRule::Between(v1, v2()),
        ComparisonOperator::NotBetween => DataValidationRule::NotBetween(v1, v2()),
        ComparisonOperator::EqualTo => DataValidationRule::EqualTo(v1),
        ComparisonOperator::NotEqualTo => DataValidationRule::NotEqualTo(v1),
        ComparisonOperator::GreaterThan => DataValidationRule::GreaterThan(v1),
        ComparisonOperator::LessThan => DataValidationRule::LessThan(v1),
        ComparisonOperator::GreaterThanOrEqual => DataValidationRule::GreaterThanOrEqualTo(v1),
        ComparisonOperator::LessThanOrEqual => DataValidationRule::LessThanOrEqualTo(v1),
    }
}

// =============================================================================
// Import
// =============================================================================

/// Rules read from one worksheet.
#[derive(Debug, Default)]
pub struct ParsedValidations {
    pub rules: Vec<SheetValidation>,
    /// `<dataValidation>` elements that could not be mapped
    pub skipped: usize,
}

/// Parse the `<dataValidations>` block of a worksheet XML.
///
/// A rule covering several ranges (`sqref="A1:A5 C1:C5"`) yields one entry
/// per range.
pub fn parse_validations(xml: &str) -> ParsedValidations {
    let mut parsed = ParsedValidations::default();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut formulas: [Option<String>; 2] = [None, None];
    let mut in_formula: Option<usize> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"dataValidation" => {
                    current = Some(read_attrs(e, &reader));
                    formulas = [None, None];
                }
                b"formula1" if current.is_some() => in_formula = Some(0),
                b"formula2" if current.is_some() => in_formula = Some(1),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"dataValidation" => {
                collect(&read_attrs(e, &reader), &[None, None], &mut parsed);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(i) = in_formula {
                    let text = e.decode().unwrap_or_default();
                    formulas[i].get_or_insert_with(String::new).push_str(&text);
                }
            }
            // Entity references arrive as their own events.
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(i) = in_formula {
                    let resolved = match e.resolve_char_ref() {
                        Ok(Some(ch)) => Some(ch.to_string()),
                        _ => e
                            .decode()
                            .ok()
                            .and_then(|name| resolve_predefined_entity(&name).map(str::to_string)),
                    };
                    if let Some(text) = resolved {
                        formulas[i].get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"formula1" | b"formula2" => in_formula = None,
                b"dataValidation" => {
                    if let Some(attrs) = current.take() {
                        collect(&attrs, &formulas, &mut parsed);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    parsed
}

fn read_attrs(e: &BytesStart, reader: &Reader<&[u8]>) -> HashMap<String, String> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            (key, value)
        })
        .collect()
}

fn collect(attrs: &HashMap<String, String>, formulas: &[Option<String>; 2], parsed: &mut ParsedValidations) {
    let ranges: Vec<(usize, usize, usize, usize)> = attrs
        .get("sqref")
        .map(|sqref| sqref.split_whitespace().filter_map(parse_sqref_part).collect())
        .unwrap_or_default();

    match parse_rule(attrs, formulas[0].as_deref(), formulas[1].as_deref()) {
        Some(rule) if !ranges.is_empty() => {
            for (sr, sc, er, ec) in ranges {
                parsed.rules.push(SheetValidation {
                    start: (sr, sc),
                    end: (er, ec),
                    rule: rule.clone(),
                });
            }
        }
        _ => {
            log::debug!("data validation not mapped: {:?}", attrs);
            parsed.skipped += 1;
        }
    }
}

/// "A1" or "A1:B10".
fn parse_sqref_part(part: &str) -> Option<(usize, usize, usize, usize)> {
    if part.contains(':') {
        return parse_range_ref(part);
    }
    let (row, col) = parse_cell_ref(part)?;
    Some((row, col, row, col))
}

fn parse_rule(
    attrs: &HashMap<String, String>,
    formula1: Option<&str>,
    formula2: Option<&str>,
) -> Option<ValidationRule> {
    let attr = |key: &str| attrs.get(key).map(String::as_str);
    let flag = |key: &str| attr(key) == Some("1");

    let rule_type = match attr("type").unwrap_or("none") {
        "none" => ValidationType::AnyValue,
        "list" => ValidationType::List(parse_list_source(formula1?)?),
        "custom" => ValidationType::Custom(formula1?.to_string()),
        "whole" => ValidationType::WholeNumber(parse_constraint(attr("operator"), formula1, formula2)?),
        "decimal" => ValidationType::Decimal(parse_constraint(attr("operator"), formula1, formula2)?),
        "date" => ValidationType::Date(parse_constraint(attr("operator"), formula1, formula2)?),
        "time" => ValidationType::Time(parse_constraint(attr("operator"), formula1, formula2)?),
        "textLength" => ValidationType::TextLength(parse_constraint(attr("operator"), formula1, formula2)?),
        _ => return None,
    };

    let mut rule = ValidationRule::new(rule_type);
    rule.ignore_blank = flag("allowBlank");
    rule.show_dropdown = !flag("showDropDown");
    rule.input_message = InputMessage {
        show: flag("showInputMessage"),
        title: attr("promptTitle").unwrap_or_default().to_string(),
        message: attr("prompt").unwrap_or_default().to_string(),
    };
    rule.error_alert = ErrorAlert {
        show: flag("showErrorMessage"),
        style: match attr("errorStyle") {
            Some("warning") => ErrorStyle::Warning,
            Some("information") => ErrorStyle::Information,
            _ => ErrorStyle::Stop,
        },
        title: attr("errorTitle").unwrap_or_default().to_string(),
        message: attr("error").unwrap_or_default().to_string(),
    };
    Some(rule)
}

/// `"Open,Done"` is an inline list; anything else is a range or a name.
fn parse_list_source(formula1: &str) -> Option<ListSource> {
    let formula1 = formula1.trim();
    if formula1.is_empty() {
        return None;
    }

    match formula1.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => Some(ListSource::Inline(
            inner.split(',').map(|item| item.replace("\"\"", "\"")).collect(),
        )),
        None => Some(ListSource::Formula(formula1.to_string())),
    }
}

fn parse_constraint(operator: Option<&str>, formula1: Option<&str>, formula2: Option<&str>) -> Option<Constraint> {
    let operator = parse_operator(operator)?;
    let value1 = formula1?.trim().to_string();
    let value2 = if operator.takes_two_values() {
        Some(formula2?.trim().to_string())
    } else {
        None
    };
    Some(Constraint { operator, value1, value2 })
}

/// A missing operator means `between`.
fn parse_operator(op: Option<&str>) -> Option<ComparisonOperator> {
    Some(match op.unwrap_or("between") {
        "between" => ComparisonOperator::Between,
        "notBetween" => ComparisonOperator::NotBetween,
        "equal" => ComparisonOperator::EqualTo,
        "notEqual" => ComparisonOperator::NotEqualTo,
        "greaterThan" => ComparisonOperator::GreaterThan,
        "lessThan" => ComparisonOperator::LessThan,
        "greaterThanOrEqual" => ComparisonOperator::GreaterThanOrEqual,
        "lessThanOrEqual" => ComparisonOperator::LessThanOrEqual,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET_XML: &str = r#"<worksheet>
  <sheetData/>
  <dataValidations count="4">
    <dataValidation type="list" allowBlank="1" showInputMessage="1" showErrorMessage="1" errorTitle="Status" error="Pick one" sqref="B3:B20">
      <formula1>"Open,Done,R&amp;D"</formula1>
    </dataValidation>
    <dataValidation type="whole" operator="between" showErrorMessage="1" errorStyle="warning" sqref="C3:C20 E3">
      <formula1>1</formula1>
      <formula2>$H$1</formula2>
    </dataValidation>
    <dataValidation type="list" showDropDown="1" sqref="D3"><formula1>$H$2:$H$4</formula1></dataValidation>
    <dataValidation type="whole" operator="sideways" sqref="F1"><formula1>1</formula1></dataValidation>
  </dataValidations>
</worksheet>"#;

    #[test]
    fn parses_list_and_whole_number_rules() {
        let parsed = parse_validations(SHEET_XML);
        assert_eq!(parsed.rules.len(), 4);
        assert_eq!(parsed.skipped, 1);

        let status = &parsed.rules[0];
        assert_eq!((status.start, status.end), ((2, 1), (19, 1)));
        assert_eq!(
            status.rule.rule_type,
            ValidationType::List(ListSource::Inline(vec!["Open".into(), "Done".into(), "R&D".into()]))
        );
        assert!(status.rule.ignore_blank);
        assert!(status.rule.show_dropdown);
        assert!(status.rule.input_message.show);
        assert_eq!(status.rule.error_alert.title, "Status");
        assert_eq!(status.rule.error_alert.message, "Pick one");

        let qty = &parsed.rules[1];
        assert_eq!(
            qty.rule.rule_type,
            ValidationType::WholeNumber(Constraint {
                operator: ComparisonOperator::Between,
                value1: "1".into(),
                value2: Some("$H$1".into()),
            })
        );
        assert!(!qty.rule.ignore_blank);
        assert_eq!(qty.rule.error_alert.style, ErrorStyle::Warning);
        assert_eq!((parsed.rules[2].start, parsed.rules[2].end), ((2, 4), (2, 4)));

        let lookup = &parsed.rules[3];
        assert_eq!(lookup.rule.rule_type, ValidationType::List(ListSource::Formula("$H$2:$H$4".into())));
        assert!(!lookup.rule.show_dropdown);
    }

    #[test]
    fn attribute_entities_are_unescaped() {
        let xml = r#"<dataValidations><dataValidation type="custom" promptTitle="Q&amp;A" prompt="x &lt; 5" sqref="A1"><formula1>LEN(A1)&lt;5</formula1></dataValidation></dataValidations>"#;
        let parsed = parse_validations(xml);
        let rule = &parsed.rules[0].rule;
        assert_eq!(rule.rule_type, ValidationType::Custom("LEN(A1)<5".into()));
        assert_eq!(rule.input_message.title, "Q&A");
        assert_eq!(rule.input_message.message, "x < 5");
    }

    #[test]
    fn inline_list_unquotes_doubled_quotes() {
        assert_eq!(
            parse_list_source(r#""say ""hi"",bye""#),
            Some(ListSource::Inline(vec!["say \"hi\"".into(), "bye".into()]))
        );
        assert_eq!(parse_list_source("  "), None);
    }

    #[test]
    fn export_rejects_overlong_list() {
        let items: Vec<String> = (0..100).map(|i| format!("item{i}")).collect();
        let rule = ValidationRule::new(ValidationType::List(ListSource::Inline(items)));
        assert!(rule_to_xlsx(&rule).is_err());

        let short = ValidationRule::new(ValidationType::List(ListSource::Inline(vec!["Open".into()])));
        assert!(rule_to_xlsx(&short).is_ok());
    }
}
