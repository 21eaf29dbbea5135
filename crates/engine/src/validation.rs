//! Data validation rules carried through a read/modify/write cycle.
//!
//! Rules are kept the way the file stores them: constraint operands and list
//! formulas are formula text (`10`, `$B$1`, `TODAY()`), never evaluated.

use serde::{Deserialize, Serialize};

/// A rule applied to a rectangular range, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetValidation {
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub rule: ValidationRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub rule_type: ValidationType,
    /// Empty cells always pass.
    pub ignore_blank: bool,
    /// List rules only: show the in-cell dropdown arrow.
    pub show_dropdown: bool,
    pub input_message: InputMessage,
    pub error_alert: ErrorAlert,
}

impl ValidationRule {
    pub fn new(rule_type: ValidationType) -> Self {
        Self {
            rule_type,
            ignore_blank: true,
            show_dropdown: true,
            input_message: InputMessage::default(),
            error_alert: ErrorAlert::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationType {
    /// No restriction; used to attach an input message only.
    AnyValue,
    WholeNumber(Constraint),
    Decimal(Constraint),
    List(ListSource),
    Date(Constraint),
    Time(Constraint),
    TextLength(Constraint),
    /// Formula that must evaluate to TRUE.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub operator: ComparisonOperator,
    pub value1: String,
    /// Upper bound for `Between` and `NotBetween`.
    pub value2: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ComparisonOperator {
    pub fn takes_two_values(self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListSource {
    /// Literal items, e.g. `Open`, `Done`.
    Inline(Vec<String>),
    /// A range or defined name, e.g. `$H$1:$H$4`.
    Formula(String),
}

/// Prompt shown when a validated cell is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub show: bool,
    pub title: String,
    pub message: String,
}

/// Alert shown when an entry fails the rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorAlert {
    pub show: bool,
    pub style: ErrorStyle,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorStyle {
    /// Reject the entry.
    #[default]
    Stop,
    /// Allow the entry after confirmation.
    Warning,
    /// Allow the entry, show a note.
    Information,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rule_ignores_blanks_and_shows_dropdown() {
        let rule = ValidationRule::new(ValidationType::List(ListSource::Inline(vec!["Open".into()])));
        assert!(rule.ignore_blank);
        assert!(rule.show_dropdown);
        assert!(!rule.input_message.show);
        assert_eq!(rule.error_alert.style, ErrorStyle::Stop);
    }

    #[test]
    fn only_range_operators_take_two_values() {
        assert!(ComparisonOperator::Between.takes_two_values());
        assert!(ComparisonOperator::NotBetween.takes_two_values());
        assert!(!ComparisonOperator::GreaterThan.takes_two_values());
    }
}
