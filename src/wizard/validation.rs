// Field-level validation predicates
//
// Every predicate is exact-match: a field either satisfies its constraint or
// the step it belongs to cannot be completed.

use serde::{Deserialize, Serialize};

use super::types::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "len", rename_all = "snake_case")]
pub enum Constraint {
    /// Exactly `n` characters
    ExactLength(usize),
    /// At least `n` characters
    MinLength(usize),
    /// Exactly `n` ASCII digits and nothing else
    ExactDigits(usize),
    /// Flag that must be set
    MustBeTrue,
    /// Optional toggle or free text
    Any,
}

impl Constraint {
    pub fn is_satisfied_by(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Constraint::Any, _) => true,
            (Constraint::ExactLength(n), FieldValue::Text(text)) => text.chars().count() == *n,
            (Constraint::MinLength(n), FieldValue::Text(text)) => text.chars().count() >= *n,
            (Constraint::ExactDigits(n), FieldValue::Text(text)) => {
                text.len() == *n && text.bytes().all(|b| b.is_ascii_digit())
            }
            (Constraint::MustBeTrue, FieldValue::Flag(flag)) => *flag,
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Constraint::ExactLength(n) => format!("exactly {n} characters"),
            Constraint::MinLength(n) => format!("at least {n} characters"),
            Constraint::ExactDigits(n) => format!("exactly {n} digits"),
            Constraint::MustBeTrue => "must be accepted".to_string(),
            Constraint::Any => "optional".to_string(),
        }
    }
}
