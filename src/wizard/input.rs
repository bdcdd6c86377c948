// Input handling - normalizes raw keystrokes before they reach the machine

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Alphanumeric identifiers are uppercased
    Uppercase,
    /// Numeric identifiers keep only ASCII digits
    DigitsOnly,
    /// Passed through as typed
    Verbatim,
}

/// Normalize raw input and cap it at `max_len` characters.
pub fn normalize(raw: &str, normalization: Normalization, max_len: Option<usize>) -> String {
    let normalized: String = match normalization {
        Normalization::Uppercase => raw.to_uppercase(),
        Normalization::DigitsOnly => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
        Normalization::Verbatim => raw.to_string(),
    };

    match max_len {
        Some(limit) => normalized.chars().take(limit).collect(),
        None => normalized,
    }
}

/// Parse a yes/no answer for flag fields.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "on" => Some(true),
        "n" | "no" | "false" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}
