use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Position of a wizard session within its step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum WizardStep {
    /// Data-collection step, indexed into the definition's step list
    Collect(usize),
    Verifying,
    Succeeded,
    Failed,
}

impl WizardStep {
    pub fn collect_index(&self) -> Option<usize> {
        match self {
            WizardStep::Collect(index) => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Collect(index) => write!(f, "collect[{index}]"),
            WizardStep::Verifying => write!(f, "verifying"),
            WizardStep::Succeeded => write!(f, "succeeded"),
            WizardStep::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// A collected value plus its read-only marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub value: FieldValue,
    /// Supplied from earlier verification; never editable in this session
    pub prefilled: bool,
}

/// Collected field values keyed by field name, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldEntry>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: FieldEntry) {
        self.0.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&FieldEntry> {
        self.0.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key).map(|entry| &entry.value)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(FieldValue::as_flag)
    }

    pub fn is_prefilled(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|entry| entry.prefilled)
    }

    pub(crate) fn set_value(&mut self, key: &str, value: FieldValue) {
        if let Some(entry) = self.0.get_mut(key) {
            entry.value = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldEntry)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Values supplied by the identity-prefill collaborator at initialization.
pub type Prefill = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub level: NotificationLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Route {
    Dashboard,
    Tracking { transaction_id: String },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Tracking { transaction_id } => write!(f, "/tracking/{transaction_id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Approved,
    Rejected,
}

impl VerificationOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            VerificationOutcome::Approved
        } else {
            VerificationOutcome::Rejected
        }
    }
}

/// Result of one transition request against the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    Transitioned { from: WizardStep, to: WizardStep },
    /// Guard failed; state untouched
    Rejected { step: WizardStep, failed_fields: Vec<String> },
    Unchanged { step: WizardStep },
}

impl TransitionResult {
    pub fn is_transition(&self) -> bool {
        matches!(self, TransitionResult::Transitioned { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Unknown field: {key}")]
    UnknownField { key: String },
    #[error("Field {key} is prefilled and read-only")]
    ReadOnly { key: String },
    #[error("Field {key} is not editable at step {step}")]
    NotEditable { key: String, step: WizardStep },
    #[error("Field {key} expects a {expected} value")]
    KindMismatch { key: String, expected: &'static str },
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Unknown wizard variant: {0}")]
    UnknownVariant(String),
    #[error("Field {key} cannot be prefilled for the {variant} wizard")]
    PrefillNotAllowed { key: String, variant: String },
    #[error("Prefill value for {key} is invalid: {reason}")]
    InvalidPrefill { key: String, reason: String },
    #[error("The {0} wizard has no mismatch report")]
    MismatchReportUnavailable(String),
    #[error("Wizard sessions need a running Tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Field(#[from] FieldError),
}
