// Wizard variants as data: each variant is a sequence of step specifications
// followed by an optional simulated verification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::input::Normalization;
use super::types::{FieldValue, Fields, Notification, NotificationLevel, Route, WizardError, WizardStep};
use super::validation::Constraint;
use crate::config::{VariantVerification, VerificationSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardVariant {
    Individual,
    Company,
    Login,
}

impl WizardVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardVariant::Individual => "individual",
            WizardVariant::Company => "company",
            WizardVariant::Login => "login",
        }
    }
}

impl fmt::Display for WizardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardVariant {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(WizardVariant::Individual),
            "company" => Ok(WizardVariant::Company),
            "login" => Ok(WizardVariant::Login),
            other => Err(WizardError::UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub constraint: Constraint,
    pub normalization: Normalization,
    /// Input is truncated past this many characters
    pub max_len: Option<usize>,
    /// Whether the identity-prefill collaborator may supply this field
    pub prefillable: bool,
}

impl FieldSpec {
    fn text(key: &'static str, label: &'static str, constraint: Constraint) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            constraint,
            normalization: Normalization::Verbatim,
            max_len: None,
            prefillable: false,
        }
    }

    fn flag(key: &'static str, label: &'static str, constraint: Constraint) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Flag,
            constraint,
            normalization: Normalization::Verbatim,
            max_len: None,
            prefillable: false,
        }
    }

    fn uppercase(mut self, max_len: usize) -> Self {
        self.normalization = Normalization::Uppercase;
        self.max_len = Some(max_len);
        self
    }

    fn digits(mut self, max_len: usize) -> Self {
        self.normalization = Normalization::DigitsOnly;
        self.max_len = Some(max_len);
        self
    }

    fn prefillable(mut self) -> Self {
        self.prefillable = true;
        self
    }

    pub fn initial_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Flag => FieldValue::Flag(false),
        }
    }

    pub fn accepts_kind(&self, value: &FieldValue) -> bool {
        matches!(
            (self.kind, value),
            (FieldKind::Text, FieldValue::Text(_)) | (FieldKind::Flag, FieldValue::Flag(_))
        )
    }
}

/// Notification template. `{key}` placeholders are filled from collected fields.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: &'static str,
    pub description: &'static str,
    pub level: NotificationLevel,
}

impl Notice {
    const fn new(title: &'static str, description: &'static str, level: NotificationLevel) -> Self {
        Self {
            title,
            description,
            level,
        }
    }

    pub fn render(&self, fields: &Fields) -> Notification {
        let mut description = self.description.to_string();
        for (key, entry) in fields.iter() {
            if let Some(text) = entry.value.as_text() {
                description = description.replace(&format!("{{{key}}}"), text);
            }
        }
        Notification {
            title: self.title.to_string(),
            description,
            level: self.level,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub fields: Vec<FieldSpec>,
    /// Emitted when this step's guard passes
    pub completed: Notice,
}

impl StepSpec {
    /// Keys of fields failing their constraint, in declaration order
    pub fn failing_fields(&self, fields: &Fields) -> Vec<String> {
        self.fields
            .iter()
            .filter(|spec| {
                !fields
                    .value(spec.key)
                    .is_some_and(|value| spec.constraint.is_satisfied_by(value))
            })
            .map(|spec| spec.key.to_string())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    pub delay: Duration,
    pub success_probability: f64,
    pub approved: Notice,
    pub rejected: Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessRoute {
    Dashboard,
    Tracking,
}

/// Complete description of one wizard variant
#[derive(Debug, Clone)]
pub struct WizardDefinition {
    pub variant: WizardVariant,
    pub title: &'static str,
    pub steps: Vec<StepSpec>,
    /// `None` means the last step completes the flow directly
    pub verification: Option<VerificationPolicy>,
    /// Notification when completing without verification
    pub completed: Option<Notice>,
    pub success_route: SuccessRoute,
    pub allows_mismatch_report: bool,
}

impl WizardDefinition {
    pub fn for_variant(variant: WizardVariant, settings: &VerificationSettings) -> Self {
        match variant {
            WizardVariant::Individual => individual_kyc(&settings.individual),
            WizardVariant::Company => company_kyc(&settings.company),
            WizardVariant::Login => login(),
        }
    }

    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.steps.get(index)
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .find(|spec| spec.key == key)
    }

    /// Index of the step owning `key`
    pub fn step_of(&self, key: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.fields.iter().any(|spec| spec.key == key))
    }

    pub fn last_step(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn initial_fields(&self) -> Fields {
        let mut fields = Fields::new();
        for spec in self.steps.iter().flat_map(|step| step.fields.iter()) {
            fields.insert(
                spec.key,
                super::types::FieldEntry {
                    value: spec.initial_value(),
                    prefilled: false,
                },
            );
        }
        fields
    }

    pub fn success_route(&self, transaction_id: &str) -> Route {
        match self.success_route {
            SuccessRoute::Dashboard => Route::Dashboard,
            SuccessRoute::Tracking => Route::Tracking {
                transaction_id: transaction_id.to_string(),
            },
        }
    }

    /// Stable identifier of a step, as shown to users
    pub fn step_id(&self, step: WizardStep) -> &'static str {
        match step {
            WizardStep::Collect(index) => self.step(index).map_or("unknown", |spec| spec.id),
            WizardStep::Verifying => "processing",
            WizardStep::Succeeded => "success",
            WizardStep::Failed => "failed",
        }
    }

    pub fn step_label(&self, step: WizardStep) -> &'static str {
        match step {
            WizardStep::Collect(index) => self.step(index).map_or("Unknown", |spec| spec.label),
            WizardStep::Verifying => "Processing KYC",
            WizardStep::Succeeded => "Completed",
            WizardStep::Failed => "Verification Failed",
        }
    }

    /// Progress bar value in percent
    pub fn progress(&self, step: WizardStep) -> u8 {
        let collect = self.steps.len();
        let total = collect + if self.verification.is_some() { 2 } else { 1 };
        let position = match step {
            WizardStep::Collect(index) => index + 1,
            WizardStep::Verifying => collect + 1,
            WizardStep::Succeeded => total,
            WizardStep::Failed => collect,
        };
        (position.min(total) * 100 / total) as u8
    }
}

fn verification(settings: &VariantVerification, approved: Notice) -> VerificationPolicy {
    VerificationPolicy {
        delay: settings.delay(),
        success_probability: settings.success_probability,
        approved,
        rejected: Notice::new(
            "KYC Verification Failed",
            "Please check your details and try again",
            NotificationLevel::Error,
        ),
    }
}

fn aadhaar_otp_step(completed: Notice) -> StepSpec {
    StepSpec {
        id: "aadhaar-otp",
        label: "Aadhaar OTP",
        fields: vec![FieldSpec::text("aadhaar_otp", "Aadhaar OTP", Constraint::ExactDigits(6)).digits(6)],
        completed,
    }
}

/// PAN, then Aadhaar number, then Aadhaar OTP.
pub fn individual_kyc(settings: &VariantVerification) -> WizardDefinition {
    WizardDefinition {
        variant: WizardVariant::Individual,
        title: "Individual KYC",
        steps: vec![
            StepSpec {
                id: "pan",
                label: "PAN Verification",
                fields: vec![
                    FieldSpec::text("pan", "PAN Card Number", Constraint::ExactLength(10)).uppercase(10),
                ],
                completed: Notice::new(
                    "PAN Verified",
                    "Please enter your Aadhaar number",
                    NotificationLevel::Success,
                ),
            },
            StepSpec {
                id: "aadhaar",
                label: "Aadhaar Number",
                fields: vec![
                    FieldSpec::text("aadhaar", "Aadhaar Number", Constraint::ExactDigits(12)).digits(12),
                ],
                completed: Notice::new(
                    "Aadhaar Verified",
                    "OTP sent to your registered mobile number",
                    NotificationLevel::Success,
                ),
            },
            aadhaar_otp_step(Notice::new(
                "OTP Submitted",
                "Verifying your KYC details",
                NotificationLevel::Info,
            )),
        ],
        verification: Some(verification(
            settings,
            Notice::new(
                "KYC Completed Successfully",
                "Your transaction will now be processed",
                NotificationLevel::Success,
            ),
        )),
        completed: None,
        success_route: SuccessRoute::Tracking,
        allows_mismatch_report: false,
    }
}

/// Company details, then authorized signatory, then the signatory's Aadhaar OTP.
pub fn company_kyc(settings: &VariantVerification) -> WizardDefinition {
    WizardDefinition {
        variant: WizardVariant::Company,
        title: "Company KYC",
        steps: vec![
            StepSpec {
                id: "company-details",
                label: "Company Details",
                fields: vec![
                    FieldSpec::text("company_pan", "Company PAN", Constraint::ExactLength(10))
                        .uppercase(10)
                        .prefillable(),
                    FieldSpec::text("gst", "GST Number", Constraint::ExactLength(15)).uppercase(15),
                    FieldSpec::text("cin", "CIN Number", Constraint::MinLength(15)).uppercase(21),
                ],
                completed: Notice::new(
                    "Company Details Verified",
                    "Please provide authorized signatory details",
                    NotificationLevel::Success,
                ),
            },
            StepSpec {
                id: "signatory",
                label: "Authorized Signatory",
                fields: vec![
                    FieldSpec::text("signatory_pan", "Authorized Signatory PAN", Constraint::ExactLength(10))
                        .uppercase(10),
                    FieldSpec::text(
                        "signatory_aadhaar",
                        "Authorized Signatory Aadhaar",
                        Constraint::ExactDigits(12),
                    )
                    .digits(12)
                    .prefillable(),
                    FieldSpec::flag("is_nre", "NRE Account Holder", Constraint::Any),
                    FieldSpec::flag(
                        "declaration_accepted",
                        "I declare that all the information provided is true and accurate",
                        Constraint::MustBeTrue,
                    ),
                ],
                completed: Notice::new(
                    "Signatory Details Verified",
                    "Aadhaar OTP sent to registered mobile number",
                    NotificationLevel::Success,
                ),
            },
            aadhaar_otp_step(Notice::new(
                "OTP Submitted",
                "Verifying company documents and signatory details",
                NotificationLevel::Info,
            )),
        ],
        verification: Some(verification(
            settings,
            Notice::new(
                "Company KYC Completed Successfully",
                "Your transaction will now be processed",
                NotificationLevel::Success,
            ),
        )),
        completed: None,
        success_route: SuccessRoute::Tracking,
        allows_mismatch_report: true,
    }
}

/// Phone number, then the login OTP. No remote verification.
pub fn login() -> WizardDefinition {
    WizardDefinition {
        variant: WizardVariant::Login,
        title: "Login",
        steps: vec![
            StepSpec {
                id: "phone",
                label: "Mobile Number",
                fields: vec![FieldSpec::text("phone", "Mobile Number", Constraint::MinLength(10))],
                completed: Notice::new("OTP Sent", "Verification code sent to {phone}", NotificationLevel::Info),
            },
            StepSpec {
                id: "otp",
                label: "Verification Code",
                fields: vec![FieldSpec::text("otp", "Verification Code", Constraint::ExactDigits(6)).digits(6)],
                completed: Notice::new("OTP Verified", "Signing you in", NotificationLevel::Info),
            },
        ],
        verification: None,
        completed: Some(Notice::new(
            "Login Successful",
            "Welcome to your dashboard",
            NotificationLevel::Success,
        )),
        success_route: SuccessRoute::Dashboard,
        allows_mismatch_report: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KycWizardConfig;

    fn definitions() -> Vec<WizardDefinition> {
        let settings = KycWizardConfig::default().verification;
        [WizardVariant::Individual, WizardVariant::Company, WizardVariant::Login]
            .into_iter()
            .map(|variant| WizardDefinition::for_variant(variant, &settings))
            .collect()
    }

    #[test]
    fn field_keys_are_unique_per_variant() {
        for definition in definitions() {
            let mut keys: Vec<_> = definition
                .steps
                .iter()
                .flat_map(|step| step.fields.iter().map(|spec| spec.key))
                .collect();
            let total = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), total, "duplicate key in {}", definition.variant);
        }
    }

    #[test]
    fn kyc_variants_end_with_six_digit_code() {
        for definition in definitions() {
            let last = definition.step(definition.last_step()).unwrap();
            let code = last.fields.last().unwrap();
            assert_eq!(code.constraint, Constraint::ExactDigits(6));
        }
    }

    #[test]
    fn progress_follows_screen_percentages() {
        let settings = KycWizardConfig::default().verification;
        let individual = individual_kyc(&settings.individual);
        assert_eq!(individual.progress(WizardStep::Collect(0)), 20);
        assert_eq!(individual.progress(WizardStep::Collect(1)), 40);
        assert_eq!(individual.progress(WizardStep::Collect(2)), 60);
        assert_eq!(individual.progress(WizardStep::Verifying), 80);
        assert_eq!(individual.progress(WizardStep::Succeeded), 100);
        assert_eq!(individual.progress(WizardStep::Failed), 60);

        let login = login();
        assert_eq!(login.progress(WizardStep::Collect(0)), 33);
        assert_eq!(login.progress(WizardStep::Succeeded), 100);
    }

    #[test]
    fn renders_field_placeholders() {
        let definition = login();
        let mut fields = definition.initial_fields();
        fields.set_value("phone", "9876543210".into());
        let notification = definition.steps[0].completed.render(&fields);
        assert_eq!(notification.description, "Verification code sent to 9876543210");
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("Company".parse::<WizardVariant>().unwrap(), WizardVariant::Company);
        assert!("partnership".parse::<WizardVariant>().is_err());
    }

    #[test]
    fn only_company_identity_fields_are_prefillable() {
        let settings = KycWizardConfig::default().verification;
        let company = company_kyc(&settings.company);
        let prefillable: Vec<_> = company
            .steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .filter(|spec| spec.prefillable)
            .map(|spec| spec.key)
            .collect();
        assert_eq!(prefillable, vec!["company_pan", "signatory_aadhaar"]);
        assert!(individual_kyc(&settings.individual)
            .steps
            .iter()
            .all(|step| step.fields.iter().all(|spec| !spec.prefillable)));
    }
}
