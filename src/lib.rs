// KYC Wizard Library - simulated identity verification flows
// This exposes the wizard core, the tracking timeline and the ambient stack

pub mod wizard;
pub mod tracking;
pub mod telemetry;
pub mod config;

// Re-export key types for easy access
pub use wizard::{
    Collaborators, FieldValue, Prefill, Route, TransitionResult, VerificationOutcome, WizardDefinition,
    WizardError, WizardSession, WizardSnapshot, WizardStep, WizardVariant,
};
pub use tracking::{StageStatus, TrackingTimeline, TransactionDetails};
pub use telemetry::{init_telemetry, generate_correlation_id, create_wizard_span};
pub use config::{KycWizardConfig, config};
