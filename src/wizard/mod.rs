// Verification Wizard - generic multi-step state machine
//
// One machine parameterized by a sequence of step specifications. Variants
// (individual KYC, company KYC, login) differ only in their definitions.

pub mod types;
pub mod validation;
pub mod input;
pub mod definition;
pub mod state_machine;
pub mod traits;
pub mod providers;
pub mod session;

#[cfg(test)]
pub mod mocks;


pub use types::{
    FieldEntry, FieldError, FieldValue, Fields, Notification, NotificationLevel, Prefill, Route,
    TransitionResult, VerificationOutcome, WizardError, WizardStep,
};
pub use definition::{WizardDefinition, WizardVariant};
pub use state_machine::{WizardEffect, WizardEvent, WizardMachine};
pub use traits::{Navigator, Notifier, TracingNavigator, TracingNotifier, VerificationOutcomeProvider, VerificationRequest};
pub use providers::{FixedOutcome, RandomOutcome, ScriptedOutcome};
pub use session::{Collaborators, WizardSession, WizardSnapshot};
