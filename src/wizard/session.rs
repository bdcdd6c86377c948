// Wizard session - owns one state machine and its single pending verification

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::definition::{WizardDefinition, WizardVariant};
use super::input;
use super::providers::RandomOutcome;
use super::state_machine::{WizardEffect, WizardMachine};
use super::traits::{
    Navigator, Notifier, TracingNavigator, TracingNotifier, VerificationOutcomeProvider, VerificationRequest,
};
use super::types::{
    FieldError, FieldValue, Fields, Notification, NotificationLevel, Prefill, TransitionResult, VerificationOutcome,
    WizardError, WizardStep,
};
use crate::telemetry::{create_wizard_span, generate_correlation_id};

/// Host-side collaborators of a session
#[derive(Clone)]
pub struct Collaborators {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub outcomes: Arc<dyn VerificationOutcomeProvider>,
}

impl Collaborators {
    /// Log-only collaborators with the definition's random outcome
    pub fn simulated(definition: &WizardDefinition) -> Self {
        let probability = definition
            .verification
            .as_ref()
            .map_or(1.0, |policy| policy.success_probability);
        Self {
            navigator: Arc::new(TracingNavigator),
            notifier: Arc::new(TracingNotifier),
            outcomes: Arc::new(RandomOutcome::new(probability)),
        }
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSnapshot {
    pub session_id: String,
    pub variant: WizardVariant,
    pub transaction_id: String,
    pub step: WizardStep,
    pub step_id: &'static str,
    pub step_label: &'static str,
    pub progress: u8,
    pub fields: Fields,
    pub pending: bool,
    pub mismatch_report_open: bool,
    pub closed: bool,
}

/// State shared between a session and its verification timer
struct SessionCore {
    machine: WizardMachine,
    closed: bool,
}

/// Work an effect asks of the session itself rather than a collaborator
enum Followup {
    Schedule(Duration),
    Release,
}

impl SessionCore {
    fn apply(
        &mut self,
        collaborators: &Collaborators,
        event: impl FnOnce(&mut WizardMachine) -> TransitionResult,
    ) -> (TransitionResult, Vec<Followup>) {
        if self.closed {
            return (TransitionResult::Unchanged { step: self.machine.step() }, Vec::new());
        }
        let result = event(&mut self.machine);
        let mut followups = Vec::new();
        for effect in self.machine.drain_effects() {
            match effect {
                WizardEffect::Notify(notification) => collaborators.notifier.notify(&notification),
                WizardEffect::Navigate(route) => collaborators.navigator.navigate(&route),
                WizardEffect::ScheduleVerification { delay } => followups.push(Followup::Schedule(delay)),
                WizardEffect::Close => {
                    self.closed = true;
                    followups.push(Followup::Release);
                }
            }
        }
        (result, followups)
    }
}

fn lock(core: &Mutex<SessionCore>) -> MutexGuard<'_, SessionCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct WizardSession {
    id: String,
    definition: Arc<WizardDefinition>,
    core: Arc<Mutex<SessionCore>>,
    collaborators: Collaborators,
    runtime: Handle,
    pending: Option<JoinHandle<Option<TransitionResult>>>,
    mismatch_report_open: bool,
    span: tracing::Span,
}

impl WizardSession {
    /// Create a session on the current Tokio runtime.
    pub fn new(
        definition: WizardDefinition,
        transaction_id: impl Into<String>,
        prefill: &Prefill,
        collaborators: Collaborators,
    ) -> Result<Self, WizardError> {
        let runtime = Handle::try_current().map_err(|_| WizardError::NoRuntime)?;
        let transaction_id = transaction_id.into();
        let id = generate_correlation_id();
        let span = create_wizard_span(&id, definition.variant.as_str(), &transaction_id);
        let definition = Arc::new(definition);
        let machine = WizardMachine::with_prefill(Arc::clone(&definition), transaction_id, prefill)?;

        span.in_scope(|| {
            tracing::info!(
                prefilled = prefill.len(),
                steps = definition.steps.len(),
                "Wizard session started"
            )
        });

        Ok(Self {
            id,
            definition,
            core: Arc::new(Mutex::new(SessionCore { machine, closed: false })),
            collaborators,
            runtime,
            pending: None,
            mismatch_report_open: false,
            span,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn step(&self) -> WizardStep {
        lock(&self.core).machine.step()
    }

    /// Current field values; a copy, since the timer may resolve concurrently.
    pub fn fields(&self) -> Fields {
        lock(&self.core).machine.fields().clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.core).machine.is_pending()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.core).closed
    }

    pub fn has_pending_task(&self) -> bool {
        self.pending.is_some()
    }

    pub fn mismatch_report_open(&self) -> bool {
        self.mismatch_report_open
    }

    /// Normalize raw text the way the input layer does, then update the field.
    pub fn type_into(&mut self, key: &str, raw: &str) -> Result<(), FieldError> {
        let spec = self
            .definition
            .field(key)
            .ok_or_else(|| FieldError::UnknownField { key: key.to_string() })?;
        let value = input::normalize(raw, spec.normalization, spec.max_len);
        self.update_field(key, FieldValue::Text(value))
    }

    pub fn set_flag(&mut self, key: &str, flag: bool) -> Result<(), FieldError> {
        self.update_field(key, FieldValue::Flag(flag))
    }

    pub fn update_field(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError> {
        let result = {
            let mut core = lock(&self.core);
            if core.closed {
                Err(FieldError::NotEditable {
                    key: key.to_string(),
                    step: core.machine.step(),
                })
            } else {
                core.machine.update_field(key, value)
            }
        };
        if let Err(e) = &result {
            let _guard = self.span.enter();
            tracing::debug!(key, error = %e, "Field update ignored");
        }
        result
    }

    pub fn submit(&mut self) -> TransitionResult {
        self.apply(|machine| machine.submit())
    }

    pub fn back(&mut self) -> TransitionResult {
        self.apply(|machine| machine.back())
    }

    pub fn retry(&mut self) -> TransitionResult {
        self.apply(|machine| machine.retry())
    }

    /// Leave the wizard from any step; releases the pending verification.
    pub fn exit(&mut self) -> TransitionResult {
        self.apply(|machine| machine.exit())
    }

    /// Wait until the in-flight verification has resolved the wizard.
    ///
    /// The timer applies the outcome on its own; this only reports it.
    pub async fn wait_for_verification(&mut self) -> Option<TransitionResult> {
        let handle = self.pending.take()?;
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                {
                    let _guard = self.span.enter();
                    tracing::warn!(error = %e, "Verification task failed, treating as rejected");
                }
                if !self.is_pending() {
                    return None;
                }
                Some(self.apply(|machine| machine.resolve(VerificationOutcome::Rejected)))
            }
        }
    }

    /// Report the resolution if the delay has already elapsed.
    pub async fn poll_verification(&mut self) -> Option<TransitionResult> {
        if !self.pending.as_ref()?.is_finished() {
            return None;
        }
        self.wait_for_verification().await
    }

    /// Company wizard only: show or hide the "details don't match" panel.
    pub fn toggle_mismatch_report(&mut self) -> Result<bool, WizardError> {
        if !self.definition.allows_mismatch_report {
            return Err(WizardError::MismatchReportUnavailable(self.definition.variant.to_string()));
        }
        self.mismatch_report_open = !self.mismatch_report_open;
        if self.mismatch_report_open {
            self.collaborators.notifier.notify(&Notification {
                title: "Report a Mismatch".to_string(),
                description: "Contact support if your prefilled details are incorrect".to_string(),
                level: NotificationLevel::Info,
            });
        }
        Ok(self.mismatch_report_open)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let core = lock(&self.core);
        let step = core.machine.step();
        WizardSnapshot {
            session_id: self.id.clone(),
            variant: self.definition.variant,
            transaction_id: core.machine.transaction_id().to_string(),
            step,
            step_id: self.definition.step_id(step),
            step_label: self.definition.step_label(step),
            progress: self.definition.progress(step),
            fields: core.machine.fields().clone(),
            pending: core.machine.is_pending(),
            mismatch_report_open: self.mismatch_report_open,
            closed: core.closed,
        }
    }

    fn apply(&mut self, event: impl FnOnce(&mut WizardMachine) -> TransitionResult) -> TransitionResult {
        let (result, followups) = {
            let _guard = self.span.enter();
            lock(&self.core).apply(&self.collaborators, event)
        };
        for followup in followups {
            match followup {
                Followup::Schedule(delay) => self.schedule(delay),
                Followup::Release => self.release_pending(),
            }
        }
        result
    }

    /// Spawn the one-shot timer that draws the outcome and resolves the wizard.
    fn schedule(&mut self, delay: Duration) {
        let request = {
            let core = lock(&self.core);
            VerificationRequest {
                session_id: self.id.clone(),
                variant: self.definition.variant,
                transaction_id: core.machine.transaction_id().to_string(),
                fields: core.machine.fields().clone(),
            }
        };
        let core: Weak<Mutex<SessionCore>> = Arc::downgrade(&self.core);
        let collaborators = self.collaborators.clone();
        let task = async move {
            tokio::time::sleep(delay).await;
            let outcome = collaborators.outcomes.verify(&request).await;

            // The session is gone; nobody left to resolve.
            let core = core.upgrade()?;
            let mut core = lock(&core);
            if !core.machine.is_pending() {
                return None;
            }
            // Resolution only notifies and navigates, so no followups remain.
            let (result, _) = core.apply(&collaborators, |machine| machine.resolve(outcome));
            Some(result)
        };
        if let Some(previous) = self.pending.replace(self.runtime.spawn(task.instrument(self.span.clone()))) {
            previous.abort();
        }
    }

    fn release_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
            let _guard = self.span.enter();
            tracing::info!("Pending verification cancelled");
        }
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        self.release_pending();
    }
}
