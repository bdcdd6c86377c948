use serde::{Deserialize, Serialize};
use statig::blocking::StateMachine;
use statig::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use super::definition::WizardDefinition;
use super::types::{
    FieldError, FieldValue, Fields, Notification, Prefill, Route, TransitionResult, VerificationOutcome,
    WizardError, WizardStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    /// Primary action of the current screen
    Submit,
    Back,
    Resolve(VerificationOutcome),
    Retry,
    Exit,
}

/// Side effects requested by a transition, applied by the owning session
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    Notify(Notification),
    Navigate(Route),
    ScheduleVerification { delay: Duration },
    /// The session is being left; pending work must be released
    Close,
}

/// Mutable session data handed to every state handler
#[derive(Debug, Clone)]
pub struct WizardData {
    pub step: WizardStep,
    pub fields: Fields,
    pub pending: bool,
    initial_fields: Fields,
    transaction_id: String,
    rejected_fields: Vec<String>,
    effects: Vec<WizardEffect>,
}

/// Immutable machine storage: which wizard this is
pub struct WizardFlow {
    definition: Arc<WizardDefinition>,
}

#[state_machine(initial = "State::collecting()")]
impl WizardFlow {
    #[state]
    fn collecting(&self, context: &mut WizardData, event: &WizardEvent) -> Outcome<State> {
        let Some(index) = context.step.collect_index() else {
            return Handled;
        };
        match event {
            WizardEvent::Submit => {
                let Some(step) = self.definition.step(index) else {
                    return Handled;
                };
                let failing = step.failing_fields(&context.fields);
                if !failing.is_empty() {
                    tracing::debug!(step = step.id, failing = ?failing, "Step guard rejected submission");
                    context.rejected_fields = failing;
                    return Handled;
                }
                context.effects.push(WizardEffect::Notify(step.completed.render(&context.fields)));

                if index < self.definition.last_step() {
                    context.step = WizardStep::Collect(index + 1);
                    tracing::info!(
                        variant = %self.definition.variant,
                        from = step.id,
                        to = self.definition.step_id(context.step),
                        "Step completed"
                    );
                    return Handled;
                }

                match &self.definition.verification {
                    Some(policy) => {
                        context.step = WizardStep::Verifying;
                        context.pending = true;
                        context
                            .effects
                            .push(WizardEffect::ScheduleVerification { delay: policy.delay });
                        tracing::info!(
                            variant = %self.definition.variant,
                            delay = ?policy.delay,
                            "Verification scheduled"
                        );
                        Transition(State::verifying())
                    }
                    None => {
                        self.enter_succeeded(context);
                        Transition(State::succeeded())
                    }
                }
            }
            WizardEvent::Back if index > 0 => {
                context.step = WizardStep::Collect(index - 1);
                tracing::info!(
                    variant = %self.definition.variant,
                    to = self.definition.step_id(context.step),
                    "Moved back one step"
                );
                Handled
            }
            WizardEvent::Back | WizardEvent::Exit => {
                self.leave(context);
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn verifying(&self, context: &mut WizardData, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Resolve(_) if !context.pending => Handled,
            WizardEvent::Resolve(VerificationOutcome::Approved) => {
                self.enter_succeeded(context);
                Transition(State::succeeded())
            }
            WizardEvent::Resolve(VerificationOutcome::Rejected) => {
                context.pending = false;
                context.step = WizardStep::Failed;
                if let Some(policy) = &self.definition.verification {
                    context.effects.push(WizardEffect::Notify(policy.rejected.render(&context.fields)));
                }
                tracing::warn!(variant = %self.definition.variant, "Verification rejected");
                Transition(State::failed())
            }
            WizardEvent::Exit => {
                self.leave(context);
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn succeeded(&self, context: &mut WizardData, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Submit => {
                context
                    .effects
                    .push(WizardEffect::Navigate(self.definition.success_route(&context.transaction_id)));
                Handled
            }
            WizardEvent::Exit => {
                self.leave(context);
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn failed(&self, context: &mut WizardData, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Retry => {
                context.fields = context.initial_fields.clone();
                context.pending = false;
                context.step = WizardStep::Collect(0);
                tracing::info!(variant = %self.definition.variant, "Wizard reset for retry");
                Transition(State::collecting())
            }
            WizardEvent::Exit | WizardEvent::Back => {
                self.leave(context);
                Handled
            }
            _ => Handled,
        }
    }
}

impl WizardFlow {
    fn enter_succeeded(&self, context: &mut WizardData) {
        context.pending = false;
        context.step = WizardStep::Succeeded;
        let notice = self
            .definition
            .verification
            .as_ref()
            .map(|policy| &policy.approved)
            .or(self.definition.completed.as_ref());
        if let Some(notice) = notice {
            context.effects.push(WizardEffect::Notify(notice.render(&context.fields)));
        }
        context
            .effects
            .push(WizardEffect::Navigate(self.definition.success_route(&context.transaction_id)));
        tracing::info!(variant = %self.definition.variant, "Wizard succeeded");
    }

    fn leave(&self, context: &mut WizardData) {
        // Nothing stays in flight once the wizard is left
        context.pending = false;
        context.effects.push(WizardEffect::Close);
        context.effects.push(WizardEffect::Navigate(Route::Dashboard));
        tracing::info!(
            variant = %self.definition.variant,
            step = self.definition.step_id(context.step),
            "Leaving wizard"
        );
    }
}

/// One verification wizard: generic state machine plus its collected data.
pub struct WizardMachine {
    definition: Arc<WizardDefinition>,
    machine: StateMachine<WizardFlow>,
    data: WizardData,
}

impl WizardMachine {
    pub fn new(definition: Arc<WizardDefinition>, transaction_id: impl Into<String>) -> Self {
        let fields = definition.initial_fields();
        let machine = WizardFlow {
            definition: Arc::clone(&definition),
        }
        .state_machine();

        Self {
            definition,
            machine,
            data: WizardData {
                step: WizardStep::Collect(0),
                initial_fields: fields.clone(),
                fields,
                pending: false,
                transaction_id: transaction_id.into(),
                rejected_fields: Vec::new(),
                effects: Vec::new(),
            },
        }
    }

    /// Start with values from earlier verification; those fields become read-only.
    pub fn with_prefill(
        definition: Arc<WizardDefinition>,
        transaction_id: impl Into<String>,
        prefill: &Prefill,
    ) -> Result<Self, WizardError> {
        let mut wizard = Self::new(definition, transaction_id);
        for (key, value) in prefill {
            let spec = wizard.definition.field(key).ok_or_else(|| FieldError::UnknownField { key: key.clone() })?;
            if !spec.prefillable {
                return Err(WizardError::PrefillNotAllowed {
                    key: key.clone(),
                    variant: wizard.definition.variant.to_string(),
                });
            }
            if !spec.accepts_kind(value) || !spec.constraint.is_satisfied_by(value) {
                return Err(WizardError::InvalidPrefill {
                    key: key.clone(),
                    reason: spec.constraint.describe(),
                });
            }
            wizard.data.initial_fields.insert(
                key.clone(),
                super::types::FieldEntry {
                    value: value.clone(),
                    prefilled: true,
                },
            );
        }
        wizard.data.fields = wizard.data.initial_fields.clone();
        Ok(wizard)
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn step(&self) -> WizardStep {
        self.data.step
    }

    pub fn fields(&self) -> &Fields {
        &self.data.fields
    }

    pub fn is_pending(&self) -> bool {
        self.data.pending
    }

    pub fn transaction_id(&self) -> &str {
        &self.data.transaction_id
    }

    /// Set a field of the current collection step.
    pub fn update_field(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError> {
        let spec = self
            .definition
            .field(key)
            .ok_or_else(|| FieldError::UnknownField { key: key.to_string() })?;
        if self.data.fields.is_prefilled(key) {
            return Err(FieldError::ReadOnly { key: key.to_string() });
        }
        if self.data.step.collect_index() != self.definition.step_of(key) {
            return Err(FieldError::NotEditable {
                key: key.to_string(),
                step: self.data.step,
            });
        }
        if !spec.accepts_kind(&value) {
            return Err(FieldError::KindMismatch {
                key: key.to_string(),
                expected: match value {
                    FieldValue::Text(_) => "flag",
                    FieldValue::Flag(_) => "text",
                },
            });
        }
        self.data.fields.set_value(key, value);
        Ok(())
    }

    pub fn submit(&mut self) -> TransitionResult {
        self.dispatch(WizardEvent::Submit)
    }

    pub fn back(&mut self) -> TransitionResult {
        self.dispatch(WizardEvent::Back)
    }

    pub fn resolve(&mut self, outcome: VerificationOutcome) -> TransitionResult {
        self.dispatch(WizardEvent::Resolve(outcome))
    }

    pub fn retry(&mut self) -> TransitionResult {
        self.dispatch(WizardEvent::Retry)
    }

    pub fn exit(&mut self) -> TransitionResult {
        self.dispatch(WizardEvent::Exit)
    }

    pub fn dispatch(&mut self, event: WizardEvent) -> TransitionResult {
        let from = self.data.step;
        self.data.rejected_fields.clear();
        self.machine.handle_with_context(&event, &mut self.data);
        let to = self.data.step;

        if from != to {
            TransitionResult::Transitioned { from, to }
        } else if !self.data.rejected_fields.is_empty() {
            TransitionResult::Rejected {
                step: from,
                failed_fields: std::mem::take(&mut self.data.rejected_fields),
            }
        } else {
            TransitionResult::Unchanged { step: from }
        }
    }

    /// Effects produced since the last drain, in emission order
    pub fn drain_effects(&mut self) -> Vec<WizardEffect> {
        std::mem::take(&mut self.data.effects)
    }
}
