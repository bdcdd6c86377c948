// Verification outcome providers

use async_trait::async_trait;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::traits::{VerificationOutcomeProvider, VerificationRequest};
use super::types::VerificationOutcome;
use crate::config::unit_probability;

/// Coin flip against a fixed success probability
#[derive(Debug, Clone, Copy)]
pub struct RandomOutcome {
    success_probability: f64,
}

impl RandomOutcome {
    pub fn new(success_probability: f64) -> Self {
        Self {
            success_probability: unit_probability(success_probability),
        }
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }
}

#[async_trait]
impl VerificationOutcomeProvider for RandomOutcome {
    async fn verify(&self, request: &VerificationRequest) -> VerificationOutcome {
        let approved = rand::rng().random_bool(self.success_probability);
        tracing::debug!(
            session_id = %request.session_id,
            variant = %request.variant,
            approved,
            "Simulated verification drawn"
        );
        VerificationOutcome::from_success(approved)
    }
}

/// Always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub VerificationOutcome);

#[async_trait]
impl VerificationOutcomeProvider for FixedOutcome {
    async fn verify(&self, _request: &VerificationRequest) -> VerificationOutcome {
        self.0
    }
}

/// Replays queued outcomes, then falls back to a default
#[derive(Debug)]
pub struct ScriptedOutcome {
    queue: Mutex<VecDeque<VerificationOutcome>>,
    fallback: VerificationOutcome,
}

impl ScriptedOutcome {
    pub fn new(outcomes: impl IntoIterator<Item = VerificationOutcome>, fallback: VerificationOutcome) -> Self {
        Self {
            queue: Mutex::new(outcomes.into_iter().collect()),
            fallback,
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
    }
}

#[async_trait]
impl VerificationOutcomeProvider for ScriptedOutcome {
    async fn verify(&self, _request: &VerificationRequest) -> VerificationOutcome {
        match self.queue.lock() {
            Ok(mut queue) => queue.pop_front().unwrap_or(self.fallback),
            Err(_) => self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::definition::WizardVariant;
    use crate::wizard::types::Fields;

    fn request() -> VerificationRequest {
        VerificationRequest {
            session_id: "session".to_string(),
            variant: WizardVariant::Individual,
            transaction_id: "TXN001".to_string(),
            fields: Fields::new(),
        }
    }

    #[tokio::test]
    async fn random_outcome_honors_certain_probabilities() {
        assert_eq!(RandomOutcome::new(1.0).verify(&request()).await, VerificationOutcome::Approved);
        assert_eq!(RandomOutcome::new(0.0).verify(&request()).await, VerificationOutcome::Rejected);
        assert_eq!(RandomOutcome::new(7.0).success_probability(), 1.0);
    }

    #[tokio::test]
    async fn random_outcome_rejects_when_probability_is_nan() {
        let provider = RandomOutcome::new(f64::NAN);
        assert_eq!(provider.success_probability(), 0.0);
        assert_eq!(provider.verify(&request()).await, VerificationOutcome::Rejected);
    }

    #[tokio::test]
    async fn scripted_outcome_replays_then_falls_back() {
        let provider = ScriptedOutcome::new(
            [VerificationOutcome::Rejected, VerificationOutcome::Approved],
            VerificationOutcome::Rejected,
        );
        assert_eq!(provider.verify(&request()).await, VerificationOutcome::Rejected);
        assert_eq!(provider.verify(&request()).await, VerificationOutcome::Approved);
        assert_eq!(provider.remaining(), 0);
        assert_eq!(provider.verify(&request()).await, VerificationOutcome::Rejected);
    }
}
