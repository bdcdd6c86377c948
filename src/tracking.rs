// Transaction tracking timeline
//
// A fixed sequence of transfer stages. On every polling tick the current stage
// may complete, promoting the next one.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::Instrument;

use crate::config::unit_probability;
use crate::telemetry::create_tracking_span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Current,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: StageStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_time: Option<String>,
}

impl TrackingStage {
    fn new(id: &str, title: &str, description: &str, status: StageStatus, estimated_time: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status,
            completed_at: None,
            estimated_time: estimated_time.map(str::to_string),
        }
    }
}

/// Summary of the transfer being tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub amount: u64,
    pub currency: String,
    pub fees: u64,
    pub net_amount: u64,
    /// INR per unit of `currency`
    pub exchange_rate_inr: f64,
    pub sender_name: String,
    pub bank_account: String,
    pub purpose: String,
}

impl TransactionDetails {
    pub fn new(
        amount: u64,
        currency: impl Into<String>,
        fees: u64,
        exchange_rate_inr: f64,
        sender_name: impl Into<String>,
        bank_account: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency: currency.into(),
            fees,
            net_amount: amount.saturating_sub(fees),
            exchange_rate_inr,
            sender_name: sender_name.into(),
            bank_account: bank_account.into(),
            purpose: purpose.into(),
        }
    }

    /// The inbound transfer every simulated transaction carries
    pub fn simulated() -> Self {
        Self::new(
            5000,
            "USD",
            25,
            83.25,
            "Global Tech Corp",
            "HDFC Bank - ***4521",
            "Software Services",
        )
    }

    /// Net amount converted at the quoted rate
    pub fn net_amount_inr(&self) -> f64 {
        self.net_amount as f64 * self.exchange_rate_inr
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTimeline {
    pub transaction_id: String,
    pub details: TransactionDetails,
    pub stages: Vec<TrackingStage>,
    pub last_updated: DateTime<Utc>,
}

impl TrackingTimeline {
    /// Timeline of a transfer whose KYC has just been verified
    pub fn new(transaction_id: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut kyc = TrackingStage::new(
            "kyc-verified",
            "KYC Verified",
            "Your identity verification has been completed successfully",
            StageStatus::Completed,
            None,
        );
        kyc.completed_at = Some(now);

        Self {
            transaction_id: transaction_id.into(),
            details: TransactionDetails::simulated(),
            stages: vec![
                kyc,
                TrackingStage::new(
                    "processing",
                    "Processing Transfer",
                    "Your transaction is being processed by our banking partners",
                    StageStatus::Current,
                    Some("2-4 hours"),
                ),
                TrackingStage::new(
                    "bank-approval",
                    "Bank Approval",
                    "Awaiting approval from your destination bank",
                    StageStatus::Pending,
                    Some("4-6 hours"),
                ),
                TrackingStage::new(
                    "funds-credited",
                    "Funds Credited",
                    "Funds will be credited to your account",
                    StageStatus::Pending,
                    Some("6-24 hours"),
                ),
            ],
            last_updated: now,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        self.stages.iter().position(|stage| stage.status == StageStatus::Current)
    }

    /// Complete the current stage and promote the next. The last stage stays
    /// current.
    pub fn advance(&mut self) -> bool {
        let Some(index) = self.current_index() else {
            return false;
        };
        if index + 1 >= self.stages.len() {
            return false;
        }
        let now = Utc::now();
        self.stages[index].status = StageStatus::Completed;
        self.stages[index].completed_at = Some(now);
        self.stages[index + 1].status = StageStatus::Current;
        self.last_updated = now;
        tracing::info!(
            transaction_id = %self.transaction_id,
            completed = %self.stages[index].id,
            current = %self.stages[index + 1].id,
            "Tracking stage advanced"
        );
        true
    }

    /// One polling interval: advance with the given probability.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, advance_probability: f64) -> bool {
        if rng.random_bool(unit_probability(advance_probability)) {
            self.advance()
        } else {
            false
        }
    }

    pub fn refresh(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Completed stages count fully, the current stage counts half.
    pub fn progress(&self) -> f64 {
        if self.stages.is_empty() {
            return 0.0;
        }
        let completed = self
            .stages
            .iter()
            .filter(|stage| stage.status == StageStatus::Completed)
            .count() as f64;
        let current = if self.current_index().is_some() { 0.5 } else { 0.0 };
        (completed + current) / self.stages.len() as f64 * 100.0
    }

    pub fn is_completed(&self) -> bool {
        self.stages.iter().all(|stage| stage.status == StageStatus::Completed)
    }

    /// Whether ticking can still change anything
    pub fn can_advance(&self) -> bool {
        self.current_index().is_some_and(|index| index + 1 < self.stages.len())
    }

    /// Poll every `interval` until no further stage can advance, reporting each change.
    pub async fn follow(
        &mut self,
        interval: Duration,
        advance_probability: f64,
        mut on_update: impl FnMut(&TrackingTimeline),
    ) {
        let span = create_tracking_span(&self.transaction_id);
        async {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval fires immediately
            ticker.tick().await;
            while self.can_advance() {
                ticker.tick().await;
                let advanced = self.tick(&mut rand::rng(), advance_probability);
                self.refresh();
                if advanced {
                    on_update(self);
                }
            }
            tracing::info!(transaction_id = %self.transaction_id, "Tracking reached final stage");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_kyc_completed_and_processing_current() {
        let timeline = TrackingTimeline::new("TXN001");
        assert_eq!(timeline.stages.len(), 4);
        assert_eq!(timeline.stages[0].status, StageStatus::Completed);
        assert_eq!(timeline.current_index(), Some(1));
        assert_eq!(timeline.progress(), 37.5);
        assert!(!timeline.is_completed());
    }

    #[test]
    fn advance_promotes_next_stage() {
        let mut timeline = TrackingTimeline::new("TXN001");
        assert!(timeline.advance());
        assert_eq!(timeline.stages[1].status, StageStatus::Completed);
        assert!(timeline.stages[1].completed_at.is_some());
        assert_eq!(timeline.current_index(), Some(2));
        assert_eq!(timeline.progress(), 62.5);
    }

    #[test]
    fn last_stage_stays_current() {
        let mut timeline = TrackingTimeline::new("TXN001");
        assert!(timeline.advance());
        assert!(timeline.advance());
        assert!(!timeline.advance());
        assert_eq!(timeline.current_index(), Some(3));
        assert!(!timeline.can_advance());
        assert_eq!(timeline.progress(), 87.5);
    }

    #[test]
    fn tick_respects_probability() {
        let mut rng = rand::rng();
        let mut timeline = TrackingTimeline::new("TXN001");
        assert!(!timeline.tick(&mut rng, 0.0));
        assert_eq!(timeline.current_index(), Some(1));
        assert!(timeline.tick(&mut rng, 1.0));
        assert_eq!(timeline.current_index(), Some(2));
    }

    #[test]
    fn timeline_carries_transfer_summary() {
        let timeline = TrackingTimeline::new("TXN001");
        let details = &timeline.details;
        assert_eq!(details.amount, 5000);
        assert_eq!(details.currency, "USD");
        assert_eq!(details.fees, 25);
        assert_eq!(details.net_amount, 4975);
        assert_eq!(details.sender_name, "Global Tech Corp");
        assert_eq!(details.bank_account, "HDFC Bank - ***4521");
        assert!((details.net_amount_inr() - 414_168.75).abs() < 1e-6);

        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["details"]["purpose"], "Software Services");
        assert_eq!(json["details"]["net_amount"], 4975);
    }

    #[test]
    fn fees_never_underflow_net_amount() {
        let details = TransactionDetails::new(10, "USD", 25, 83.25, "A", "B", "C");
        assert_eq!(details.net_amount, 0);
    }

    #[test]
    fn tick_never_advances_on_nan_probability() {
        let mut rng = rand::rng();
        let mut timeline = TrackingTimeline::new("TXN001");
        assert!(!timeline.tick(&mut rng, f64::NAN));
        assert_eq!(timeline.current_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn follow_runs_until_final_stage() {
        let mut timeline = TrackingTimeline::new("TXN001");
        let mut updates = 0;
        let started = tokio::time::Instant::now();
        timeline
            .follow(Duration::from_secs(10), 1.0, |_| updates += 1)
            .await;
        assert_eq!(updates, 2);
        assert_eq!(timeline.current_index(), Some(3));
        assert!(started.elapsed() >= Duration::from_secs(20));
    }
}
