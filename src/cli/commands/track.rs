use anyhow::Result;
use kyc_wizard::config::TrackingConfig;
use kyc_wizard::tracking::{StageStatus, TrackingTimeline};

pub struct TrackCommand {
    pub transaction_id: String,
    pub follow: bool,
    pub json: bool,
}

impl TrackCommand {
    pub async fn execute(&self, config: &TrackingConfig) -> Result<()> {
        let mut timeline = TrackingTimeline::new(&self.transaction_id);
        self.show(&timeline)?;

        if self.follow {
            println!("🔄 Polling every {}s for updates...", config.tick_interval_seconds);
            timeline
                .follow(config.tick_interval(), config.advance_probability, |updated| {
                    if let Err(e) = self.show(updated) {
                        tracing::warn!(error = %e, "Failed to render timeline");
                    }
                })
                .await;
        }
        Ok(())
    }

    fn show(&self, timeline: &TrackingTimeline) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(timeline)?);
        } else {
            print_timeline(timeline);
        }
        Ok(())
    }
}

fn print_timeline(timeline: &TrackingTimeline) {
    println!();
    println!("📦 Transaction {} ({:.0}% complete)", timeline.transaction_id, timeline.progress());
    let details = &timeline.details;
    println!(
        "   💵 {} {} from {} to {} ({})",
        details.amount, details.currency, details.sender_name, details.bank_account, details.purpose
    );
    println!(
        "   Fees {} {} | Net {} {} | Rate {:.2} INR",
        details.fees, details.currency, details.net_amount, details.currency, details.exchange_rate_inr
    );
    for stage in &timeline.stages {
        let icon = match stage.status {
            StageStatus::Completed => "✅",
            StageStatus::Current => "⏳",
            StageStatus::Pending => "⚪",
            StageStatus::Failed => "❌",
        };
        println!("   {icon} {} - {}", stage.title, stage.description);
        if let Some(at) = stage.completed_at {
            println!("      completed {}", at.format("%Y-%m-%d %H:%M UTC"));
        } else if let Some(estimate) = &stage.estimated_time {
            println!("      estimated {estimate}");
        }
    }
    println!("   Last updated {}", timeline.last_updated.format("%H:%M:%S UTC"));
}
