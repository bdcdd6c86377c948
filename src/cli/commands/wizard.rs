use anyhow::{anyhow, Result};
use kyc_wizard::config::KycWizardConfig;
use kyc_wizard::wizard::definition::FieldKind;
use kyc_wizard::wizard::input::parse_flag;
use kyc_wizard::wizard::{
    Collaborators, FixedOutcome, Prefill, RandomOutcome, TransitionResult, VerificationOutcome,
    VerificationOutcomeProvider, WizardDefinition, WizardSession, WizardStep, WizardVariant,
};
use std::sync::Arc;

use super::{prompt, stdin_lines, ConsoleNavigator, ConsoleNotifier, InputLines};
use crate::cli::OutcomeChoice;

pub struct WizardCommand {
    pub variant: WizardVariant,
    pub transaction_id: String,
    pub prefill: Vec<String>,
    pub outcome: OutcomeChoice,
    pub delay_ms: Option<u64>,
    pub json: bool,
}

enum LineAction {
    Continue,
    Restart,
    Closed,
}

impl WizardCommand {
    pub fn new(variant: WizardVariant, transaction_id: impl Into<String>) -> Self {
        Self {
            variant,
            transaction_id: transaction_id.into(),
            prefill: Vec::new(),
            outcome: OutcomeChoice::Random,
            delay_ms: None,
            json: false,
        }
    }

    fn definition(&self, config: &KycWizardConfig) -> WizardDefinition {
        let mut settings = config.verification.clone();
        if let Some(delay_ms) = self.delay_ms {
            settings.individual.delay_ms = delay_ms;
            settings.company.delay_ms = delay_ms;
        }
        WizardDefinition::for_variant(self.variant, &settings)
    }

    fn outcomes(&self, definition: &WizardDefinition) -> Arc<dyn VerificationOutcomeProvider> {
        match self.outcome {
            OutcomeChoice::Approve => Arc::new(FixedOutcome(VerificationOutcome::Approved)),
            OutcomeChoice::Reject => Arc::new(FixedOutcome(VerificationOutcome::Rejected)),
            OutcomeChoice::Random => Arc::new(RandomOutcome::new(
                definition
                    .verification
                    .as_ref()
                    .map_or(1.0, |policy| policy.success_probability),
            )),
        }
    }

    pub async fn execute(&self, config: &KycWizardConfig) -> Result<()> {
        let definition = self.definition(config);
        let prefill = parse_prefill(&self.prefill)?;
        let collaborators = Collaborators {
            navigator: Arc::new(ConsoleNavigator),
            notifier: Arc::new(ConsoleNotifier),
            outcomes: self.outcomes(&definition),
        };

        println!("🪪 {} - transaction {}", definition.title, self.transaction_id);
        println!("   Commands: :back  :exit  :state  :mismatch");

        let mut session = WizardSession::new(definition, &self.transaction_id, &prefill, collaborators)?;
        let mut lines = stdin_lines();
        run_session(&mut session, &mut lines).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        Ok(())
    }
}

/// Drive a session from terminal input until it finishes or input closes.
async fn run_session(session: &mut WizardSession, lines: &mut InputLines) -> Result<()> {
    'wizard: loop {
        if session.is_closed() {
            return Ok(());
        }
        match session.step() {
            WizardStep::Collect(index) => {
                let Some(step) = session.definition().step(index).cloned() else {
                    return Err(anyhow!("wizard has no step {index}"));
                };
                let snapshot = session.snapshot();
                println!();
                println!("📝 {} ({}%)", step.label, snapshot.progress);

                for spec in &step.fields {
                    let fields = session.fields();
                    if fields.is_prefilled(spec.key) {
                        let value = fields.text(spec.key).unwrap_or_default();
                        println!("   🔒 {}: {} (pre-verified)", spec.label, value);
                        continue;
                    }
                    let message = format!("   {} [{}]: ", spec.label, spec.constraint.describe());
                    let line = loop {
                        let Some(line) = prompt(lines, &message).await? else {
                            println!("⚠️  Input closed, leaving wizard");
                            session.exit();
                            return Ok(());
                        };
                        if let Some(command) = line.strip_prefix(':') {
                            match handle_command(session, command) {
                                LineAction::Continue => continue,
                                LineAction::Restart | LineAction::Closed => continue 'wizard,
                            }
                        }
                        break line;
                    };

                    let result = match spec.kind {
                        FieldKind::Text => session.type_into(spec.key, &line),
                        FieldKind::Flag => match parse_flag(&line) {
                            Some(flag) => session.set_flag(spec.key, flag),
                            None => {
                                println!("   ⚠️  Answer y or n; treating '{line}' as no");
                                session.set_flag(spec.key, false)
                            }
                        },
                    };
                    if let Err(e) = result {
                        println!("   ⚠️  {e}");
                    }
                }

                if let TransitionResult::Rejected { failed_fields, .. } = session.submit() {
                    let labels: Vec<&str> = failed_fields
                        .iter()
                        .filter_map(|key| session.definition().field(key))
                        .map(|spec| spec.label)
                        .collect();
                    println!("   ❌ Please check: {}", labels.join(", "));
                }
            }
            WizardStep::Verifying => {
                println!();
                println!("⏳ Verifying your details...");
                if session.wait_for_verification().await.is_none() {
                    return Err(anyhow!("verification was not scheduled"));
                }
            }
            WizardStep::Succeeded => {
                println!();
                println!("🎉 {} verification successful!", session.definition().title);
                return Ok(());
            }
            WizardStep::Failed => {
                println!();
                let Some(line) = prompt(lines, "🔁 Verification failed. Try again? [y/n]: ").await? else {
                    session.exit();
                    return Ok(());
                };
                let answer = line.trim_start_matches(':');
                if answer == "retry" || parse_flag(answer) == Some(true) {
                    session.retry();
                } else {
                    session.exit();
                }
            }
        }
    }
}

fn handle_command(session: &mut WizardSession, command: &str) -> LineAction {
    match command.trim() {
        "back" => {
            session.back();
            if session.is_closed() {
                LineAction::Closed
            } else {
                LineAction::Restart
            }
        }
        "exit" | "quit" => {
            session.exit();
            LineAction::Closed
        }
        "state" => {
            match serde_json::to_string_pretty(&session.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("   ⚠️  {e}"),
            }
            LineAction::Continue
        }
        "mismatch" => {
            match session.toggle_mismatch_report() {
                Ok(true) => println!("   📞 Details wrong? Contact support before continuing."),
                Ok(false) => println!("   Mismatch panel closed"),
                Err(e) => println!("   ⚠️  {e}"),
            }
            LineAction::Continue
        }
        other => {
            println!("   ⚠️  Unknown command :{other}");
            LineAction::Continue
        }
    }
}

/// Parse `KEY=VALUE` pairs; `true`/`false` become flags.
pub fn parse_prefill(pairs: &[String]) -> Result<Prefill> {
    let mut prefill = Prefill::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("prefill '{pair}' must look like KEY=VALUE"))?;
        let value = match value.trim() {
            "true" => true.into(),
            "false" => false.into(),
            text => text.into(),
        };
        prefill.insert(key.trim().to_string(), value);
    }
    Ok(prefill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_wizard::wizard::FieldValue;

    #[test]
    fn parses_prefill_pairs() {
        let prefill = parse_prefill(&[
            "company_pan=AAACB1234C".to_string(),
            "signatory_aadhaar = 123456789012".to_string(),
        ])
        .unwrap();
        assert_eq!(prefill.get("company_pan"), Some(&FieldValue::Text("AAACB1234C".to_string())));
        assert_eq!(
            prefill.get("signatory_aadhaar"),
            Some(&FieldValue::Text("123456789012".to_string()))
        );
        assert!(parse_prefill(&["company_pan".to_string()]).is_err());
    }

    #[test]
    fn delay_override_applies_to_definition() {
        let mut command = WizardCommand::new(WizardVariant::Company, "TXN002");
        command.delay_ms = Some(0);
        let definition = command.definition(&KycWizardConfig::default());
        assert_eq!(
            definition.verification.map(|policy| policy.delay),
            Some(std::time::Duration::ZERO)
        );
    }
}
