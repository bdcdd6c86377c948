use anyhow::Result;
use clap::Parser;
use kyc_wizard::config::KycWizardConfig;
use kyc_wizard::telemetry::init_telemetry;
use kyc_wizard::wizard::WizardVariant;

mod cli;

use cli::commands::config::ConfigCommand;
use cli::commands::track::TrackCommand;
use cli::commands::wizard::WizardCommand;
use cli::{Cli, Commands, ConfigAction, WizardArgs};

fn load_config(path: Option<&str>) -> Result<KycWizardConfig> {
    match path {
        Some(path) => KycWizardConfig::load_from(path),
        None => Ok(kyc_wizard::config()?.clone()),
    }
}

fn wizard_command(variant: WizardVariant, args: WizardArgs, prefill: Vec<String>) -> WizardCommand {
    let mut command = WizardCommand::new(variant, args.transaction);
    command.prefill = prefill;
    command.outcome = args.outcome;
    command.delay_ms = args.delay_ms;
    command.json = args.json;
    command
}

fn login(json: bool, config: &KycWizardConfig) -> Result<()> {
    let mut command = WizardCommand::new(WizardVariant::Login, "");
    command.json = json;
    tokio::runtime::Runtime::new()?.block_on(async { command.execute(config).await })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    match cli.command {
        Some(Commands::Individual { wizard }) => {
            let command = wizard_command(WizardVariant::Individual, wizard, Vec::new());
            tokio::runtime::Runtime::new()?.block_on(async { command.execute(&config).await })
        }
        Some(Commands::Company { wizard, prefill }) => {
            let command = wizard_command(WizardVariant::Company, wizard, prefill);
            tokio::runtime::Runtime::new()?.block_on(async { command.execute(&config).await })
        }
        Some(Commands::Login { json }) => login(json, &config),
        // Default behavior: no subcommand starts at the login screen
        None => login(false, &config),
        Some(Commands::Track {
            transaction_id,
            follow,
            json,
        }) => {
            let command = TrackCommand {
                transaction_id,
                follow,
                json,
            };
            tokio::runtime::Runtime::new()?.block_on(async { command.execute(&config.tracking).await })
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => ConfigCommand::show(&config),
            ConfigAction::Init { path, force } => ConfigCommand::init(&path, force),
        },
    }
}
