use clap::{Parser, Subcommand, ValueEnum};

pub mod commands;

#[derive(Parser)]
#[command(name = "kyc-wizard")]
#[command(about = "Simulated KYC verification wizards for fund transfers")]
#[command(long_about = "Walks through the login, individual KYC and company KYC flows in the terminal. \
                       Verification is simulated: outcomes are drawn at random after a fixed delay. \
                       Type ':back', ':exit', ':state' or ':mismatch' at any prompt.")]
pub struct Cli {
    /// Configuration file to use instead of kyc-wizard.toml
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify an individual with PAN, Aadhaar and an Aadhaar OTP
    Individual {
        #[command(flatten)]
        wizard: WizardArgs,
    },
    /// Verify a company, its authorized signatory and the signatory's Aadhaar OTP
    Company {
        #[command(flatten)]
        wizard: WizardArgs,
        /// Pre-verified values (KEY=VALUE); only company_pan and signatory_aadhaar are accepted
        #[arg(long, value_name = "KEY=VALUE", help = "Pre-verified field, shown read-only")]
        prefill: Vec<String>,
    },
    /// Sign in with a mobile number and a one-time code
    Login {
        /// Print the final session state as JSON
        #[arg(long, help = "Print the final session snapshot as JSON")]
        json: bool,
    },
    /// Show the tracking timeline of a transaction
    Track {
        /// Transaction identifier
        transaction_id: String,
        /// Keep polling until the last stage is reached
        #[arg(long, help = "Poll for updates until the final stage is current")]
        follow: bool,
        /// Print the timeline as JSON
        #[arg(long, help = "Print the timeline as JSON")]
        json: bool,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct WizardArgs {
    /// Transaction the verification belongs to
    #[arg(long, short = 't', default_value = "TXN001", help = "Transaction identifier passed to tracking")]
    pub transaction: String,
    /// How the simulated verification decides
    #[arg(long, value_enum, default_value = "random", help = "Force the verification outcome")]
    pub outcome: OutcomeChoice,
    /// Override the configured verification delay
    #[arg(long, help = "Verification delay in milliseconds")]
    pub delay_ms: Option<u64>,
    /// Print the final session state as JSON
    #[arg(long, help = "Print the final session snapshot as JSON")]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeChoice {
    Random,
    Approve,
    Reject,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to a file
    Init {
        #[arg(long, default_value = "kyc-wizard.toml", help = "Where to write the configuration")]
        path: String,
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}
