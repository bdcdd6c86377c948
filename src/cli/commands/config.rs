use anyhow::{bail, Result};
use kyc_wizard::config::KycWizardConfig;
use std::path::Path;

pub struct ConfigCommand;

impl ConfigCommand {
    pub fn show(config: &KycWizardConfig) -> Result<()> {
        print!("{}", toml::to_string_pretty(config)?);
        Ok(())
    }

    pub fn init(path: &str, force: bool) -> Result<()> {
        if Path::new(path).exists() && !force {
            bail!("{path} already exists; pass --force to overwrite it");
        }
        KycWizardConfig::default().save_to_file(path)?;
        println!("✅ Wrote default configuration to {path}");
        Ok(())
    }
}
