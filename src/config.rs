use anyhow::{ensure, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the KYC wizard
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KycWizardConfig {
    /// Simulated verification settings per wizard variant
    pub verification: VerificationSettings,
    /// Transaction tracking simulation
    pub tracking: TrackingConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VerificationSettings {
    pub individual: VariantVerification,
    pub company: VariantVerification,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VariantVerification {
    /// Delay before the simulated check resolves
    pub delay_ms: u64,
    /// Probability that the simulated check approves, in [0, 1]
    pub success_probability: f64,
}

impl VariantVerification {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackingConfig {
    /// Polling interval of the tracking timeline
    pub tick_interval_seconds: u64,
    /// Chance that the current stage completes on one tick
    pub advance_probability: f64,
}

impl TrackingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON instead of human-readable logs
    pub json_logs: bool,
}

impl Default for KycWizardConfig {
    fn default() -> Self {
        Self {
            verification: VerificationSettings {
                individual: VariantVerification {
                    delay_ms: 3000,
                    success_probability: 0.70,
                },
                company: VariantVerification {
                    delay_ms: 4000,
                    success_probability: 0.75,
                },
            },
            tracking: TrackingConfig {
                tick_interval_seconds: 10,
                advance_probability: 0.2,
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
            },
        }
    }
}

impl KycWizardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (kyc-wizard.toml, .kyc-wizard-rc)
    /// 3. Environment variables (prefixed with KYC_WIZARD__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("kyc-wizard.toml").exists() {
            builder = builder.add_source(File::with_name("kyc-wizard"));
        }

        if Path::new(".kyc-wizard-rc").exists() {
            builder = builder.add_source(File::with_name(".kyc-wizard-rc").format(config::FileFormat::Toml));
        }

        builder = builder.add_source(Self::environment());

        let config: KycWizardConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, still honoring environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: KycWizardConfig = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix("KYC_WIZARD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, variant) in [
            ("individual", &self.verification.individual),
            ("company", &self.verification.company),
        ] {
            ensure!(
                (0.0..=1.0).contains(&variant.success_probability),
                "verification.{name}.success_probability must be within [0, 1], got {}",
                variant.success_probability
            );
        }
        ensure!(
            (0.0..=1.0).contains(&self.tracking.advance_probability),
            "tracking.advance_probability must be within [0, 1], got {}",
            self.tracking.advance_probability
        );
        ensure!(
            self.tracking.tick_interval_seconds > 0,
            "tracking.tick_interval_seconds must be positive"
        );
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<KycWizardConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = KycWizardConfig::load_env_file();
        KycWizardConfig::load()
    });

/// Clamp a probability into [0, 1]; non-finite values never succeed.
pub fn unit_probability(probability: f64) -> f64 {
    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Get the global configuration
pub fn config() -> Result<&'static KycWizardConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
