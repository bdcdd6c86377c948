// Configuration loading: defaults, file overrides and environment overrides

use kyc_wizard::config::KycWizardConfig;
use std::io::Write;
use tempfile::NamedTempFile;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let file = toml_file(
        r#"
[verification.individual]
delay_ms = 500
success_probability = 0.9
"#,
    );

    let config = KycWizardConfig::load_from(file.path()).unwrap();
    assert_eq!(config.verification.individual.delay_ms, 500);
    assert_eq!(config.verification.individual.success_probability, 0.9);
    assert_eq!(config.verification.company, KycWizardConfig::default().verification.company);
    assert_eq!(config.tracking, KycWizardConfig::default().tracking);
}

#[test]
fn invalid_probability_is_rejected() {
    let file = toml_file(
        r#"
[tracking]
advance_probability = 2.0
"#,
    );
    assert!(KycWizardConfig::load_from(file.path()).is_err());
}

#[test]
fn environment_overrides_file() {
    let file = toml_file(
        r#"
[observability]
log_level = "debug"
"#,
    );
    std::env::set_var("KYC_WIZARD__VERIFICATION__COMPANY__DELAY_MS", "1234");
    let config = KycWizardConfig::load_from(file.path());
    std::env::remove_var("KYC_WIZARD__VERIFICATION__COMPANY__DELAY_MS");

    let config = config.unwrap();
    assert_eq!(config.verification.company.delay_ms, 1234);
    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn saved_defaults_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kyc-wizard.toml");
    KycWizardConfig::default().save_to_file(&path).unwrap();

    let loaded = KycWizardConfig::load_from(&path).unwrap();
    assert_eq!(loaded, KycWizardConfig::default());
}
