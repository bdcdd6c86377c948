// CLI integration tests - drive the binary with scripted terminal input

use assert_cmd::Command;
use predicates::prelude::*;

fn kyc_wizard() -> Command {
    let mut cmd = Command::cargo_bin("kyc-wizard").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn help_lists_wizards() {
    kyc_wizard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("individual"))
        .stdout(predicate::str::contains("company"))
        .stdout(predicate::str::contains("track"));
}

#[test]
fn individual_kyc_approved_goes_to_tracking() {
    kyc_wizard()
        .args(["individual", "--transaction", "TXN042", "--outcome", "approve", "--delay-ms", "0"])
        .write_stdin("abcde1234f\n1234 5678 9012\n123456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("PAN Verified"))
        .stdout(predicate::str::contains("Aadhaar Verified"))
        .stdout(predicate::str::contains("KYC Completed Successfully"))
        .stdout(predicate::str::contains("/tracking/TXN042"));
}

#[test]
fn short_pan_is_asked_again() {
    kyc_wizard()
        .args(["individual", "--outcome", "approve", "--delay-ms", "0"])
        .write_stdin("ABCDE1234\nABCDE1234F\n123456789012\n123456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please check: PAN Card Number"))
        .stdout(predicate::str::contains("PAN Verified"));
}

#[test]
fn rejected_verification_can_be_abandoned() {
    kyc_wizard()
        .args(["individual", "--outcome", "reject", "--delay-ms", "0", "--json"])
        .write_stdin("ABCDE1234F\n123456789012\n123456\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("KYC Verification Failed"))
        .stdout(predicate::str::contains("/dashboard"))
        .stdout(predicate::str::contains("\"closed\": true"));
}

#[test]
fn retry_after_rejection_starts_over_at_pan() {
    kyc_wizard()
        .args(["individual", "--outcome", "reject", "--delay-ms", "0"])
        .write_stdin("ABCDE1234F\n123456789012\n123456\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("KYC Verification Failed"))
        .stdout(predicate::function(|out: &str| out.matches("📝 PAN Verification (20%)").count() == 2).from_utf8())
        .stdout(predicate::str::contains("Input closed"))
        .stdout(predicate::str::contains("/tracking/").not());
}

#[test]
fn back_command_returns_to_previous_step() {
    kyc_wizard()
        .args(["individual", "--outcome", "approve", "--delay-ms", "0"])
        .write_stdin("ABCDE1234F\n:back\nABCDE1234F\n")
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| out.matches("📝 PAN Verification").count() == 2).from_utf8())
        .stdout(predicate::function(|out: &str| out.matches("📝 Aadhaar Number").count() == 2).from_utf8());
}

#[test]
fn back_command_on_first_step_leaves_wizard() {
    kyc_wizard()
        .args(["individual"])
        .write_stdin(":back\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Navigating to /dashboard"))
        .stdout(predicate::str::contains("Input closed").not());
}

#[test]
fn mismatch_command_is_company_only() {
    kyc_wizard()
        .args(["company", "--prefill", "company_pan=AAACB1234C"])
        .write_stdin(":mismatch\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report a Mismatch"))
        .stdout(predicate::str::contains("Contact support before continuing"));

    kyc_wizard()
        .args(["individual"])
        .write_stdin(":mismatch\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("has no mismatch report"))
        .stdout(predicate::str::contains("Report a Mismatch").not());
}

#[test]
fn company_prefill_skips_read_only_prompts() {
    kyc_wizard()
        .args([
            "company",
            "--transaction",
            "TXN007",
            "--outcome",
            "approve",
            "--delay-ms",
            "0",
            "--prefill",
            "company_pan=AAACB1234C",
            "--prefill",
            "signatory_aadhaar=123456789012",
        ])
        .write_stdin("27AAACB1234C1Z5\nL12345MH2020PLC123456\nABCDE1234F\nn\ny\n654321\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("AAACB1234C (pre-verified)"))
        .stdout(predicate::str::contains("Signatory Details Verified"))
        .stdout(predicate::str::contains("Company KYC Completed Successfully"))
        .stdout(predicate::str::contains("/tracking/TXN007"));
}

#[test]
fn prefill_outside_allow_list_fails() {
    kyc_wizard()
        .args(["company", "--prefill", "gst=27AAACB1234C1Z5"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be prefilled"));
}

#[test]
fn login_lands_on_dashboard() {
    kyc_wizard()
        .arg("login")
        .write_stdin("9876543210\n123456\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Verification code sent to 9876543210"))
        .stdout(predicate::str::contains("Login Successful"))
        .stdout(predicate::str::contains("/dashboard"));
}

#[test]
fn closed_input_leaves_wizard() {
    kyc_wizard()
        .args(["individual"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Input closed"));
}

#[test]
fn track_prints_timeline_json() {
    kyc_wizard()
        .args(["track", "TXN001", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transaction_id\": \"TXN001\""))
        .stdout(predicate::str::contains("\"status\": \"current\""))
        .stdout(predicate::str::contains("\"net_amount\": 4975"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kyc-wizard.toml");
    let path = path.to_str().unwrap();

    kyc_wizard().args(["config", "init", "--path", path]).assert().success();
    kyc_wizard()
        .args(["config", "init", "--path", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    kyc_wizard()
        .args(["--config", path, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success_probability = 0.75"));
}
