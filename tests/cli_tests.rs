//! Smoke tests for the calculator CLI.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_sampling_plan_outputs_plan_json() {
    let mut cmd = Command::cargo_bin("certflow").unwrap();
    cmd.args(["sampling-plan", "--total-sites", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"minimum_sites\": 5"));
}

#[test]
fn test_sampling_plan_applies_capped_adjustments() {
    let mut cmd = Command::cargo_bin("certflow").unwrap();
    cmd.args([
        "sampling-plan",
        "--total-sites",
        "100",
        "--high-risk-sites",
        "10",
        "--previous-findings",
        "5",
        "--scope-variation",
        "moderate",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"minimum_sites\": 12"));
}

#[test]
fn test_duration_check_reports_compliance() {
    let mut cmd = Command::cargo_bin("certflow").unwrap();
    cmd.args([
        "duration-check",
        "--planned-hours",
        "32",
        "--employees",
        "15",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"severity\": \"compliant\""));
}

#[test]
fn test_duration_check_flags_critical_shortfall() {
    let mut cmd = Command::cargo_bin("certflow").unwrap();
    cmd.args([
        "duration-check",
        "--planned-hours",
        "10",
        "--employees",
        "15",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"severity\": \"critical\""));
}

#[test]
fn test_missing_required_argument_fails() {
    let mut cmd = Command::cargo_bin("certflow").unwrap();
    cmd.arg("sampling-plan").assert().failure();
}
