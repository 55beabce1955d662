//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify exit codes and JSON output shapes.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "focusstreak-cli", "--"])
        .args(args)
        .env("FOCUSSTREAK_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_session_status() {
    let (stdout, _, code) = run_cli(&["session", "status"]);
    assert_eq!(code, 0, "Session status failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["sessionId"].is_string());
    assert!(parsed["remainingSecs"].is_u64());
}

#[test]
fn test_session_start_then_pause() {
    let (stdout, _, code) = run_cli(&["session", "start", "--title", "cli test"]);
    assert_eq!(code, 0, "Session start failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["status"].is_string());

    let (_, _, code) = run_cli(&["session", "pause"]);
    assert_eq!(code, 0, "Session pause failed");
}

#[test]
fn test_session_reset() {
    let (stdout, _, code) = run_cli(&["session", "reset"]);
    assert_eq!(code, 0, "Session reset failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["segmentIndex"], 0);
}

#[test]
fn test_streak_summary() {
    let (stdout, _, code) = run_cli(&["streak", "summary"]);
    assert_eq!(code, 0, "Streak summary failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["dailyStreak"].is_u64());
    assert!(parsed["dailyTargetMinutes"].is_u64());
}

#[test]
fn test_streak_process_today() {
    let (stdout, _, code) = run_cli(&["streak", "process-today", "--minutes", "0"]);
    assert_eq!(code, 0, "Streak process-today failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["success"], true);
}

#[test]
fn test_streak_monthly() {
    let (stdout, _, code) = run_cli(&["streak", "monthly"]);
    assert_eq!(code, 0, "Streak monthly failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.is_array());
}

#[test]
fn test_streak_monthly_invalid_month() {
    let (_, stderr, code) = run_cli(&["streak", "monthly", "--month", "13"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error"));
}

#[test]
fn test_config_show() {
    let (stdout, _, code) = run_cli(&["config", "show"]);
    assert_eq!(code, 0, "Config show failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["session"]["total_focus_duration"].is_u64());
}

#[test]
fn test_config_set() {
    let (stdout, _, code) = run_cli(&["config", "set", "--max-breaks", "3"]);
    assert_eq!(code, 0, "Config set failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["session"]["max_breaks"], 3);
}
