//! CLI Integration Tests
//!
//! These tests run the `firewatch` binary. Everything that needs a backend
//! uses `--demo`, so no network access is required.
//!
//! ```
//! cargo test --package firewatch-cli --test cli_integration
//! ```

use std::process::{Command, Output};

/// Run firewatch with an isolated config directory.
fn run_firewatch(args: &[&str]) -> (Output, tempfile::TempDir) {
    let home = tempfile::tempdir().expect("Failed to create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_firewatch"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("FIREWATCH_API_URL")
        .env_remove("FIREWATCH_POLL_INTERVAL_MS")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run firewatch binary");
    (output, home)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let (output, _home) = run_firewatch(&["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = stdout(&output);
    assert!(stdout.contains("firewatch"), "Help should mention firewatch");
    for cmd in ["watch", "status", "thresholds", "config", "completions"] {
        assert!(stdout.contains(cmd), "Help should list {} command", cmd);
    }
}

#[test]
fn test_version_command() {
    let (output, _home) = run_firewatch(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains("firewatch"));
}

#[test]
fn test_subcommand_help() {
    for cmd in ["watch", "status", "thresholds", "config"] {
        let (output, _home) = run_firewatch(&[cmd, "--help"]);
        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(!stdout(&output).is_empty(), "{} --help should produce output", cmd);
    }
}

#[test]
fn test_completions_bash() {
    let (output, _home) = run_firewatch(&["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("firewatch"));
}

// =============================================================================
// Config Commands
// =============================================================================

#[test]
fn test_config_path() {
    let (output, _home) = run_firewatch(&["config", "path"]);

    assert!(output.status.success(), "Config path should succeed");
    let stdout = stdout(&output);
    assert!(stdout.contains("firewatch"), "Should show config path");
    assert!(stdout.trim_end().ends_with("config.toml"));
}

#[test]
fn test_config_show_defaults_as_json() {
    let (output, _home) = run_firewatch(&["config", "show", "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("config show --json should be JSON");
    assert_eq!(value["api_url"], "http://localhost:8000");
    assert_eq!(value["poll_interval_ms"], 3000);
}

// =============================================================================
// Demo Backend
// =============================================================================

#[test]
fn test_demo_status_json() {
    let (output, _home) = run_firewatch(&["--demo", "status", "--json", "--compact"]);

    assert!(output.status.success(), "Demo status should succeed");
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("status --json should be JSON");
    assert!(value["reading"]["temperature"].is_number());
    assert_eq!(value["thresholds_confirmed"], true);
    assert!(
        value["media"]["photo_url"]
            .as_str()
            .unwrap()
            .starts_with("http://demo.firewatch.local/")
    );
}

#[test]
fn test_demo_status_text() {
    let (output, _home) = run_firewatch(&["--demo", "--no-color", "status"]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Temperature:"));
    assert!(stdout.contains("Fire:         Safe"));
}

#[test]
fn test_demo_thresholds_set() {
    let (output, _home) = run_firewatch(&[
        "--demo",
        "--no-color",
        "thresholds",
        "set",
        "--gas-max",
        "250",
    ]);

    assert!(output.status.success(), "thresholds set should succeed");
    assert!(stdout(&output).contains("Gas max:          250 ppm"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Thresholds updated"));
}

#[test]
fn test_thresholds_set_without_values_fails() {
    let (output, _home) = run_firewatch(&["--demo", "thresholds", "set"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nothing to change"));
}

#[test]
fn test_invalid_api_url_fails() {
    let (output, _home) = run_firewatch(&["--api-url", "ftp://nowhere", "status"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid backend URL"));
}
