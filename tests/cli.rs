//! Integration tests for the tripplan binary

use std::io::Write;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run the binary against a fresh offline config
fn tripplan(args: &[&str]) -> (Output, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        "mode = \"offline\"\n\n[cache]\nlocation = \"{}\"\n\n[logging]\nlevel = \"warn\"",
        dir.path().join("cache").display()
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tripplan"))
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env_remove("TRIPPLAN_MODE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute tripplan");
    (output, dir)
}

#[test]
fn test_help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_tripplan"))
        .arg("--help")
        .output()
        .expect("Failed to execute tripplan");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("routes"));
}

#[test]
fn test_routes_command_lists_the_catalog() {
    let (output, _dir) = tripplan(&["routes"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("classic"));
    assert!(stdout.contains("north-loop"));
}

#[test]
fn test_plan_command_prints_json() {
    let (output, _dir) = tripplan(&[
        "plan",
        "--start",
        "Denver, CO",
        "--from",
        "2025-07-01",
        "--to",
        "2025-08-31",
        "--days",
        "6",
        "--json",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["route"]["status"], "succeeded");
    assert_eq!(plan["weather"]["status"], "succeeded");
    assert_eq!(plan["dining"]["status"], "succeeded");
    assert_eq!(plan["state_history"].as_array().unwrap().last().unwrap(), "complete");
}

#[test]
fn test_plan_command_prints_a_readable_plan() {
    let (output, _dir) = tripplan(&[
        "plan", "--start", "Gardiner, MT", "--from", "2025-09-01", "--to", "2025-09-20", "--days",
        "3", "--route", "north-loop",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Trip from Gardiner, MT"));
}

#[test]
fn test_narrow_window_exits_with_failure() {
    let (output, _dir) = tripplan(&[
        "plan",
        "--start",
        "Denver, CO",
        "--from",
        "2025-07-01",
        "--to",
        "2025-07-02",
        "--days",
        "6",
        "--json",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let failure: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(failure["status"], "failed");
    assert_eq!(failure["code"], "no_feasible_window");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_tripplan"))
        .args(["--config", "/nonexistent/tripplan.toml", "routes"])
        .output()
        .expect("Failed to execute tripplan");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}
