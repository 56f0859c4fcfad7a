//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config file and
//! verify outputs.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(config: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_breakbell"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("BREAKBELL_LOG", "off")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_reminder_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let (code, stdout, _) = run_cli(
        &config,
        &["reminder", "add-interval", "Drink water", "--every", "30", "--id", "water"],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "water");

    let (code, stdout, _) = run_cli(&config, &["reminder", "list"]);
    assert_eq!(code, 0);
    let rows = parse_json(&stdout);
    assert_eq!(rows[0]["id"], "water");
    assert_eq!(rows[0]["total_time"], 1800);
    assert_eq!(rows[0]["type"], "interval");

    let (code, _, _) = run_cli(&config, &["reminder", "disable", "water"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&config, &["reminder", "list"]);
    assert_eq!(parse_json(&stdout)[0]["enabled"], false);

    let (code, _, _) = run_cli(&config, &["reminder", "remove", "water"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&config, &["reminder", "list"]);
    assert_eq!(parse_json(&stdout), serde_json::json!([]));
}

#[test]
fn test_reminder_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let (code, _, stderr) = run_cli(
        &config,
        &["reminder", "add-interval", "Broken", "--every", "0"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid interval"));

    let (code, _, _) = run_cli(
        &config,
        &["reminder", "add-once", "Late", "--at", "2001-01-01 09:00"],
    );
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(&config, &["reminder", "remove", "missing"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let (code, stdout, _) = run_cli(&config, &["config", "get", "main.interval_unit"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "minutes");

    let (code, _, _) = run_cli(&config, &["config", "set", "main.title", "Stretch"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&config, &["config", "get", "main.title"]);
    assert_eq!(stdout.trim(), "Stretch");

    let (code, _, _) = run_cli(&config, &["config", "get", "main.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_calendar_check_weekend_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (code, _, _) = run_cli(&config, &["config", "set", "calendar.work_mode", "weekend"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(&config, &["calendar", "check", "--at", "2024-06-03 10:00"]);
    assert_eq!(code, 0);
    let report = parse_json(&stdout);
    assert_eq!(report["active"], false);
    assert_eq!(report["work_day"], false);

    let (_, stdout, _) = run_cli(&config, &["calendar", "check", "--at", "2024-06-01 10:00"]);
    assert_eq!(parse_json(&stdout)["active"], true);
}

#[test]
fn test_status_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (code, stdout, _) = run_cli(&config, &["status"]);
    assert_eq!(code, 0);
    let status = parse_json(&stdout);
    assert_eq!(status["main"]["status"], "running");
    assert_eq!(status["main"]["total_time"], 2700);
}

#[test]
fn test_run_exits_and_reports_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (code, stdout, _) = run_cli(&config, &["run", "--exit-after", "1"]);
    assert_eq!(code, 0);
    let first = stdout.lines().next().expect("at least one event");
    let event = parse_json(first);
    assert_eq!(event["type"], "status_changed");
    assert_eq!(event["to"], "running");
}

#[test]
fn test_run_picks_up_concurrent_reminder_edits() {
    use std::io::Write;
    use std::time::Duration;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let (code, _, _) = run_cli(
        &config,
        &["reminder", "add-interval", "Drink water", "--every", "30", "--id", "water"],
    );
    assert_eq!(code, 0);

    let mut host = Command::new(env!("CARGO_BIN_EXE_breakbell"))
        .arg("--config")
        .arg(&config)
        .args(["run", "--exit-after", "4"])
        .env("BREAKBELL_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to start host");
    std::thread::sleep(Duration::from_millis(1000));

    let (code, _, _) = run_cli(
        &config,
        &["reminder", "add-interval", "Tea", "--every", "60", "--id", "tea"],
    );
    assert_eq!(code, 0);

    let mut stdin = host.stdin.take().unwrap();
    stdin.write_all(b"reload\nstatus\n").unwrap();
    stdin.flush().unwrap();

    let output = host.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let status = stdout
        .lines()
        .map(parse_json)
        .find(|line| line.get("reminders").is_some())
        .expect("status line");
    let ids: Vec<&str> = status["reminders"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids, ["water", "tea"]);

    // The host's own saves kept the edit.
    let (_, stdout, _) = run_cli(&config, &["reminder", "list"]);
    let rows = parse_json(&stdout);
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[1]["id"], "tea");
}
