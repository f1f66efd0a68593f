//! End-to-end tests for the `lawkit` binary.

use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn lawkit(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_lawkit"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }
    child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_benford_file_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("amounts.json");
    std::fs::write(
        &path,
        r#"{"invoices": [1234.5, 187.2, 2901.0, 143.8, 1620.0, 118.4, 3305.9, 1411.0]}"#,
    )
    .unwrap();

    let output = lawkit(
        &["benf", path.to_str().unwrap(), "--format", "json", "--brief"],
        None,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let envelope = stdout_json(&output);
    assert_eq!(envelope["subcommand"], "benford");
    assert!(envelope["timestamp"].is_string());
    assert_eq!(envelope["results"][0]["type"], "BenfordAnalysis");
    assert_eq!(envelope["results"][0]["data"]["path"], "invoices");
    assert!(envelope["results"][0]["data"].get("observed_distribution").is_none());
}

#[test]
fn test_stdin_csv_as_text() {
    let output = lawkit(
        &["pareto", "-o", "pareto_ratio=0.2"],
        Some("900\n850\n30\n20\n15\n10\n8\n5\n4\n3\n"),
    );
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("ParetoAnalysis [default]"));
    assert!(!text.contains('\u{1b}'));
}

#[test]
fn test_generate_without_input() {
    let output = lawkit(
        &["generate", "--law", "poisson", "--count", "25", "--seed", "9", "-f", "json"],
        None,
    );
    assert!(output.status.success());

    let envelope = stdout_json(&output);
    let data = &envelope["results"][0]["data"];
    assert_eq!(data["data_type"], "poisson");
    assert_eq!(data["count"], 25);
    assert_eq!(data["seed"], 9);
}

#[test]
fn test_engine_errors_exit_with_one() {
    let output = lawkit(&["bogus", "-"], Some("[1, 2, 3]"));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown subcommand: bogus"));

    let output = lawkit(&["benford"], Some("[]"));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No valid numbers found"));
}

#[test]
fn test_usage_errors_exit_with_two() {
    let output = lawkit(&[], None);
    assert_eq!(output.status.code(), Some(2));

    let output = lawkit(&["benford", "-o", "missing-equals"], None);
    assert_eq!(output.status.code(), Some(2));
}
