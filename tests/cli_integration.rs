// CLI integration tests for cobol-to-json.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cobol-to-json"))
}

fn spec(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("specs").join(name)
}

fn parse_json(text: &str) -> Value {
    serde_json::from_str(text).expect("valid json")
}

#[test]
fn converts_to_stdout() {
    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer.data"))
        .output()
        .expect("run");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = std::str::from_utf8(&out.stdout).expect("utf8");
    let json = parse_json(stdout);
    let records = json.as_array().expect("array");
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["customer_id"], 101);
    assert_eq!(records[0]["customer_name"], "Alice Smith");
    assert_eq!(records[0]["account_balance"], "150.75");
    assert_eq!(records[1]["account_balance"], "99.00");
    assert_eq!(records[4]["account_balance"], "-421.00");

    // Keys appear in layout order, not sorted.
    let positions: Vec<usize> = ["customer_id", "customer_name", "account_balance", "status_code"]
        .iter()
        .map(|key| stdout.find(&format!("\"{key}\"")).expect("key present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

#[test]
fn writes_output_and_error_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = temp.path().join("out").join("customers.json");
    let report = temp.path().join("errors.json");

    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer-mixed.data"))
        .args(["--on-error", "collect", "--compact"])
        .arg("-o")
        .arg(&output)
        .arg("--errors")
        .arg(&report)
        .output()
        .expect("run");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());

    let records = parse_json(&fs::read_to_string(&output).expect("output"));
    // Without processors, only the malformed id and the short line fail.
    assert_eq!(records.as_array().expect("array").len(), 4);

    let errors = parse_json(&fs::read_to_string(&report).expect("report"));
    let errors = errors.as_array().expect("array");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["line_number"], 2);
    assert_eq!(errors[1]["line_number"], 5);
    assert!(
        errors[1]["error"]
            .as_str()
            .expect("str")
            .contains("expected 41, got 40")
    );
}

#[test]
fn aborts_on_first_bad_line() {
    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer-mixed.data"))
        .output()
        .expect("run");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 2"), "{stderr}");
    assert!(stderr.contains("customer_id"), "{stderr}");
}

#[test]
fn skip_policy_drops_bad_lines() {
    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer-mixed.data"))
        .args(["--on-error", "skip"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let json = parse_json(std::str::from_utf8(&out.stdout).expect("utf8"));
    assert_eq!(json.as_array().expect("array").len(), 4);
}

#[test]
fn rejects_malformed_layout() {
    let temp = tempfile::tempdir().expect("tempdir");
    let layout = temp.path().join("bad.json");
    fs::write(
        &layout,
        r#"{ "fields": [ { "name": "id", "start_pos": 1, "kind": "Numeric" } ] }"#,
    )
    .expect("write layout");

    let out = cmd()
        .arg(&layout)
        .arg(spec("customer.data"))
        .output()
        .expect("run");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("malformed layout"), "{stderr}");
    assert!(stderr.contains("'length'"), "{stderr}");
}

#[test]
fn reports_missing_input() {
    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("does-not-exist.data"))
        .output()
        .expect("run");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("does-not-exist.data"));
}

#[test]
fn warns_when_error_report_cannot_be_written() {
    let temp = tempfile::tempdir().expect("tempdir");
    let report = temp.path().join("errors.json");

    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer-mixed.data"))
        .args(["--on-error", "skip"])
        .arg("--errors")
        .arg(&report)
        .output()
        .expect("run");
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--errors has no effect"), "{stderr}");
    assert!(!report.exists());
}

#[test]
fn logs_each_collected_error_without_report() {
    let out = cmd()
        .arg(spec("customer.layout.json"))
        .arg(spec("customer-mixed.data"))
        .args(["--on-error", "collect"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 2:"), "{stderr}");
    assert!(stderr.contains("line 5:"), "{stderr}");
}
