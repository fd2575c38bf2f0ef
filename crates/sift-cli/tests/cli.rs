use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn sift(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sift"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn parse_recovers_fenced_response() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.txt");
    write(
        &raw,
        "Review of {file}:\n```json\n{\"issues\": [{\"title\": \"Leak\", \"severity\": \"high\", \"line\": 0},]}\n```",
    );

    let out = sift(&["parse", raw.to_str().unwrap()]);
    assert!(out.status.success());

    let json: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["strategy"], "fenced");
    assert_eq!(json["result"]["issues"][0]["title"], "Leak");
    assert_eq!(json["result"]["issues"][0]["line"], Value::Null);
}

#[test]
fn parse_reports_truncation() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.txt");
    write(&raw, "```json\n");

    let out = sift(&["parse", raw.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("token limit"), "{stderr}");
}

#[test]
fn scan_replays_recorded_responses() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("repo");
    let responses = dir.path().join("responses");
    write(&src.join("src/a.rs"), "fn a() {}\nfn b() {}\n");
    write(&src.join("src/c.rs"), "fn c() {}\n");
    write(
        &responses.join("src/a.rs.txt"),
        r#"{"issues": [{"title": "Dead code", "severity": "low"}, {"title": "Naming"}]}"#,
    );

    let out = sift(&[
        "scan",
        "--dir",
        src.to_str().unwrap(),
        "--responses",
        responses.to_str().unwrap(),
        "--delay-ms",
        "0",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["job"]["status"], "completed");
    assert_eq!(report["job"]["scanned_files"], 1);
    assert_eq!(report["job"]["failed_files"], 1);
    assert_eq!(report["job"]["total_lines"], 2);
    assert_eq!(report["job"]["quality_score"], 96.0);
    assert_eq!(report["failures"][0]["path"], "src/c.rs");
    assert_eq!(report["failures"][0]["kind"], "analyzer");
    assert_eq!(report["issues"].as_array().unwrap().len(), 2);
}

#[test]
fn scan_rejects_missing_directory() {
    let out = sift(&["scan", "--dir", "/nonexistent/repo", "--responses", "/nonexistent/r"]);
    assert_eq!(out.status.code(), Some(2));
}
