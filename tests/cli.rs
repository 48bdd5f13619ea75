use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn sheet_sync(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sheet_sync"));
    cmd.args(args).env("RUST_LOG", "info");
    for key in ["SHEET_SOURCE_URL", "SHEET_COLLECTION", "SHEET_STORE", "SHEET_SQLITE_PATH"] {
        cmd.env_remove(key);
    }
    cmd.envs(envs.iter().copied());
    cmd.output().unwrap()
}

#[test]
fn dry_run_stdout_is_json_lines() {
    let input = fixture("sheet.html");
    let out = sheet_sync(&["--dry-run", "--input", input.to_str().unwrap()], &[]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 7);
    for line in lines {
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(record.get("topic").is_some(), "not a record: {}", line);
    }

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Extracted 7 problems"));
    assert!(stderr.contains("7 problems extracted (dry run)."));
}

#[test]
fn unreachable_source_exits_non_zero() {
    let out = sheet_sync(
        &["--dry-run", "--url", "http://127.0.0.1:1/sheet"],
        &[("SHEET_FETCH_TIMEOUT_SECS", "5")],
    );
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("127.0.0.1:1"));
}

#[test]
fn sqlite_run_prints_summary() {
    let dir = std::env::temp_dir().join(format!("sheet_sync_cli_{}", std::process::id()));
    let db = dir.join("sheet.sqlite");
    let input = fixture("sheet.html");
    let out = sheet_sync(
        &["--store", "sqlite", "--input", input.to_str().unwrap()],
        &[("SHEET_SQLITE_PATH", db.to_str().unwrap())],
    );
    let _ = std::fs::remove_dir_all(&dir);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().next(), Some("7 problems inserted into SQLite (0 removed)."));
}
