//! Integration tests driving the pathrank binary.
//!
//! Each test points the platform data directory at a fresh temp dir so a
//! user's config file cannot change the results.

use std::fs;
use std::io::{Read, Write};
use std::path::{MAIN_SEPARATOR, Path};
use std::process::{Command, Output, Stdio};

use pathrank::api::MatchResponse;
use tempfile::TempDir;

fn pathrank(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pathrank"));
    cmd.env("HOME", home)
        .env("XDG_DATA_HOME", home)
        .env("APPDATA", home)
        .env("LOCALAPPDATA", home)
        .env_remove("PATHRANK_LOG");
    cmd
}

/// Run with `input` on stdin
fn run_with_stdin(cmd: &mut Command, input: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn pathrank");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input)
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for pathrank")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

const CANDIDATES: &[u8] = b"src/main.rs\nsrc/lib.rs\nREADME.md\nsrc/query/scorer.rs\n";

#[test]
fn ranks_stdin_candidates() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(
        pathrank(home.path()).args(["lib", "--color", "never"]),
        CANDIDATES,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output), vec!["src/lib.rs"]);
}

#[test]
fn empty_query_respects_limit() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(
        pathrank(home.path()).args(["--limit", "2", "--color", "never"]),
        CANDIDATES,
    );
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output), vec!["src/main.rs", "src/lib.rs"]);
}

#[test]
fn json_output_has_parallel_patterns() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(
        pathrank(home.path()).args(["sr", "--json", "--highlight", "basic"]),
        CANDIDATES,
    );
    assert!(output.status.success());

    let response: MatchResponse = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!response.matches.is_empty());
    assert_eq!(response.matches.len(), response.regexes.len());
    assert!(response.regexes.iter().all(|r| r.starts_with(r"\V\C\^")));
}

#[test]
fn debug_output_shows_scores() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(
        pathrank(home.path()).args(["main", "--debug", "--color", "never"]),
        CANDIDATES,
    );
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "src/main.rs");
    assert!(lines[1].contains("score:"));
    assert!(lines[1].contains("positions: [4, 5, 6, 7]"));
}

#[test]
fn walks_directory() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("a")).unwrap();
    fs::create_dir_all(root.path().join("b")).unwrap();
    fs::write(root.path().join("a").join("foo.rs"), "").unwrap();
    fs::write(root.path().join("b").join("bar.rs"), "").unwrap();

    let output = pathrank(home.path())
        .arg("bar")
        .arg("--walk")
        .arg(root.path())
        .args(["--color", "never"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output), vec![format!("b{MAIN_SEPARATOR}bar.rs")]);
}

#[test]
fn regex_mode_fails() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(pathrank(home.path()).args(["x", "--mode", "regex"]), CANDIDATES);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not supported"));
}

#[test]
fn serve_answers_framed_requests() {
    let home = TempDir::new().unwrap();
    let request = br#"{"version": 1, "items": ["src/lib.rs", "src/main.rs"], "query": "main"}"#;
    let mut input = (request.len() as u32).to_le_bytes().to_vec();
    input.extend_from_slice(request);

    let output = run_with_stdin(pathrank(home.path()).arg("serve"), &input);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut stdout = output.stdout.as_slice();
    let mut len = [0u8; 4];
    stdout.read_exact(&mut len).unwrap();
    let mut payload = vec![0u8; u32::from_le_bytes(len) as usize];
    stdout.read_exact(&mut payload).unwrap();
    assert!(stdout.is_empty());

    let response: MatchResponse = serde_json::from_slice(&payload).unwrap();
    assert_eq!(response.matches, vec!["src/main.rs"]);
}

#[test]
fn config_reports_defaults() {
    let home = TempDir::new().unwrap();
    let output = pathrank(home.path()).arg("config").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config file:"));
    assert!(stdout.contains("\"limit\": 20"));
}
