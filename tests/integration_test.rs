//! End-to-end tests driving the hooks the way the agent runner does.

use ralph_gate::cli::{run_with, CliOutput, Command};
use ralph_gate::config::HookSettings;
use ralph_gate::state::FileStateStore;
use ralph_gate::testing::MockCommandRunner;
use ralph_gate::{CommandRunner, GateState, RealCommandRunner, StateStore, VERSION};
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

const FRONTEND_PASSING: &str = "$ cd frontend && npm run build\n\
                                Build completed in 4.1s\n\
                                $ cd frontend && npm test\n\
                                Tests: 12 passed, 12 total\n\
                                $ cd frontend && npm run lint\n\
                                Found 0 warnings and 0 errors.\n";

const FRONTEND_NO_LINT: &str = "$ cd frontend && npm run build\n\
                                Build completed in 4.1s\n\
                                $ cd frontend && npm test\n\
                                Tests: 12 passed, 12 total\n";

fn settings(project_dir: &Path) -> HookSettings {
    HookSettings {
        project_dir: project_dir.to_path_buf(),
        target_package: Some("frontend".to_string()),
        ..Default::default()
    }
}

fn pre_tool_use(project_dir: &Path, command: &str) -> CliOutput {
    let input = serde_json::json!({
        "session_id": "s1",
        "tool_name": "Bash",
        "tool_input": { "command": command },
    });
    run_with(
        Command::PreToolUse,
        &input.to_string(),
        &settings(project_dir),
        &MockCommandRunner::new(),
    )
}

fn stop(project_dir: &Path, transcript: &str) -> CliOutput {
    let transcript_path = project_dir.join("transcript.jsonl");
    std::fs::write(&transcript_path, transcript).unwrap();
    let input = serde_json::json!({
        "session_id": "s1",
        "transcript_path": transcript_path,
        "stop_hook_active": false,
    });
    run_with(Command::Stop, &input.to_string(), &settings(project_dir), &MockCommandRunner::new())
}

fn stored_state(project_dir: &Path) -> GateState {
    FileStateStore::for_project(project_dir).load().unwrap()
}

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[test]
fn test_real_command_runner() {
    let runner = RealCommandRunner::new();
    let output = runner.run("echo", &["hello"], None, None).unwrap();
    assert!(output.success());
    assert!(output.stdout.contains("hello"));
}

#[test]
fn test_safe_command_is_approved() {
    let dir = TempDir::new().unwrap();
    let output = pre_tool_use(dir.path(), "git status");

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert_eq!(output.stdout.len(), 1);
    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[test]
fn test_dangerous_command_is_blocked() {
    let dir = TempDir::new().unwrap();
    let output = pre_tool_use(dir.path(), "sudo rm -rf /");

    assert_eq!(output.exit_code, ExitCode::from(2));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_sensitive_command_defers_to_runner() {
    let dir = TempDir::new().unwrap();
    let output = pre_tool_use(dir.path(), "git push origin main");

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout.is_empty());
}

#[test]
#[serial_test::serial]
fn test_stop_allowed_after_full_validation() {
    let dir = TempDir::new().unwrap();
    FileStateStore::for_project(dir.path())
        .save(&GateState { continuation_count: 2, session_id: Some("s1".to_string()) })
        .unwrap();

    let output = stop(dir.path(), FRONTEND_PASSING);

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout.is_empty());
    assert_eq!(stored_state(dir.path()).continuation_count, 0);
}

#[test]
#[serial_test::serial]
fn test_stop_blocked_when_lint_missing() {
    let dir = TempDir::new().unwrap();
    let output = stop(dir.path(), FRONTEND_NO_LINT);

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert_eq!(output.stdout.len(), 1);
    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(json["decision"], "block");
    let reason = json["reason"].as_str().unwrap();
    assert!(reason.contains("Missing: lint"), "unexpected reason: {reason}");
    assert!(reason.contains("(Continuation 1/5)"));
    assert_eq!(stored_state(dir.path()).continuation_count, 1);
}

#[test]
#[serial_test::serial]
fn test_stop_gives_up_after_max_continuations() {
    let dir = TempDir::new().unwrap();
    for expected in 1..=5 {
        let output = stop(dir.path(), FRONTEND_NO_LINT);
        assert_eq!(output.stdout.len(), 1, "continuation {expected} should block");
        assert_eq!(stored_state(dir.path()).continuation_count, expected);
    }

    let output = stop(dir.path(), FRONTEND_NO_LINT);
    assert!(output.stdout.is_empty());
    assert!(output.stderr.iter().any(|m| m.contains("Max continuations (5) reached")));
    assert_eq!(stored_state(dir.path()).continuation_count, 0);
}
