//! Tests for the CLI module.

use super::run::exit_code_from_i32;
use super::*;
use crate::config::HookSettings;
use crate::paths;
use crate::state::{FileStateStore, GateState};
use crate::testing::MockCommandRunner;
use crate::traits::{CommandOutput, StateStore};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

fn settings(dir: &Path) -> HookSettings {
    HookSettings { project_dir: dir.to_path_buf(), ..Default::default() }
}

fn run_in(dir: &Path, command: Command, stdin: &str) -> CliOutput {
    run_with(command, stdin, &settings(dir), &MockCommandRunner::new())
}

fn bash_input(command: &str) -> String {
    serde_json::json!({"tool_name": "Bash", "tool_input": {"command": command}}).to_string()
}

#[test]
fn test_command_needs_stdin() {
    assert!(!Command::Version.needs_stdin());
    assert!(!Command::EnsureConfig.needs_stdin());
    assert!(!Command::ResetState.needs_stdin());
    assert!(!Command::Classify { command: vec![] }.needs_stdin());

    assert!(Command::Stop.needs_stdin());
    assert!(Command::PreToolUse.needs_stdin());
    assert!(Command::PostToolUse.needs_stdin());
}

#[test]
fn test_command_is_hook() {
    assert!(Command::Stop.is_hook());
    assert!(Command::PreToolUse.is_hook());
    assert!(Command::PostToolUse.is_hook());

    assert!(!Command::Version.is_hook());
    assert!(!Command::EnsureConfig.is_hook());
    assert!(!Command::CheckTranscript { path: "t".into(), package: None }.is_hook());
}

#[test]
fn test_command_hook_type() {
    assert_eq!(Command::Stop.hook_type(), Some("stop"));
    assert_eq!(Command::PreToolUse.hook_type(), Some("pre-tool-use"));
    assert_eq!(Command::PostToolUse.hook_type(), Some("post-tool-use"));
    assert_eq!(Command::Version.hook_type(), None);
}

#[test]
fn test_parse_hook_subcommands() {
    let cli = Cli::try_parse_from(["ralph-gate", "pre-tool-use"]).unwrap();
    assert!(matches!(cli.command, Command::PreToolUse));

    let cli = Cli::try_parse_from(["ralph-gate", "stop"]).unwrap();
    assert!(matches!(cli.command, Command::Stop));
}

#[test]
fn test_parse_classify_takes_rest_of_line() {
    let cli = Cli::try_parse_from(["ralph-gate", "classify", "rm", "-rf", "build"]).unwrap();
    match cli.command {
        Command::Classify { command } => assert_eq!(command.join(" "), "rm -rf build"),
        other => panic!("unexpected command: {other:?}"),
    }

    assert!(Cli::try_parse_from(["ralph-gate", "classify"]).is_err());
}

#[test]
fn test_parse_check_transcript() {
    let cli =
        Cli::try_parse_from(["ralph-gate", "check-transcript", "t.jsonl", "--package", "mobile"])
            .unwrap();
    match cli.command {
        Command::CheckTranscript { path, package } => {
            assert_eq!(path, Path::new("t.jsonl"));
            assert_eq!(package.as_deref(), Some("mobile"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_exit_code_from_i32() {
    assert_eq!(exit_code_from_i32(0), ExitCode::SUCCESS);
    assert_eq!(exit_code_from_i32(2), ExitCode::from(2));
    assert_eq!(exit_code_from_i32(-1), ExitCode::from(1));
    assert_eq!(exit_code_from_i32(300), ExitCode::from(255));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), Command::Version, "");
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr[0].starts_with("ralph-gate v"));
}

#[test]
fn test_classify_command() {
    let dir = TempDir::new().unwrap();
    let output =
        run_in(dir.path(), Command::Classify { command: vec!["sudo".into(), "ls".into()] }, "");
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout[0].starts_with("block: Blocked dangerous command pattern"));

    let output =
        run_in(dir.path(), Command::Classify { command: vec!["git".into(), "status".into()] }, "");
    assert!(output.stdout[0].starts_with("allow: Auto-approved by RALPH"));
}

#[test]
fn test_pre_tool_use_blocks_dangerous() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), Command::PreToolUse, &bash_input("rm -rf /"));

    assert_eq!(output.exit_code, ExitCode::from(2));
    assert!(output.stdout.is_empty());
    assert!(output.stderr.iter().any(|m| m.starts_with("Blocked dangerous command pattern")));
}

#[test]
fn test_pre_tool_use_allows_safe() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), Command::PreToolUse, &bash_input("cd frontend && npm test"));

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(json["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "allow");
    assert!(json["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap()
        .starts_with("Auto-approved by RALPH"));
}

#[test]
fn test_pre_tool_use_ask_and_unknown_are_silent() {
    let dir = TempDir::new().unwrap();
    for command in ["git push origin main", "make deploy"] {
        let output = run_in(dir.path(), Command::PreToolUse, &bash_input(command));
        assert_eq!(output.exit_code, ExitCode::SUCCESS);
        assert!(output.stdout.is_empty(), "{command}");
        assert!(output.stderr.is_empty(), "{command}");
    }
}

#[test]
fn test_pre_tool_use_disabled() {
    let dir = TempDir::new().unwrap();
    let settings = HookSettings { auto_approve_enabled: false, ..settings(dir.path()) };
    let output = run_with(
        Command::PreToolUse,
        &bash_input("sudo rm -rf /"),
        &settings,
        &MockCommandRunner::new(),
    );
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_hooks_ignore_malformed_input() {
    let dir = TempDir::new().unwrap();
    for command in [Command::PreToolUse, Command::PostToolUse, Command::Stop] {
        let output = run_in(dir.path(), command, "{not json");
        assert_eq!(output.exit_code, ExitCode::SUCCESS);
        assert!(output.stdout.is_empty());
        assert!(output.stderr[0].contains("Error parsing hook input"));
    }
    assert!(!paths::state_file_path(dir.path()).exists());
}

#[test]
#[serial_test::serial]
fn test_stop_blocks_without_evidence() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("transcript.jsonl");
    std::fs::write(&transcript, "nothing ran\n").unwrap();
    let stdin = serde_json::json!({
        "session_id": "s1",
        "transcript_path": transcript.display().to_string(),
    })
    .to_string();

    let output = run_in(dir.path(), Command::Stop, &stdin);

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(json["decision"], "block");
    assert!(json["reason"].as_str().unwrap().starts_with("Run validation before completing."));
    assert!(json["reason"].as_str().unwrap().ends_with("(Continuation 1/5)"));

    let state = FileStateStore::for_project(dir.path()).load().unwrap();
    assert_eq!(state.continuation_count, 1);
    assert_eq!(state.session_id.as_deref(), Some("s1"));
}

#[test]
#[serial_test::serial]
fn test_stop_uses_template_override() {
    let dir = TempDir::new().unwrap();
    let override_dir = paths::templates_dir(dir.path()).join("messages").join("stop");
    std::fs::create_dir_all(&override_dir).unwrap();
    std::fs::write(override_dir.join("missing_validations.tera"), "Please run {{ missing }}.")
        .unwrap();
    let transcript = dir.path().join("t.jsonl");
    std::fs::write(&transcript, "").unwrap();
    let stdin = serde_json::json!({"transcript_path": transcript.display().to_string()}).to_string();

    let output = run_in(dir.path(), Command::Stop, &stdin);

    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(json["reason"], "Please run build, test, lint. (Continuation 1/5)");
    crate::templates::reset_cache().unwrap();
}

#[test]
#[serial_test::serial]
fn test_stop_allows_when_forced() {
    let dir = TempDir::new().unwrap();
    let settings = HookSettings { force_stop: true, ..settings(dir.path()) };

    let output = run_with(Command::Stop, "{}", &settings, &MockCommandRunner::new());

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout.is_empty());
    assert!(!paths::state_file_path(dir.path()).exists());
}

#[test]
#[serial_test::serial]
fn test_post_tool_use_reports_lint() {
    let dir = TempDir::new().unwrap();
    let file = format!("{}/backend/src/server.ts", dir.path().display());
    let mut runner = MockCommandRunner::new();
    runner.expect(
        "npx",
        &["oxlint", &file],
        CommandOutput {
            exit_code: 1,
            stdout: "  ! eslint(no-console): Unexpected console statement.\nFound 1 warning and 0 errors."
                .to_string(),
            stderr: String::new(),
        },
    );
    let stdin = serde_json::json!({"tool_name": "Edit", "tool_input": {"file_path": file}})
        .to_string();

    let output = run_with(Command::PostToolUse, &stdin, &settings(dir.path()), &runner);

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    let json: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    let context = json["hookSpecificOutput"]["additionalContext"].as_str().unwrap();
    assert!(context.starts_with("Lint issues in backend/src/server.ts:"));
    assert!(context.contains("no-console"));
    runner.verify();
    assert_eq!(runner.calls()[0].timeout, Some(std::time::Duration::from_secs(10)));
}

#[test]
#[serial_test::serial]
fn test_post_tool_use_uses_configured_timeout() {
    let dir = TempDir::new().unwrap();
    crate::config::ProjectConfig { lint_timeout_secs: Some(3), ..Default::default() }
        .save_to(dir.path())
        .unwrap();
    let mut runner = MockCommandRunner::new();
    runner.expect("npx", &["oxlint", "frontend/a.ts"], CommandOutput::default());
    let stdin =
        serde_json::json!({"tool_name": "Write", "tool_input": {"filePath": "frontend/a.ts"}})
            .to_string();

    let output = run_with(Command::PostToolUse, &stdin, &settings(dir.path()), &runner);

    assert!(output.stdout.is_empty());
    assert_eq!(runner.calls()[0].timeout, Some(std::time::Duration::from_secs(3)));
}

#[test]
fn test_debug_logging_records_outcome() {
    let dir = TempDir::new().unwrap();
    crate::config::ProjectConfig { debug_logging: true, ..Default::default() }
        .save_to(dir.path())
        .unwrap();

    let _ = run_in(dir.path(), Command::PreToolUse, &bash_input("sudo reboot"));

    let log = std::fs::read_to_string(paths::hook_events_path(dir.path())).unwrap();
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["hook_type"], "pre-tool-use");
    assert_eq!(entry["outcome"], "block");
}

#[test]
fn test_invalid_config_warns_and_continues() {
    let dir = TempDir::new().unwrap();
    let config_path = paths::config_path(dir.path());
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    std::fs::write(&config_path, "debug_logging: [not, a, bool").unwrap();

    let output = run_in(dir.path(), Command::PreToolUse, &bash_input("git status"));

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert_eq!(output.stdout.len(), 1);
    assert!(output.stderr[0].starts_with("Warning: Could not load config"));
}

#[test]
fn test_reset_state() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::for_project(dir.path());
    store.save(&GateState { continuation_count: 4, session_id: Some("s".into()) }).unwrap();

    let output = run_in(dir.path(), Command::ResetState, "");

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert_eq!(store.load().unwrap(), GateState::default());
}

#[test]
fn test_ensure_config() {
    let dir = TempDir::new().unwrap();

    let first = run_in(dir.path(), Command::EnsureConfig, "");
    assert_eq!(first.exit_code, ExitCode::SUCCESS);
    assert!(first.stderr[0].starts_with("Created config"));
    assert!(paths::config_path(dir.path()).exists());

    let second = run_in(dir.path(), Command::EnsureConfig, "");
    assert!(second.stderr[0].starts_with("Config already exists"));
}

#[test]
fn test_check_transcript() {
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("t.jsonl");
    std::fs::write(&transcript, "$ cd mobile && npx tsc\n$ cd mobile && npm test\n5 tests passed\n")
        .unwrap();

    let output = run_in(
        dir.path(),
        Command::CheckTranscript { path: transcript, package: Some("mobile".into()) },
        "",
    );

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    let report: serde_json::Value = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(report["passed"], true);
    assert_eq!(report["ran_kinds"], serde_json::json!(["build", "test"]));
}

#[test]
fn test_check_transcript_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = run_in(
        dir.path(),
        Command::CheckTranscript { path: dir.path().join("nope"), package: None },
        "",
    );
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("Error reading transcript"));
}
