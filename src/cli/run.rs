//! Command execution for the CLI.
//!
//! Hook commands never fail the caller: unparsable input, unreadable config
//! and similar problems are reported on stderr and the hook exits neutrally.

use crate::classifier::{self, Outcome};
use crate::cli::Command;
use crate::command::RealCommandRunner;
use crate::config::{self, HookSettings, ProjectConfig};
use crate::evidence::EvidenceScanner;
use crate::hook_logging;
use crate::hooks::{
    parse_hook_input, run_post_tool_use, run_pre_tool_use, run_stop_hook, HookInput,
    PreToolUseOutput, StopHookConfig,
};
use crate::paths;
use crate::state::{FileStateStore, GateState};
use crate::templates;
use crate::traits::{CommandRunner, StateStore};
use crate::transcript;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Exit status the runner treats as a blocking error for a tool call.
const BLOCK_EXIT_CODE: i32 = 2;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

impl CliOutput {
    fn error(message: impl Into<String>) -> Self {
        Self { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message.into()] }
    }
}

/// Run a CLI command against the process environment.
pub fn run(command: Command, stdin: &str) -> CliOutput {
    run_with(command, stdin, &HookSettings::from_env(), &RealCommandRunner::new())
}

/// Run a CLI command with explicit settings and command runner.
pub fn run_with(
    command: Command,
    stdin: &str,
    settings: &HookSettings,
    runner: &dyn CommandRunner,
) -> CliOutput {
    match command {
        Command::Version => run_version(),
        Command::EnsureConfig => run_ensure_config(&settings.project_dir),
        Command::ResetState => run_reset_state(&settings.project_dir),
        Command::Classify { command } => run_classify(&command.join(" ")),
        Command::CheckTranscript { path, package } => {
            run_check_transcript(&path, package.as_deref(), settings)
        }
        Command::Stop => run_hook("stop", stdin, settings, |input, config, stderr| {
            run_stop_cmd(input, settings, config, stderr)
        }),
        Command::PreToolUse => run_hook("pre-tool-use", stdin, settings, |input, _, stderr| {
            run_pre_tool_use_cmd(input, settings, stderr)
        }),
        Command::PostToolUse => {
            run_hook("post-tool-use", stdin, settings, |input, config, stderr| {
                run_post_tool_use_cmd(input, settings, config, runner, stderr)
            })
        }
    }
}

/// Convert an i32 exit code to `ExitCode`, clamping to the valid range.
pub(crate) fn exit_code_from_i32(code: i32) -> ExitCode {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let code_u8 = if code < 0 {
        1u8
    } else if code > 255 {
        255u8
    } else {
        code as u8
    };
    ExitCode::from(code_u8)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Error serializing output: {e}"))
}

/// Load the project config, falling back to defaults with a warning.
fn load_project_config(project_dir: &Path, stderr: &mut Vec<String>) -> ProjectConfig {
    match ProjectConfig::load_from(project_dir) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            stderr.push(format!("Warning: Could not load config: {e}"));
            ProjectConfig::default()
        }
    }
}

/// Build the evidence scanner, falling back to the built-ins with a warning.
fn build_scanner(config: &ProjectConfig, stderr: &mut Vec<String>) -> EvidenceScanner {
    EvidenceScanner::from_config(config).unwrap_or_else(|e| {
        stderr.push(format!("Warning: Ignoring validation overrides in config: {e}"));
        EvidenceScanner::builtin()
    })
}

/// Load template overrides from the project, falling back to the embedded set.
fn init_message_templates(project_dir: &Path, stderr: &mut Vec<String>) {
    if let Err(e) = templates::init_templates(Some(&paths::templates_dir(project_dir))) {
        stderr.push(format!("Warning: {e}"));
        if let Err(e) = templates::init_templates(None) {
            stderr.push(format!("Warning: {e}"));
        }
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    CliOutput {
        exit_code: ExitCode::SUCCESS,
        stdout: vec![],
        stderr: vec![format!("ralph-gate v{}", crate::VERSION)],
    }
}

fn run_ensure_config(project_dir: &Path) -> CliOutput {
    match config::ensure_config_in(project_dir) {
        Ok((config, created)) => {
            let path = ProjectConfig::config_path(project_dir);
            let mut messages = vec![if created {
                format!("Created config at {}", path.display())
            } else {
                format!("Config already exists at {}", path.display())
            }];
            messages.push(format!("  debug_logging: {}", config.debug_logging));
            messages.push(format!(
                "  default_package: {}",
                config.default_package.as_deref().unwrap_or(crate::evidence::DEFAULT_PACKAGE)
            ));
            messages.push(format!("  lint_timeout_secs: {}", config.lint_timeout().as_secs()));
            CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![], stderr: messages }
        }
        Err(e) => CliOutput::error(format!("Error ensuring config: {e}")),
    }
}

fn run_reset_state(project_dir: &Path) -> CliOutput {
    let store = FileStateStore::for_project(project_dir);
    match store.save(&GateState::default()) {
        Ok(()) => CliOutput {
            exit_code: ExitCode::SUCCESS,
            stdout: vec![],
            stderr: vec![format!("Reset stop-gate state at {}", store.path().display())],
        },
        Err(e) => CliOutput::error(format!("Error resetting state: {e}")),
    }
}

fn run_classify(command: &str) -> CliOutput {
    let classification = classifier::classify(command);
    CliOutput {
        exit_code: ExitCode::SUCCESS,
        stdout: vec![format!("{}: {}", classification.outcome, classification.reason)],
        stderr: vec![],
    }
}

fn run_check_transcript(path: &Path, package: Option<&str>, settings: &HookSettings) -> CliOutput {
    let mut stderr = Vec::new();
    let config = load_project_config(&settings.project_dir, &mut stderr);
    let scanner = build_scanner(&config, &mut stderr);

    let text = match transcript::read_transcript(path) {
        Ok(text) => text,
        Err(e) => return CliOutput::error(format!("Error reading transcript: {e}")),
    };

    let package = package
        .or(settings.target_package.as_deref())
        .unwrap_or_else(|| scanner.default_package());
    let report = scanner.scan(&text, package);

    match serde_json::to_string_pretty(&report) {
        Ok(json) => CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![json], stderr },
        Err(e) => CliOutput::error(format!("Error serializing report: {e}")),
    }
}

// === Hook Commands ===

/// Result of one hook body: exit code, stdout, and the outcome for the event log.
struct HookReply {
    exit_code: i32,
    stdout: Vec<String>,
    outcome: String,
}

impl HookReply {
    fn neutral(outcome: impl Into<String>) -> Self {
        Self { exit_code: 0, stdout: vec![], outcome: outcome.into() }
    }
}

/// Parse the input, run a hook body, and log the event.
fn run_hook<F>(hook_type: &str, stdin: &str, settings: &HookSettings, body: F) -> CliOutput
where
    F: FnOnce(&HookInput, &ProjectConfig, &mut Vec<String>) -> HookReply,
{
    let mut stderr = Vec::new();
    let config = load_project_config(&settings.project_dir, &mut stderr);

    let reply = match parse_hook_input(stdin) {
        Ok(input) => body(&input, &config, &mut stderr),
        Err(e) => {
            stderr.push(format!("Error parsing hook input: {e}"));
            HookReply::neutral("invalid_input")
        }
    };

    hook_logging::log_hook_event(&config, &settings.project_dir, hook_type, stdin, &reply.outcome);

    CliOutput { exit_code: exit_code_from_i32(reply.exit_code), stdout: reply.stdout, stderr }
}

fn run_stop_cmd(
    input: &HookInput,
    settings: &HookSettings,
    config: &ProjectConfig,
    stderr: &mut Vec<String>,
) -> HookReply {
    init_message_templates(&settings.project_dir, stderr);
    let scanner = build_scanner(config, stderr);
    let store = FileStateStore::for_project(&settings.project_dir);

    let result = run_stop_hook(input, &StopHookConfig::from_settings(settings), &scanner, &store);
    stderr.extend(result.messages.iter().cloned());

    let stdout = match result.output().map(|output| to_json(&output)) {
        Some(Ok(json)) => vec![json],
        Some(Err(e)) => {
            stderr.push(e);
            vec![]
        }
        None => vec![],
    };

    HookReply { exit_code: 0, stdout, outcome: result.outcome() }
}

fn run_pre_tool_use_cmd(
    input: &HookInput,
    settings: &HookSettings,
    stderr: &mut Vec<String>,
) -> HookReply {
    let classification = run_pre_tool_use(input, settings);
    let outcome = classification.outcome.to_string();

    match classification.outcome {
        Outcome::Block => {
            // On exit 2 the runner shows stderr to the agent.
            stderr.push(classification.reason);
            HookReply { exit_code: BLOCK_EXIT_CODE, stdout: vec![], outcome }
        }
        Outcome::Allow => match to_json(&PreToolUseOutput::allow(classification.reason)) {
            Ok(json) => HookReply { exit_code: 0, stdout: vec![json], outcome },
            Err(e) => {
                stderr.push(e);
                HookReply::neutral(outcome)
            }
        },
        Outcome::Ask | Outcome::NoOpinion => HookReply::neutral(outcome),
    }
}

fn run_post_tool_use_cmd(
    input: &HookInput,
    settings: &HookSettings,
    config: &ProjectConfig,
    runner: &dyn CommandRunner,
    stderr: &mut Vec<String>,
) -> HookReply {
    init_message_templates(&settings.project_dir, stderr);

    match run_post_tool_use(input, settings, runner, config.lint_timeout()) {
        Some(output) => match to_json(&output) {
            Ok(json) => HookReply { exit_code: 0, stdout: vec![json], outcome: "lint_issues".into() },
            Err(e) => {
                stderr.push(e);
                HookReply::neutral("lint_issues")
            }
        },
        None => HookReply::neutral("no_issues"),
    }
}
