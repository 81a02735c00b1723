//! `PreToolUse` hook: classify Bash commands before they run.

use crate::classifier::{self, Classification, Outcome};
use crate::config::HookSettings;
use crate::hooks::HookInput;

fn skipped(reason: &str) -> Classification {
    Classification { outcome: Outcome::NoOpinion, reason: reason.to_string(), pattern: None }
}

/// Classify the command of a Bash tool call.
///
/// Anything other than a Bash call with a non-empty command, or any call
/// while the hook is disabled, has no opinion.
#[must_use]
pub fn run_pre_tool_use(input: &HookInput, settings: &HookSettings) -> Classification {
    if input.tool_name() != "Bash" {
        return skipped("not a Bash call");
    }
    if !settings.auto_approve_enabled {
        return skipped("hook disabled");
    }
    match input.command() {
        Some(command) if !command.is_empty() => classifier::classify(command),
        _ => skipped("no command"),
    }
}
