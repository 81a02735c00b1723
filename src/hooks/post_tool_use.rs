//! `PostToolUse` hook: lint feedback after file edits.
//!
//! Advisory only. The hook never blocks, and a linter that is missing or
//! slow produces no output at all.

use crate::config::HookSettings;
use crate::hooks::{HookInput, PostToolUseOutput};
use crate::lint;
use crate::templates;
use crate::traits::CommandRunner;
use std::time::Duration;
use tera::Context;

/// Lint the file touched by an `Edit` or `Write` call.
///
/// Returns the context to hand back to the agent when the linter reported
/// something.
pub fn run_post_tool_use(
    input: &HookInput,
    settings: &HookSettings,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Option<PostToolUseOutput> {
    if !matches!(input.tool_name(), "Edit" | "Write") || !settings.lint_enabled {
        return None;
    }

    let file_path = input.file_path()?;
    let report = lint::lint_file(file_path, &settings.project_dir, runner, timeout)?;

    let mut ctx = Context::new();
    ctx.insert("relative_path", &report.relative_path);
    ctx.insert("output", &report.output);
    Some(PostToolUseOutput::context(templates::render_message(templates::LINT_ISSUES, &ctx)))
}
