//! Hook implementations for the agent runner.
//!
//! Each hook reads one JSON object from stdin. The shapes written back are
//! the ones the runner understands: a `hookSpecificOutput` object for tool
//! hooks and a `{"decision": "block", "reason": ...}` object for stop.

mod post_tool_use;
mod pre_tool_use;
mod stop;

pub use post_tool_use::run_post_tool_use;
pub use pre_tool_use::run_pre_tool_use;
pub use stop::{run_stop_hook, AllowReason, BlockCause, StopDecision, StopHookConfig, StopHookResult};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Input provided to hooks by the agent runner.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HookInput {
    /// Identifier of the agent session.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Set when the agent is already continuing because of a stop hook.
    #[serde(default)]
    pub stop_hook_active: bool,
    /// Path to the transcript file.
    #[serde(default)]
    pub transcript_path: Option<String>,
    /// The tool being called.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// The tool input.
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

impl HookInput {
    /// The tool name, or empty.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    /// The Bash command, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.tool_input.as_ref().and_then(|ti| ti.command.as_deref())
    }

    /// The edited file path, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input.as_ref().and_then(ToolInput::file_path)
    }
}

/// Tool input for the tools the hooks look at.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolInput {
    /// The command being executed (for Bash tool).
    #[serde(default)]
    pub command: Option<String>,
    /// The file path being written/edited (for Write/Edit tools).
    #[serde(default)]
    pub file_path: Option<String>,
    /// Camel-case spelling of the file path used by some tool versions.
    #[serde(default, rename = "filePath")]
    pub file_path_camel: Option<String>,
}

impl ToolInput {
    /// The file path under either spelling, preferring `file_path`.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        [self.file_path.as_deref(), self.file_path_camel.as_deref()]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty())
    }
}

/// Output from a `PreToolUse` hook.
#[derive(Debug, Clone, Serialize)]
pub struct PreToolUseOutput {
    /// Hook-specific output.
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: PermissionOutput,
}

/// Hook-specific output for `PreToolUse`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOutput {
    /// The hook event name.
    pub hook_event_name: String,
    /// The permission decision.
    pub permission_decision: String,
    /// Why the decision was made.
    pub permission_decision_reason: String,
}

impl PreToolUseOutput {
    /// Create an "allow" response.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: PermissionOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: "allow".to_string(),
                permission_decision_reason: reason.into(),
            },
        }
    }
}

/// Output from a `PostToolUse` hook.
#[derive(Debug, Clone, Serialize)]
pub struct PostToolUseOutput {
    /// Hook-specific output.
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: ContextOutput,
}

/// Hook-specific output for `PostToolUse`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOutput {
    /// The hook event name.
    pub hook_event_name: String,
    /// Text shown to the agent after the tool ran.
    pub additional_context: String,
}

impl PostToolUseOutput {
    /// Create a response carrying additional context.
    pub fn context(text: impl Into<String>) -> Self {
        Self {
            hook_specific_output: ContextOutput {
                hook_event_name: "PostToolUse".to_string(),
                additional_context: text.into(),
            },
        }
    }
}

/// Output from a blocking `Stop` hook.
#[derive(Debug, Clone, Serialize)]
pub struct StopOutput {
    /// Always `block`; allowed stops produce no output.
    pub decision: String,
    /// What the agent must do before stopping.
    pub reason: String,
}

impl StopOutput {
    /// Create a "block" response.
    pub fn block(reason: impl Into<String>) -> Self {
        Self { decision: "block".to_string(), reason: reason.into() }
    }
}

/// Parse hook input from stdin.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed as JSON.
pub fn parse_hook_input(input: &str) -> Result<HookInput> {
    if input.trim().is_empty() {
        return Ok(HookInput::default());
    }
    let parsed: HookInput = serde_json::from_str(input)?;
    Ok(parsed)
}
