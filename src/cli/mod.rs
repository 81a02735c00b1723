//! Command-line interface for ralph-gate.
//!
//! The hook subcommands are what the agent runner invokes; the rest are
//! operator utilities for inspecting and resetting the gate.

mod run;

#[cfg(test)]
mod tests;

pub use run::{run, run_with, CliOutput};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command gating and validation enforcement for autonomous coding agents.
///
/// Install the hook subcommands in the agent runner's hook configuration:
///   pre-tool-use   (Bash)         classify commands before they run
///   post-tool-use  (Edit|Write)   lint edited files
///   stop                          require validation evidence before finishing
#[derive(Parser, Debug)]
#[command(name = "ralph-gate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a shell command and print the decision.
    ///
    /// Everything after the subcommand is taken as the command text, so
    /// `ralph-gate classify rm -rf build` works without quoting.
    Classify {
        /// The command text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Scan a transcript and print the validation evidence as JSON.
    #[command(name = "check-transcript")]
    CheckTranscript {
        /// Path to the transcript file
        path: PathBuf,

        /// Package whose validations are required (default: target or config default)
        #[arg(long)]
        package: Option<String>,
    },

    /// Zero the stop-gate continuation counter.
    #[command(name = "reset-state")]
    ResetState,

    // === Utility Commands ===
    /// Show version information.
    Version,

    /// Ensure config file exists (create with defaults if not).
    #[command(name = "ensure-config")]
    EnsureConfig,

    // === Hook Commands (receive JSON from stdin) ===
    /// Run the stop hook (stdin: JSON hook input).
    ///
    /// Called by the agent runner when the agent attempts to finish.
    /// Not intended for direct use.
    #[command(hide = true)]
    Stop,

    /// Run the pre-tool-use hook (stdin: JSON hook input).
    ///
    /// Called by the agent runner before a tool executes.
    /// Not intended for direct use.
    #[command(name = "pre-tool-use", hide = true)]
    PreToolUse,

    /// Run the post-tool-use hook (stdin: JSON hook input).
    ///
    /// Called by the agent runner after a tool executes.
    /// Not intended for direct use.
    #[command(name = "post-tool-use", hide = true)]
    PostToolUse,
}

impl Command {
    /// Returns true if this command requires stdin input.
    #[must_use]
    pub const fn needs_stdin(&self) -> bool {
        self.is_hook()
    }

    /// Returns true if this is a hook command (invoked by the agent runner).
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        matches!(self, Self::Stop | Self::PreToolUse | Self::PostToolUse)
    }

    /// Returns the hook type name for logging, or None for non-hook commands.
    #[must_use]
    pub const fn hook_type(&self) -> Option<&'static str> {
        match self {
            Self::Stop => Some("stop"),
            Self::PreToolUse => Some("pre-tool-use"),
            Self::PostToolUse => Some("post-tool-use"),
            _ => None,
        }
    }
}
