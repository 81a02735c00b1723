//! Core traits for testability and abstraction.

use crate::error::Result;
use crate::state::GateState;
use std::path::Path;
use std::time::Duration;

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the command.
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined stdout and stderr.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for running external commands.
///
/// This trait abstracts command execution for testability.
pub trait CommandRunner {
    /// Run a program with arguments.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run.
    /// * `args` - The arguments to pass.
    /// * `cwd` - Working directory, or the current one if `None`.
    /// * `timeout` - Optional timeout; the child is killed when it expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or times out.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}

/// Trait for persisting the stop-gate state.
///
/// The production implementation is a JSON file under `.ralph/`; tests use
/// an in-memory store.
pub trait StateStore {
    /// Load the stored state. A missing record is the zero value.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be read or parsed.
    fn load(&self) -> Result<GateState>;

    /// Replace the stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &GateState) -> Result<()>;
}
