//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]
#![allow(clippy::needless_pass_by_ref_mut)] // &mut self for ergonomics with RefCell

use crate::error::{Error, Result};
use crate::state::GateState;
use crate::traits::{CommandOutput, CommandRunner, StateStore};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a mocked command does when called.
#[derive(Debug, Clone)]
enum MockResponse {
    Output(CommandOutput),
    Timeout,
}

/// A command call observed by [`MockCommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Program name.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Working directory, if one was given.
    pub cwd: Option<PathBuf>,
    /// Timeout, if one was given.
    pub timeout: Option<Duration>,
}

/// A mock command runner for testing.
///
/// Records expected commands and their outputs, then verifies they were called.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    expectations: RefCell<Vec<(String, Vec<String>, MockResponse)>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockCommandRunner {
    /// Create a new mock command runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected command and its output.
    pub fn expect(&mut self, program: &str, args: &[&str], output: CommandOutput) {
        self.push(program, args, MockResponse::Output(output));
    }

    /// Add an expected command that runs past its timeout.
    pub fn expect_timeout(&mut self, program: &str, args: &[&str]) {
        self.push(program, args, MockResponse::Timeout);
    }

    fn push(&mut self, program: &str, args: &[&str], response: MockResponse) {
        self.expectations.borrow_mut().push((
            program.to_string(),
            args.iter().map(|s| (*s).to_string()).collect(),
            response,
        ));
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Verify all expected commands were called.
    ///
    /// # Panics
    ///
    /// Panics if not all expected commands were called.
    pub fn verify(&self) {
        let made = self.calls.borrow().len();
        let expected = self.expectations.borrow().len();
        assert_eq!(made, expected, "Expected {expected} command calls, but only {made} were made");
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let index = self.calls.borrow().len();
        let expectations = self.expectations.borrow();

        assert!(
            index < expectations.len(),
            "Unexpected command call: {program} {args:?} (no more expectations)"
        );

        let (exp_program, exp_args, response) = &expectations[index];
        let args_vec: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

        assert!(
            !(program != exp_program || &args_vec != exp_args),
            "Command mismatch at index {index}:\n  Expected: {exp_program} {exp_args:?}\n  Got: {program} {args:?}"
        );

        self.calls.borrow_mut().push(RecordedCall {
            program: program.to_string(),
            args: args_vec,
            cwd: cwd.map(Path::to_path_buf),
            timeout,
        });

        match response {
            MockResponse::Output(output) => Ok(output.clone()),
            MockResponse::Timeout => Err(Error::CommandTimeout {
                command: format!("{program} {}", args.join(" ")),
                timeout_secs: timeout.map_or(0, |t| t.as_secs()),
            }),
        }
    }
}

/// A command runner that always fails, for testing error paths.
#[derive(Debug, Default)]
pub struct FailingCommandRunner {
    error_message: String,
}

impl FailingCommandRunner {
    /// Create a new failing command runner with the specified error message.
    #[must_use]
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into() }
    }
}

impl CommandRunner for FailingCommandRunner {
    fn run(
        &self,
        _program: &str,
        _args: &[&str],
        _cwd: Option<&Path>,
        _timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        Err(std::io::Error::other(self.error_message.clone()).into())
    }
}

/// In-memory state store.
///
/// Can be told to fail loads or saves to exercise the fail-open paths.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RefCell<Option<GateState>>,
    fail_load: Cell<bool>,
    fail_save: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `state`.
    #[must_use]
    pub fn with_state(state: GateState) -> Self {
        let store = Self::default();
        *store.state.borrow_mut() = Some(state);
        store
    }

    /// Make every subsequent load fail.
    pub fn fail_loads(&self) {
        self.fail_load.set(true);
    }

    /// Make every subsequent save fail.
    pub fn fail_saves(&self) {
        self.fail_save.set(true);
    }

    /// The stored state, if anything was stored.
    #[must_use]
    pub fn stored(&self) -> Option<GateState> {
        self.state.borrow().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<GateState> {
        if self.fail_load.get() {
            return Err(std::io::Error::other("simulated load failure").into());
        }
        Ok(self.state.borrow().clone().unwrap_or_default())
    }

    fn save(&self, state: &GateState) -> Result<()> {
        if self.fail_save.get() {
            return Err(std::io::Error::other("simulated save failure").into());
        }
        *self.state.borrow_mut() = Some(state.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_command_runner() {
        let mut runner = MockCommandRunner::new();
        runner.expect(
            "echo",
            &["hello"],
            CommandOutput { exit_code: 0, stdout: "hello\n".to_string(), stderr: String::new() },
        );

        let output = runner.run("echo", &["hello"], Some(Path::new("/tmp")), None).unwrap();
        assert_eq!(output.stdout, "hello\n");
        runner.verify();
        assert_eq!(runner.calls()[0].cwd.as_deref(), Some(Path::new("/tmp")));
    }

    #[test]
    #[should_panic(expected = "Command mismatch")]
    fn test_mock_command_runner_wrong_command() {
        let mut runner = MockCommandRunner::new();
        runner.expect("echo", &["hello"], CommandOutput::default());

        let _ = runner.run("echo", &["world"], None, None);
    }

    #[test]
    #[should_panic(expected = "no more expectations")]
    fn test_mock_command_runner_too_many_calls() {
        let runner = MockCommandRunner::new();
        let _ = runner.run("echo", &["hello"], None, None);
    }

    #[test]
    #[should_panic(expected = "Expected 1 command calls")]
    fn test_mock_command_runner_verify_fails() {
        let mut runner = MockCommandRunner::new();
        runner.expect("echo", &["hello"], CommandOutput::default());
        runner.verify();
    }

    #[test]
    fn test_mock_command_runner_timeout() {
        let mut runner = MockCommandRunner::new();
        runner.expect_timeout("npx", &["oxlint"]);

        let result = runner.run("npx", &["oxlint"], None, Some(Duration::from_secs(10)));
        assert!(matches!(result, Err(Error::CommandTimeout { timeout_secs: 10, .. })));
        runner.verify();
    }

    #[test]
    fn test_failing_command_runner() {
        let runner = FailingCommandRunner::new("test error");
        let result = runner.run("any", &["args"], None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_memory_state_store() {
        let store = MemoryStateStore::new();
        assert_eq!(store.load().unwrap(), GateState::default());
        assert!(store.stored().is_none());

        let state = GateState { continuation_count: 2, session_id: Some("s".to_string()) };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_memory_state_store_failures() {
        let store = MemoryStateStore::with_state(GateState::default());
        store.fail_loads();
        store.fail_saves();

        assert!(store.load().is_err());
        assert!(store.save(&GateState::default()).is_err());
        assert_eq!(store.save_count(), 0);
    }
}
