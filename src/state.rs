//! Persisted stop-gate state.
//!
//! The state is a tiny JSON record:
//! ```json
//! {
//!   "continuation_count": 2,
//!   "session_id": "abc123"
//! }
//! ```
//! An absent file is the zero value. The record is read and rewritten once
//! per stop invocation without locking; two stops racing in the same session
//! can at worst lose one increment.

use crate::error::Result;
use crate::paths;
use crate::traits::StateStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Continuation counter scoped to one agent session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    /// Blocked (or counted) stop attempts in the current session.
    #[serde(default)]
    pub continuation_count: u32,
    /// Session the count belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl GateState {
    /// Adopt `session_id`, zeroing the count if it belongs to another session.
    pub fn enter_session(&mut self, session_id: &str) {
        if self.session_id.as_deref() != Some(session_id) {
            self.session_id = Some(session_id.to_string());
            self.continuation_count = 0;
        }
    }

    /// Zero the count, keeping the session.
    pub fn reset(&mut self) {
        self.continuation_count = 0;
    }

    /// Count one more stop attempt.
    pub fn increment(&mut self) {
        self.continuation_count = self.continuation_count.saturating_add(1);
    }
}

/// State store backed by `.ralph/hook-state.json`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside a project.
    #[must_use]
    pub fn for_project(project_dir: &Path) -> Self {
        Self::new(paths::state_file_path(project_dir))
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<GateState> {
        if !self.path.exists() {
            return Ok(GateState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, state: &GateState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(state)?)?;
        Ok(())
    }
}

/// Load state, treating any failure as the zero value.
///
/// Returns the state and a warning describing the failure, if there was one.
pub fn load_or_default(store: &dyn StateStore) -> (GateState, Option<String>) {
    match store.load() {
        Ok(state) => (state, None),
        Err(e) => (GateState::default(), Some(format!("Ignoring unreadable hook state: {e}"))),
    }
}
