//! Locations of the files the hooks keep inside a project.
//!
//! Everything lives under a hidden `.ralph/` directory at the project root:
//! the stop-gate state, the optional config, debug logs and template
//! overrides.

use std::path::{Path, PathBuf};

/// Hidden state directory name, relative to the project root.
pub const STATE_DIR_NAME: &str = ".ralph";

/// Stop-gate state file name.
pub const STATE_FILENAME: &str = "hook-state.json";

/// Project config file name.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Debug hook event log file name.
pub const HOOK_EVENTS_FILENAME: &str = "hook-events.jsonl";

/// Template override directory name.
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Get the hidden state directory for a project.
#[must_use]
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(STATE_DIR_NAME)
}

/// Get the stop-gate state file path.
#[must_use]
pub fn state_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(STATE_FILENAME)
}

/// Get the project config file path.
#[must_use]
pub fn config_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(CONFIG_FILENAME)
}

/// Get the debug hook event log path.
#[must_use]
pub fn hook_events_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(HOOK_EVENTS_FILENAME)
}

/// Get the template override directory.
#[must_use]
pub fn templates_dir(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(TEMPLATES_DIR_NAME)
}
