//! Configuration for the gate hooks.
//!
//! Two sources feed the hooks:
//! - environment variables set by the agent runner (per-hook toggles, the
//!   continuation limit, the target package, the project root, force-stop);
//! - an optional project file at `.ralph/config.yaml` overriding validation
//!   requirements and markers.

use crate::error::Result;
use crate::evidence::{ValidationKind, DEFAULT_FAILURE_MARKERS, DEFAULT_SUCCESS_MARKERS};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Disables the pre-tool-use classifier when set to `false`.
pub const ENV_AUTO_APPROVE: &str = "RALPH_HOOK_AUTO_APPROVE";
/// Disables the post-edit lint hook when set to `false`.
pub const ENV_LINT: &str = "RALPH_HOOK_LINT";
/// Disables the stop gate when set to `false`.
pub const ENV_VALIDATE_STOP: &str = "RALPH_HOOK_VALIDATE_STOP";
/// Maximum blocked stops per session before the gate lets go.
pub const ENV_MAX_CONTINUATIONS: &str = "RALPH_MAX_CONTINUATIONS";
/// Package whose validations the stop gate requires.
pub const ENV_TARGET_PACKAGE: &str = "RALPH_TARGET_PACKAGE";
/// Project root directory.
pub const ENV_PROJECT_DIR: &str = "CLAUDE_PROJECT_DIR";
/// Forces every stop through when set to `true`.
pub const ENV_FORCE_STOP: &str = "RALPH_FORCE_STOP";

/// Default for [`ENV_MAX_CONTINUATIONS`].
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 5;

/// Default linter timeout.
pub const DEFAULT_LINT_TIMEOUT_SECS: u64 = 10;

/// Settings read from the environment for a single hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)] // One toggle per hook plus the override flag
pub struct HookSettings {
    /// Whether the pre-tool-use classifier runs.
    pub auto_approve_enabled: bool,
    /// Whether the post-edit lint hook runs.
    pub lint_enabled: bool,
    /// Whether the stop gate runs.
    pub stop_gate_enabled: bool,
    /// Blocked stops allowed per session.
    pub max_continuations: u32,
    /// Target package, if one was given.
    pub target_package: Option<String>,
    /// Project root.
    pub project_dir: PathBuf,
    /// Emergency override letting every stop through.
    pub force_stop: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self {
            auto_approve_enabled: true,
            lint_enabled: true,
            stop_gate_enabled: true,
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
            target_package: None,
            project_dir: PathBuf::from("."),
            force_stop: false,
        }
    }
}

impl HookSettings {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Hooks stay enabled unless their variable is exactly `false`; force-stop
    /// is on only when its variable is exactly `true`. An unparsable
    /// continuation limit falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = |key: &str| lookup(key).as_deref() != Some("false");

        let project_dir = lookup(ENV_PROJECT_DIR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            auto_approve_enabled: enabled(ENV_AUTO_APPROVE),
            lint_enabled: enabled(ENV_LINT),
            stop_gate_enabled: enabled(ENV_VALIDATE_STOP),
            max_continuations: lookup(ENV_MAX_CONTINUATIONS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_CONTINUATIONS),
            target_package: lookup(ENV_TARGET_PACKAGE)
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            project_dir,
            force_stop: lookup(ENV_FORCE_STOP).as_deref() == Some("true"),
        }
    }
}

/// A validation requirement as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequirementConfig {
    /// What the command validates.
    pub kind: ValidationKind,
    /// Regex identifying the invocation in a transcript.
    pub pattern: String,
    /// Command to suggest, run from inside the package directory.
    pub command: String,
}

/// Project configuration stored in `.ralph/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Append every hook invocation to `.ralph/hook-events.jsonl`.
    #[serde(default)]
    pub debug_logging: bool,

    /// Package used when the target is unset or unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_package: Option<String>,

    /// Linter timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_timeout_secs: Option<u64>,

    /// Per-package requirement lists, replacing built-ins of the same name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, Vec<RequirementConfig>>,

    /// Replacement failure marker list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_markers: Option<Vec<String>>,

    /// Replacement success marker list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_markers: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Load config from a project directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(base_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Save config to a project directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let config_path = Self::config_path(base_dir);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path for a project directory.
    #[must_use]
    pub fn config_path(base_dir: &Path) -> PathBuf {
        paths::config_path(base_dir)
    }

    /// The configured linter timeout.
    #[must_use]
    pub fn lint_timeout(&self) -> Duration {
        Duration::from_secs(self.lint_timeout_secs.unwrap_or(DEFAULT_LINT_TIMEOUT_SECS))
    }

    /// A config spelling out the built-in defaults, for `ensure-config`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            debug_logging: false,
            default_package: Some(crate::evidence::DEFAULT_PACKAGE.to_string()),
            lint_timeout_secs: Some(DEFAULT_LINT_TIMEOUT_SECS),
            packages: BTreeMap::new(),
            failure_markers: Some(DEFAULT_FAILURE_MARKERS.iter().map(|m| (*m).to_string()).collect()),
            success_markers: Some(DEFAULT_SUCCESS_MARKERS.iter().map(|m| (*m).to_string()).collect()),
        }
    }
}

/// Ensure a config file exists in a project directory.
///
/// Returns the config and whether it was created.
///
/// # Errors
///
/// Returns an error if an existing config cannot be parsed or a new one
/// cannot be written.
pub fn ensure_config_in(base_dir: &Path) -> Result<(ProjectConfig, bool)> {
    if let Some(config) = ProjectConfig::load_from(base_dir)? {
        return Ok((config, false));
    }

    let config = ProjectConfig::with_defaults();
    config.save_to(base_dir)?;
    Ok((config, true))
}
