//! Transcript evidence scanning.
//!
//! Decides, from raw transcript text, which required validation commands were
//! invoked for a package and whether the most recent output looks like a pass
//! or a failure. Invocation is judged over the whole transcript; success and
//! failure only over the trailing window, so stale runs don't count.

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Number of trailing transcript lines searched for success/failure markers.
pub const RECENT_WINDOW_LINES: usize = 100;

/// Package whose requirements apply when the target is not recognized.
pub const DEFAULT_PACKAGE: &str = "frontend";

/// Built-in failure markers.
pub const DEFAULT_FAILURE_MARKERS: &[&str] = &[
    r"(?-i)FAIL\s+",
    r"error TS\d+",
    r"[1-9]\d* errors?\b",
    r"npm ERR!",
    r"Command failed",
    r"Build failed",
    r"\btests? failed",
];

/// Built-in success markers.
///
/// Test-runner summaries are matched on the phrase alone; whatever glyph a
/// runner prints in front of it is irrelevant.
pub const DEFAULT_SUCCESS_MARKERS: &[&str] = &[
    r"Build completed",
    r"All tests passed",
    r"\b[1-9]\d* tests? passed",
    r"Found \d+ warnings? and 0 errors",
    r"(?:^|[^\d])0 errors\b",
];

/// Kind of validation a command provides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    /// Compile / bundle.
    Build,
    /// Test suite.
    Test,
    /// Linter.
    Lint,
}

impl ValidationKind {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Lint => "lint",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required validation command for a package.
#[derive(Debug, Clone)]
pub struct ValidationRequirement {
    /// What this command validates.
    pub kind: ValidationKind,
    /// Pattern identifying an invocation in the transcript.
    pub pattern: Regex,
    /// The command to suggest, run from inside the package directory.
    pub command: String,
}

impl ValidationRequirement {
    /// Create a requirement, compiling `pattern` case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(kind: ValidationKind, pattern: &str, command: impl Into<String>) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { kind, pattern, command: command.into() })
    }
}

/// Evidence derived from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceReport {
    /// Kinds whose command appears anywhere in the transcript.
    pub ran_kinds: BTreeSet<ValidationKind>,
    /// Required kinds with no invocation in the transcript.
    pub missing_kinds: BTreeSet<ValidationKind>,
    /// A failure marker appears in the trailing window.
    pub has_failure_signal: bool,
    /// A success marker appears in the trailing window.
    pub has_success_signal: bool,
    /// Everything ran, nothing failed, and success was confirmed.
    pub passed: bool,
}

impl EvidenceReport {
    fn new(
        ran_kinds: BTreeSet<ValidationKind>,
        missing_kinds: BTreeSet<ValidationKind>,
        has_failure_signal: bool,
        has_success_signal: bool,
    ) -> Self {
        let passed = missing_kinds.is_empty() && !has_failure_signal && has_success_signal;
        Self { ran_kinds, missing_kinds, has_failure_signal, has_success_signal, passed }
    }

    /// Comma-separated list of missing kinds.
    #[must_use]
    pub fn missing_list(&self) -> String {
        self.missing_kinds
            .iter()
            .copied()
            .map(ValidationKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Scanner holding per-package requirements and marker sets.
#[derive(Debug, Clone)]
pub struct EvidenceScanner {
    packages: BTreeMap<String, Vec<ValidationRequirement>>,
    default_package: String,
    failure_markers: Vec<Regex>,
    success_markers: Vec<Regex>,
}

static BUILTIN: Lazy<EvidenceScanner> = Lazy::new(EvidenceScanner::builtin);

fn compile_markers<S: AsRef<str>>(markers: &[S]) -> Result<Vec<Regex>> {
    markers
        .iter()
        .map(|m| RegexBuilder::new(m.as_ref()).case_insensitive(true).build().map_err(Error::from))
        .collect()
}

fn npm_requirements(package: &str, kinds: &[ValidationKind]) -> Vec<ValidationRequirement> {
    kinds
        .iter()
        .map(|&kind| {
            let command = match kind {
                ValidationKind::Build => "npm run build",
                ValidationKind::Test => "npm test",
                ValidationKind::Lint => "npm run lint",
            };
            let pattern = format!(r"cd {package}\s*&&\s*{}", command.replace(' ', r"\s+"));
            ValidationRequirement::new(kind, &pattern, command)
                .expect("built-in requirement pattern should compile")
        })
        .collect()
}

impl Default for EvidenceScanner {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl EvidenceScanner {
    /// Scanner with the built-in requirement table and markers.
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile, which tests rule out.
    #[must_use]
    pub fn builtin() -> Self {
        use ValidationKind::{Build, Lint, Test};

        let mut packages = BTreeMap::new();
        packages.insert("frontend".to_string(), npm_requirements("frontend", &[Build, Test, Lint]));
        packages.insert("backend".to_string(), npm_requirements("backend", &[Build, Test, Lint]));
        packages.insert("electron".to_string(), npm_requirements("electron", &[Build, Test]));
        packages.insert(
            "mobile".to_string(),
            vec![
                ValidationRequirement::new(Build, r"cd mobile\s*&&\s*npx\s+tsc", "npx tsc")
                    .expect("built-in requirement pattern should compile"),
                ValidationRequirement::new(Test, r"cd mobile\s*&&\s*npm\s+test", "npm test")
                    .expect("built-in requirement pattern should compile"),
            ],
        );

        Self {
            packages,
            default_package: DEFAULT_PACKAGE.to_string(),
            failure_markers: compile_markers(DEFAULT_FAILURE_MARKERS)
                .expect("built-in failure markers should compile"),
            success_markers: compile_markers(DEFAULT_SUCCESS_MARKERS)
                .expect("built-in success markers should compile"),
        }
    }

    /// Build a scanner from the built-ins with project overrides applied.
    ///
    /// Configured packages replace built-in packages of the same name, and
    /// configured marker lists replace the built-in lists.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern does not compile or the
    /// configured default package has no requirements.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        let mut scanner = Self::builtin();

        for (name, requirements) in &config.packages {
            let compiled = requirements
                .iter()
                .map(|r| ValidationRequirement::new(r.kind, &r.pattern, r.command.clone()))
                .collect::<Result<Vec<_>>>()?;
            scanner.packages.insert(name.clone(), compiled);
        }

        if let Some(markers) = &config.failure_markers {
            scanner.failure_markers = compile_markers(markers.as_slice())?;
        }
        if let Some(markers) = &config.success_markers {
            scanner.success_markers = compile_markers(markers.as_slice())?;
        }

        if let Some(default) = &config.default_package {
            if !scanner.packages.contains_key(default) {
                return Err(Error::InvalidConfig(format!(
                    "default_package '{default}' has no validation requirements"
                )));
            }
            scanner.default_package.clone_from(default);
        }

        Ok(scanner)
    }

    /// Package used when no target is given or the target is unknown.
    #[must_use]
    pub fn default_package(&self) -> &str {
        &self.default_package
    }

    /// The package whose requirements apply to `package`.
    #[must_use]
    pub fn resolve_package<'a>(&'a self, package: &'a str) -> &'a str {
        if self.packages.contains_key(package) {
            package
        } else {
            &self.default_package
        }
    }

    /// Requirements for `package`, falling back to the default package.
    #[must_use]
    pub fn requirements(&self, package: &str) -> &[ValidationRequirement] {
        self.packages.get(self.resolve_package(package)).map(Vec::as_slice).unwrap_or_default()
    }

    /// Known package names.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// The full command line that satisfies every requirement of `package`.
    #[must_use]
    pub fn suggested_command(&self, package: &str) -> String {
        let resolved = self.resolve_package(package);
        let commands: Vec<&str> =
            self.requirements(resolved).iter().map(|r| r.command.as_str()).collect();
        format!("cd {resolved} && {}", commands.join(" && "))
    }

    /// Scan a transcript for validation evidence.
    #[must_use]
    pub fn scan(&self, transcript: &str, package: &str) -> EvidenceReport {
        let mut ran = BTreeSet::new();
        let mut missing = BTreeSet::new();

        for requirement in self.requirements(package) {
            if requirement.pattern.is_match(transcript) {
                ran.insert(requirement.kind);
            } else {
                missing.insert(requirement.kind);
            }
        }

        // A kind may be listed twice with different commands; one hit is enough.
        missing.retain(|kind| !ran.contains(kind));

        let window = recent_window(transcript, RECENT_WINDOW_LINES);
        let has_failure = self.failure_markers.iter().any(|m| m.is_match(window));
        let has_success = self.success_markers.iter().any(|m| m.is_match(window));

        EvidenceReport::new(ran, missing, has_failure, has_success)
    }
}

/// Scan a transcript with the built-in requirements and markers.
#[must_use]
pub fn scan(transcript: &str, target_package: &str) -> EvidenceReport {
    BUILTIN.scan(transcript, target_package)
}

/// The last `lines` newline-separated lines of `text`.
#[must_use]
pub fn recent_window(text: &str, lines: usize) -> &str {
    if lines == 0 {
        return "";
    }
    text.rmatch_indices('\n').nth(lines - 1).map_or(text, |(idx, _)| &text[idx + 1..])
}
