//! Lint feedback for edited files.
//!
//! After an edit to a JavaScript or TypeScript file inside one of the known
//! subprojects, `oxlint` is run on that file and any findings are handed back
//! to the agent. Failures of the linter itself are never reported.

use crate::traits::CommandRunner;
use std::path::Path;
use std::time::Duration;

/// File extensions the linter understands (compared case-insensitively).
pub const LINTABLE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Subproject directories, in detection order.
pub const SUBPROJECTS: &[&str] = &["frontend", "backend", "electron", "mobile", "chrome-extension"];

/// Linter config file looked up inside the package directory.
pub const OXLINT_CONFIG: &str = ".oxlintrc.json";

/// Maximum number of linter output lines kept.
pub const MAX_LINT_LINES: usize = 15;

/// Findings for one edited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintReport {
    /// Subproject the file belongs to.
    pub package: &'static str,
    /// File path relative to the project root, when it lies under it.
    pub relative_path: String,
    /// Filtered linter output.
    pub output: String,
}

/// Whether the file has a lintable extension.
#[must_use]
pub fn is_lintable(file_path: &str) -> bool {
    Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LINTABLE_EXTENSIONS.iter().any(|l| l.eq_ignore_ascii_case(ext)))
}

/// The first subproject whose directory appears in the path.
#[must_use]
pub fn package_for_file(file_path: &str) -> Option<&'static str> {
    SUBPROJECTS.iter().copied().find(|package| file_path.contains(&format!("{package}/")))
}

/// Path shown to the agent: relative to the project root when possible.
#[must_use]
pub fn relative_path(file_path: &str, project_root: &Path) -> String {
    let root = project_root.to_string_lossy();
    file_path
        .strip_prefix(root.as_ref())
        .map_or(file_path, |rest| rest.trim_start_matches('/'))
        .to_string()
}

/// Reduce raw linter output to the lines worth showing.
///
/// Returns `None` when the output mentions neither warnings nor errors, or
/// when nothing is left after dropping blank lines, timing lines and
/// "Found 0 warnings" summaries.
#[must_use]
pub fn filter_lint_output(output: &str) -> Option<String> {
    let lower = output.to_lowercase();
    if !lower.contains("warning") && !lower.contains("error") {
        return None;
    }

    let relevant: Vec<&str> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("Finished in"))
        .filter(|line| !line.contains("Found 0 warnings"))
        .take(MAX_LINT_LINES)
        .collect();

    if relevant.is_empty() {
        None
    } else {
        Some(relevant.join("\n"))
    }
}

/// Run `npx oxlint` on a file from inside its package directory.
///
/// Uses the package's `.oxlintrc.json` when present. A timeout or a linter
/// that cannot be started yields no findings.
pub fn run_lint(
    file_path: &str,
    package: &str,
    project_root: &Path,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Option<String> {
    let package_dir = project_root.join(package);

    let mut args = vec!["oxlint"];
    if package_dir.join(OXLINT_CONFIG).exists() {
        args.extend(["--config", OXLINT_CONFIG]);
    }
    args.push(file_path);

    match runner.run("npx", &args, Some(&package_dir), Some(timeout)) {
        Ok(output) => filter_lint_output(output.combined_output().trim()),
        Err(_) => None,
    }
}

/// Lint an edited file if it is lintable and belongs to a known subproject.
pub fn lint_file(
    file_path: &str,
    project_root: &Path,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Option<LintReport> {
    if file_path.is_empty() || !is_lintable(file_path) {
        return None;
    }
    let package = package_for_file(file_path)?;
    let output = run_lint(file_path, package, project_root, runner, timeout)?;

    Some(LintReport { package, relative_path: relative_path(file_path, project_root), output })
}
