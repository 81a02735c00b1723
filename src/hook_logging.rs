//! Debug hook event logging.
//!
//! When `debug_logging` is enabled in the project config, every hook
//! invocation is appended as a JSONL line to `.ralph/hook-events.jsonl`,
//! recording the raw input and the decision that was reached.

use crate::config::ProjectConfig;
use crate::paths;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Log a hook event if the config enables debug logging.
///
/// Errors are silently ignored; logging must never change a hook's outcome.
pub fn log_hook_event(
    config: &ProjectConfig,
    project_dir: &Path,
    hook_type: &str,
    raw_input: &str,
    outcome: &str,
) {
    if !config.debug_logging {
        return;
    }

    write_hook_event(project_dir, hook_type, raw_input, outcome);
}

/// Write the hook event to the log file.
fn write_hook_event(project_dir: &Path, hook_type: &str, raw_input: &str, outcome: &str) {
    if std::fs::create_dir_all(paths::state_dir(project_dir)).is_err() {
        return;
    }

    // Embed valid JSON input as-is, anything else as a string.
    let input_value: serde_json::Value = serde_json::from_str(raw_input)
        .unwrap_or_else(|_| serde_json::Value::String(raw_input.to_string()));

    let entry = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "hook_type": hook_type,
        "input": input_value,
        "outcome": outcome,
    });

    let Ok(mut file) =
        OpenOptions::new().create(true).append(true).open(paths::hook_events_path(project_dir))
    else {
        return;
    };

    let _ = writeln!(file, "{entry}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(debug_logging: bool) -> ProjectConfig {
        ProjectConfig { debug_logging, ..Default::default() }
    }

    fn read_log_lines(dir: &Path) -> Vec<serde_json::Value> {
        let log_path = paths::hook_events_path(dir);
        if !log_path.exists() {
            return vec![];
        }
        let content = std::fs::read_to_string(&log_path).unwrap();
        content
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_log_hook_event_when_enabled() {
        let dir = TempDir::new().unwrap();

        let input = r#"{"tool_name": "Bash", "tool_input": {"command": "sudo ls"}}"#;
        log_hook_event(&config(true), dir.path(), "pre-tool-use", input, "block");

        let lines = read_log_lines(dir.path());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["hook_type"], "pre-tool-use");
        assert_eq!(lines[0]["outcome"], "block");
        assert_eq!(lines[0]["input"]["tool_input"]["command"], "sudo ls");
        let timestamp = lines[0]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_log_hook_event_when_disabled() {
        let dir = TempDir::new().unwrap();

        log_hook_event(&config(false), dir.path(), "stop", "{}", "allow");

        assert!(read_log_lines(dir.path()).is_empty());
        assert!(!paths::state_dir(dir.path()).exists());
    }

    #[test]
    fn test_log_hook_event_invalid_json_input() {
        let dir = TempDir::new().unwrap();

        log_hook_event(&config(true), dir.path(), "stop", "not json", "no_opinion");

        let lines = read_log_lines(dir.path());
        assert_eq!(lines[0]["input"], "not json");
    }

    #[test]
    fn test_log_hook_event_appends() {
        let dir = TempDir::new().unwrap();
        let config = config(true);

        log_hook_event(&config, dir.path(), "stop", "{}", "block");
        log_hook_event(&config, dir.path(), "stop", "{}", "allow");

        let outcomes: Vec<_> =
            read_log_lines(dir.path()).iter().map(|l| l["outcome"].clone()).collect();
        assert_eq!(outcomes, vec!["block", "allow"]);
    }

    #[test]
    fn test_log_hook_event_unwritable_dir_is_ignored() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        // The project "directory" is a regular file, so nothing can be created.
        log_hook_event(&config(true), &blocker, "stop", "{}", "allow");
    }
}
