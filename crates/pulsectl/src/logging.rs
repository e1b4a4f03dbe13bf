//! Logging for pulsectl
//!
//! Two sinks: `tracing` diagnostics on stderr, filtered by `RUST_LOG`, and a
//! best-effort JSONL record of each invocation.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the invocation log path
pub const LOG_FILE_ENV: &str = "PULSECTL_LOG_FILE";

/// Install the stderr tracing subscriber. Defaults to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Command-line arguments with any `--api-key` value masked
pub fn redact_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut redacted = Vec::new();
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            redacted.push("****".to_string());
            mask_next = false;
        } else if arg == "--api-key" {
            redacted.push(arg);
            mask_next = true;
        } else if arg.starts_with("--api-key=") {
            redacted.push("--api-key=****".to_string());
        } else {
            redacted.push(arg);
        }
    }
    redacted
}

/// Log entry for each pulsectl invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    /// Command name
    pub command: String,

    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,

    pub exit_code: i32,

    pub duration_ms: u64,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(command: &str, args: Vec<String>, exit_code: i32, duration_ms: u64) -> Self {
        Self {
            ts: Self::now(),
            req_id: Self::generate_req_id(),
            command: command.to_string(),
            args,
            exit_code,
            duration_ms,
            ok: exit_code == 0,
            error: None,
        }
    }

    pub fn with_error(mut self, code: &str, message: String) -> Self {
        self.error = Some(ErrorDetails {
            code: code.to_string(),
            message,
        });
        self
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $PULSECTL_LOG_FILE environment variable (explicit override)
    /// 2. $XDG_STATE_HOME/releasepulse/ctl.jsonl (XDG standard)
    /// 3. ~/.local/state/releasepulse/ctl.jsonl (XDG fallback)
    pub fn discover_log_path() -> Option<PathBuf> {
        Self::discover_log_path_with(|key| std::env::var(key).ok())
    }

    /// Same chain with an injectable environment lookup
    pub fn discover_log_path_with(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_empty(LOG_FILE_ENV) {
            return Some(PathBuf::from(path));
        }
        if let Some(state) = non_empty("XDG_STATE_HOME") {
            return Some(Path::new(&state).join("releasepulse").join("ctl.jsonl"));
        }
        non_empty("HOME").map(|home| {
            Path::new(&home)
                .join(".local/state/releasepulse")
                .join("ctl.jsonl")
        })
    }

    /// Append to the discovered log file. Failures are reported, never fatal.
    pub fn write(&self) -> Result<(), std::io::Error> {
        match Self::discover_log_path() {
            Some(path) => self.write_to_file(&path),
            None => Ok(()),
        }
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Generate request ID
    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Get current timestamp in ISO 8601 format
    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_path_priority() {
        let env = lookup(&[
            (LOG_FILE_ENV, "/tmp/explicit.jsonl"),
            ("XDG_STATE_HOME", "/state"),
            ("HOME", "/home/pm"),
        ]);
        assert_eq!(
            LogEntry::discover_log_path_with(env),
            Some(PathBuf::from("/tmp/explicit.jsonl"))
        );

        let env = lookup(&[("XDG_STATE_HOME", "/state"), ("HOME", "/home/pm")]);
        assert_eq!(
            LogEntry::discover_log_path_with(env),
            Some(PathBuf::from("/state/releasepulse/ctl.jsonl"))
        );

        let env = lookup(&[("HOME", "/home/pm")]);
        assert_eq!(
            LogEntry::discover_log_path_with(env),
            Some(PathBuf::from("/home/pm/.local/state/releasepulse/ctl.jsonl"))
        );

        assert_eq!(LogEntry::discover_log_path_with(lookup(&[])), None);
    }

    #[test]
    fn test_api_key_never_logged() {
        let args = ["ask", "why?", "--api-key", "sk-secret", "--api-key=sk-other"]
            .into_iter()
            .map(String::from);
        let redacted = redact_args(args);
        assert_eq!(
            redacted,
            vec!["ask", "why?", "--api-key", "****", "--api-key=****"]
        );
    }

    #[test]
    fn test_entries_append_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ctl.jsonl");

        LogEntry::new("stats", vec![], 0, 12).write_to_file(&path).unwrap();
        LogEntry::new("ask", vec!["why".to_string()], 69, 800)
            .with_error("model_unavailable", "timeout".to_string())
            .write_to_file(&path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["command"], "stats");
        assert_eq!(first["ok"], true);
        assert!(first.get("error").is_none());

        let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert!(!second.ok);
        assert_eq!(second.error.unwrap().code, "model_unavailable");
    }
}
