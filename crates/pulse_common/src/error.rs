//! Error types for ReleasePulse.

use crate::llm_client::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No reviews for app version '{0}'")]
    UnknownVersion(String),

    #[error("No reviews for theme '{0}'")]
    UnknownTheme(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PulseError {
    pub fn code(&self) -> i32 {
        match self {
            PulseError::DataLoad { .. } => -32010,
            PulseError::Config(_) => -32011,
            PulseError::UnknownVersion(_) => -32012,
            PulseError::UnknownTheme(_) => -32013,
            PulseError::Llm(_) => -32002,
            PulseError::Io(_) => -32006,
            PulseError::Json(_) => -32700,
        }
    }

    /// True when the failure came from the external model call
    pub fn is_model_failure(&self) -> bool {
        matches!(self, PulseError::Llm(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_errors_convert() {
        let err: PulseError = LlmError::Timeout(60).into();
        assert!(err.is_model_failure());
        assert_eq!(err.code(), -32002);
        assert!(err.to_string().contains("60 seconds"));
    }

    #[test]
    fn test_data_load_message_names_file() {
        let err = PulseError::DataLoad {
            path: "data/priority_backlog.csv".to_string(),
            reason: "file not found".to_string(),
        };
        assert!(err.to_string().contains("priority_backlog.csv"));
        assert!(!err.is_model_failure());
    }
}
