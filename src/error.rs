//! Error types for llmstack
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in llmstack
#[derive(Debug, Error)]
pub enum StackError {
    /// Referenced session (or other record) does not exist
    #[error("{0}")]
    NotFound(String),

    /// Template failed placeholder validation
    #[error("{0}")]
    InvalidTemplate(String),

    /// Malformed request body or parameter
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Query rejected by the prompt engine's guard
    #[error("Unsafe query: {0}")]
    UnsafeQuery(String),

    /// Bad or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// LLM backend error
    #[error("LLM error: {0}")]
    Llm(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// External command failed
    #[error("Command error: {0}")]
    Command(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StackError {
    /// HTTP status code this error is surfaced as
    pub fn status_code(&self) -> u16 {
        match self {
            StackError::NotFound(_) => 404,
            StackError::InvalidTemplate(_) | StackError::InvalidRequest(_) | StackError::UnsafeQuery(_) => 400,
            _ => 500,
        }
    }
}

/// Result type alias for llmstack operations
pub type Result<T> = std::result::Result<T, StackError>;
