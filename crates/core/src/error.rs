//! Error types for docqa.
//!
//! A single error enum covers configuration, I/O, generation, retrieval,
//! prompt and pipeline failures.

use thiserror::Error;

/// Unified error type for docqa.
///
/// Library code returns `Result<T, AppError>` and never panics; failures
/// are values that travel up to the workflow driver or the CLI.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation capability errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Retrieval capability and index errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A request or context is missing something a step requires
    #[error("Validation error: {0}")]
    Validation(String),

    /// A blocking workflow aborted at a failing step
    #[error("Workflow stopped at step '{step}': {message}")]
    Workflow { step: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
