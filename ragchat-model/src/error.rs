//! Error types for ragchat-model.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling a chat model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Missing or invalid endpoint, credentials, or model name
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The request could not be built or was rejected by the backend
    #[error("Request failed: {0}")]
    Request(String),

    /// The fragment stream broke after it started
    #[error("Stream error: {0}")]
    Stream(String),

    /// The backend did not answer within the configured deadline
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend finished without producing any text
    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Result type alias for ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
