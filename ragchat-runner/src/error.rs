//! Error types for the `ragchat-runner` crate.

use ragchat_model::ModelError;
use ragchat_retrieval::RagError;
use thiserror::Error;

/// Errors that abort a chat turn.
///
/// A turn that fails with any of these leaves the session history untouched.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Invalid chat settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The follow-up question could not be rewritten into a standalone one.
    #[error("Contextualization failed: {0}")]
    Contextualization(#[source] ModelError),

    /// The answer could not be generated or its stream broke.
    #[error("Generation failed: {0}")]
    Generation(#[source] ModelError),

    /// Retrieval failed, including a missing or empty index.
    #[error(transparent)]
    Retrieval(#[from] RagError),
}

impl ChatError {
    /// Whether the user can fix this themselves (by ingesting documents)
    /// and the session should simply carry on.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Self::Retrieval(e) if e.is_missing_index())
    }
}

/// A convenience result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
