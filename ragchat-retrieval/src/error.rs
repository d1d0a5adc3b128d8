//! Error types for the `ragchat-retrieval` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, persisting, or querying an index.
#[derive(Debug, Error)]
pub enum RagError {
    /// Missing or invalid settings, credentials, or endpoints.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An embedding call failed or returned unusable vectors.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An index was requested from an empty set of chunks.
    #[error("cannot build an index from zero chunks")]
    EmptyInput,

    /// No index is loaded, or nothing is persisted at the given location.
    #[error("no vector index found{}; ingest documents first", location_suffix(.location))]
    IndexNotFound {
        /// The location that was probed, if any.
        location: Option<PathBuf>,
    },

    /// The index exists but holds zero entries.
    #[error("the vector index is empty; ingest documents first")]
    IndexEmpty,

    /// A vector's length differs from the index dimensionality.
    #[error("dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The persisted index failed validation on load.
    #[error("corrupt index at {}: {message}", .path.display())]
    CorruptIndex {
        /// The index directory.
        path: PathBuf,
        /// A description of the inconsistency.
        message: String,
    },

    /// Filesystem failure while saving or loading.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Index metadata could not be (de)serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// Build an [`RagError::Embedding`] for the given provider.
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Embedding { provider: provider.into(), message: message.into() }
    }

    /// Whether the user can fix this by ingesting documents.
    pub fn is_missing_index(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. } | Self::IndexEmpty)
    }
}

fn location_suffix(location: &Option<PathBuf>) -> String {
    location.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default()
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
