//! Data types for chunks, indexed entries, and retrieval results.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of an entry in a [`VectorIndex`](crate::VectorIndex).
///
/// Ids are sequence numbers assigned at insertion time. They are never
/// reused within an index and survive a save/load round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded-size fragment of a source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Identifier of the originating document (file path, URL, ...).
    ///
    /// Chunks without a source still contribute prompt context but never
    /// produce a citation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Key-value metadata attached by the splitter or the caller.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Create a chunk with no source and no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: None, metadata: HashMap::new() }
    }

    /// Set the source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A [`Chunk`] paired with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    /// The embedded chunk.
    pub chunk: Chunk,
    /// The embedding vector. All vectors in one index share a length.
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// A chunk returned by a similarity search, with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    /// Id of the index entry the chunk was stored under.
    pub id: DocumentId,
    /// The retrieved chunk (without its vector).
    pub chunk: Chunk,
    /// Relevance score in `[0, 1]`; higher is more relevant.
    pub score: f32,
}

impl RetrievedDocument {
    /// The chunk's source, if it has one.
    pub fn source(&self) -> Option<&str> {
        self.chunk.source.as_deref()
    }

    /// The chunk's text.
    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}
