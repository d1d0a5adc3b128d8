//! Text splitting into bounded-size [`Chunk`]s.
//!
//! The index never re-splits; whatever produces documents is expected to
//! hand over chunks already cut to size. [`FixedSizeSplitter`] is the
//! splitter the command-line ingest uses.

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting extracted document text into chunks.
pub trait TextSplitter: Send + Sync {
    /// Split `text` into chunks tagged with `source`.
    ///
    /// Returns an empty `Vec` if `text` is blank.
    fn split(&self, text: &str, source: Option<&str>) -> Vec<Chunk>;
}

/// Splits text into fixed-size windows of characters with overlap.
///
/// Windows are counted in `char`s, not bytes, so multi-byte text (for
/// example Japanese) is never cut inside a code point. Each chunk carries
/// a `chunk_index` metadata entry.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_retrieval::{FixedSizeSplitter, TextSplitter};
///
/// let splitter = FixedSizeSplitter::new(500, 100)?;
/// let chunks = splitter.split(&text, Some("manual.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeSplitter {
    /// Create a new `FixedSizeSplitter`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Default for FixedSizeSplitter {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 100 }
    }
}

impl TextSplitter for FixedSizeSplitter {
    fn split(&self, text: &str, source: Option<&str>) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                let mut chunk = Chunk::new(trimmed)
                    .with_metadata("chunk_index", chunks.len().to_string());
                chunk.source = source.map(str::to_string);
                chunks.push(chunk);
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
