//! Configuration for ingestion and retrieval.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default directory holding the current index.
pub const DEFAULT_INDEX_PATH: &str = "vector_store";

/// Configuration parameters for ingestion and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum relevance score for results (results below this are filtered out).
    pub score_threshold: f32,
    /// Maximum number of texts sent in a single embedding call.
    pub embed_batch_size: usize,
    /// Directory holding the persisted index.
    pub index_path: PathBuf,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            score_threshold: 0.3,
            embed_batch_size: 16,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum relevance threshold for filtering results.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.config.score_threshold = threshold;
        self
    }

    /// Set how many texts are embedded per provider call.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the directory holding the persisted index.
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if:
    /// - `top_k == 0`
    /// - `score_threshold` is outside `[0, 1]`
    /// - `embed_batch_size == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Configuration("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.config.score_threshold) {
            return Err(RagError::Configuration(format!(
                "score_threshold ({}) must be within [0, 1]",
                self.config.score_threshold
            )));
        }
        if self.config.embed_batch_size == 0 {
            return Err(RagError::Configuration(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.top_k, 3);
        assert_eq!(config.score_threshold, 0.3);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().score_threshold(1.5).build().is_err());
        assert!(RagConfig::builder().score_threshold(f32::NAN).build().is_err());
        assert!(RagConfig::builder().embed_batch_size(0).build().is_err());
    }
}
