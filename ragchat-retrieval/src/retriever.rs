//! Threshold-and-top-k retrieval over a loaded [`VectorIndex`].

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::document::RetrievedDocument;
use crate::embedding::{EmbeddingProvider, validate_vector};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Embeds a query, searches the index, and drops low-scoring results.
///
/// `top_k` and `score_threshold` are fixed at construction, so every
/// turn served by one retriever uses the same policy.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    score_threshold: f32,
}

impl Retriever {
    /// Create a retriever using the `top_k` and `score_threshold` from `config`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self { embedder, top_k: config.top_k, score_threshold: config.score_threshold }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Retrieve up to `top_k` documents scoring at least `score_threshold`.
    ///
    /// An empty result means nothing relevant was found; it is not an error.
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexNotFound`] if `index` is `None`
    /// - [`RagError::IndexEmpty`] if the index has zero entries
    /// - [`RagError::Embedding`] if the query cannot be embedded
    pub async fn retrieve(
        &self,
        index: Option<&VectorIndex>,
        query: &str,
    ) -> Result<Vec<RetrievedDocument>> {
        let index = index.ok_or(RagError::IndexNotFound { location: None })?;

        let provider = self.embedder.name();
        let query_vector = self.embedder.embed(query).await.map_err(|e| {
            error!(provider, error = %e, "embedding failed during retrieval");
            e
        })?;
        validate_vector(provider, &query_vector, self.embedder.dimensions())?;

        let results = index.search(&query_vector, self.top_k)?;
        let candidates = results.len();
        let threshold = self.score_threshold;
        let filtered: Vec<RetrievedDocument> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        debug!(
            scores = ?filtered.iter().map(|r| r.score).collect::<Vec<_>>(),
            "retrieved documents"
        );
        info!(candidates, result_count = filtered.len(), threshold, "retrieval completed");
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, EmbeddedChunk};
    use crate::mock::HashingEmbedder;

    async fn index_of(embedder: &HashingEmbedder, texts: &[(&str, &str)]) -> VectorIndex {
        let mut embedded = Vec::new();
        for (text, source) in texts {
            let vector = embedder.embed(text).await.unwrap();
            embedded.push(EmbeddedChunk::new(Chunk::new(*text).with_source(*source), vector));
        }
        VectorIndex::create(embedded).unwrap()
    }

    #[tokio::test]
    async fn missing_index_is_reported() {
        let retriever = Retriever::new(Arc::new(HashingEmbedder::new(64)), &RagConfig::default());
        let err = retriever.retrieve(None, "anything").await.unwrap_err();
        assert!(matches!(err, RagError::IndexNotFound { location: None }));
    }

    #[tokio::test]
    async fn capital_question_finds_the_paris_chunk() {
        let embedder = HashingEmbedder::new(256);
        let index = index_of(&embedder, &[("Paris is the capital of France", "doc1")]).await;
        let config = RagConfig::builder().top_k(3).score_threshold(0.2).build().unwrap();
        let retriever = Retriever::new(Arc::new(embedder), &config);

        let docs = retriever.retrieve(Some(&index), "What is the capital of France?").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source(), Some("doc1"));
    }

    #[tokio::test]
    async fn nothing_above_threshold_is_empty_not_an_error() {
        let embedder = HashingEmbedder::new(256);
        let index = index_of(&embedder, &[("Paris is the capital of France", "doc1")]).await;
        let config = RagConfig::builder().score_threshold(1.0).build().unwrap();
        let retriever = Retriever::new(Arc::new(embedder), &config);

        let docs = retriever.retrieve(Some(&index), "completely unrelated bananas").await.unwrap();
        assert!(docs.is_empty());
    }
}
