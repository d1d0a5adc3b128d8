//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (OpenAI, Azure OpenAI,
/// local hashing, ...) behind a unified async interface. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
///
/// Providers must fail loudly: a malformed input, a quota or auth error,
/// or an empty response is an error, never a zero vector.
///
/// # Example
///
/// ```rust,ignore
/// use ragchat_retrieval::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Check that a vector is usable for similarity search.
///
/// Rejects wrong lengths, non-finite components, and zero vectors.
pub(crate) fn validate_vector(provider: &str, vector: &[f32], dimensions: usize) -> Result<()> {
    if vector.len() != dimensions {
        return Err(RagError::embedding(
            provider,
            format!("expected {dimensions} dimensions, got {}", vector.len()),
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(RagError::embedding(provider, "vector contains non-finite values"));
    }
    if vector.iter().all(|v| *v == 0.0) {
        return Err(RagError::embedding(provider, "vector has zero magnitude"));
    }
    Ok(())
}
