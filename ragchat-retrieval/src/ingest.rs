//! Ingestion pipeline: embed chunk batches and grow the running index.
//!
//! Documents usually arrive in several batches (one per uploaded file). The
//! first successful batch creates the index; later batches are merged into
//! it without touching earlier entries. Persisting is a separate, explicit
//! [`save`](IngestionPipeline::save) once every batch has succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragchat_retrieval::IngestionPipeline;
//!
//! let mut pipeline = IngestionPipeline::new(embedder, 16);
//! for file_chunks in files {
//!     pipeline.ingest(file_chunks).await?;
//! }
//! pipeline.save("vector_store")?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{Chunk, EmbeddedChunk};
use crate::embedding::{EmbeddingProvider, validate_vector};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Builds or extends a [`VectorIndex`] one batch of chunks at a time.
pub struct IngestionPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    embed_batch_size: usize,
    index: Option<VectorIndex>,
}

impl IngestionPipeline {
    /// Create a pipeline that starts without an index.
    ///
    /// `embed_batch_size` caps how many texts go into one
    /// [`embed_batch`](EmbeddingProvider::embed_batch) call; zero is treated as one.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, embed_batch_size: usize) -> Self {
        Self { embedder, embed_batch_size: embed_batch_size.max(1), index: None }
    }

    /// Create a pipeline batching embedding calls by `config.embed_batch_size`.
    pub fn from_config(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self::new(embedder, config.embed_batch_size)
    }

    /// Maximum number of texts per embedding call.
    pub fn embed_batch_size(&self) -> usize {
        self.embed_batch_size
    }

    /// Continue ingesting into an existing index (for example one just loaded from disk).
    pub fn with_index(mut self, index: VectorIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// The running index, if any batch has been ingested.
    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    /// Consume the pipeline and return the running index.
    pub fn into_index(self) -> Option<VectorIndex> {
        self.index
    }

    /// Embed one batch of chunks and add it to the running index.
    ///
    /// The batch is all-or-nothing: if any chunk fails to embed, nothing
    /// from this batch is added. Batches ingested earlier stay in place.
    ///
    /// # Errors
    ///
    /// - [`RagError::Embedding`] if the provider fails or returns unusable vectors
    /// - [`RagError::DimensionMismatch`] if the batch disagrees with the running index
    /// - [`RagError::EmptyInput`] if `chunks` is empty and no index exists yet
    pub async fn ingest(&mut self, chunks: Vec<Chunk>) -> Result<&VectorIndex> {
        if chunks.is_empty() {
            return match self.index {
                Some(ref index) => {
                    warn!("skipping empty ingestion batch");
                    Ok(index)
                }
                None => Err(RagError::EmptyInput),
            };
        }

        let chunk_count = chunks.len();
        let vectors = self.embed_all(&chunks).await?;
        let embedded: Vec<EmbeddedChunk> =
            chunks.into_iter().zip(vectors).map(|(c, v)| EmbeddedChunk::new(c, v)).collect();

        let index = match self.index.take() {
            None => VectorIndex::create(embedded)?,
            Some(mut index) => {
                if let Err(e) = index.merge(embedded) {
                    error!(error = %e, "rejected ingestion batch");
                    self.index = Some(index);
                    return Err(e);
                }
                index
            }
        };

        info!(chunk_count, total = index.len(), "ingested batch");
        let index: &VectorIndex = self.index.insert(index);
        Ok(index)
    }

    /// Persist the running index to `location`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotFound`] if nothing has been ingested yet.
    pub fn save(&self, location: impl AsRef<Path>) -> Result<()> {
        self.index
            .as_ref()
            .ok_or(RagError::IndexNotFound { location: None })?
            .save(location)
    }

    async fn embed_all(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let provider = self.embedder.name();
        let dimensions = self.embedder.dimensions();
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.embed_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let batch_vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(provider, error = %e, "embedding failed during ingestion");
                e
            })?;
            if batch_vectors.len() != texts.len() {
                return Err(RagError::embedding(
                    provider,
                    format!("requested {} embeddings, received {}", texts.len(), batch_vectors.len()),
                ));
            }
            for vector in &batch_vectors {
                validate_vector(provider, vector, dimensions)?;
            }
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }
}
