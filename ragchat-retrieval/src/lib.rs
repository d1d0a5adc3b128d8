//! # ragchat-retrieval
//!
//! Retrieval side of the ragchat assistant: the persistent vector index,
//! the ingestion pipeline that fills it, and the threshold/top-k retriever
//! that answers queries against it.
//!
//! ## Overview
//!
//! - [`VectorIndex`] - append-only, mergeable index with exact save/load
//! - [`IngestionPipeline`] - embeds chunk batches and creates or merges the index
//! - [`Retriever`] - embeds a query, searches, and filters by score threshold
//! - [`EmbeddingProvider`] - the embedding gateway trait
//! - [`FixedSizeSplitter`] - character-window splitter producing [`Chunk`]s
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_retrieval::{Chunk, HashingEmbedder, IngestionPipeline, RagConfig, Retriever};
//!
//! let embedder = Arc::new(HashingEmbedder::new(256));
//! let mut pipeline = IngestionPipeline::new(embedder.clone(), 16);
//! pipeline.ingest(vec![Chunk::new("Paris is the capital of France").with_source("doc1")]).await?;
//! pipeline.save("vector_store")?;
//!
//! let index = ragchat_retrieval::VectorIndex::load("vector_store")?;
//! let retriever = Retriever::new(embedder, &RagConfig::default());
//! let docs = retriever.retrieve(Some(&index), "What is the capital of France?").await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retriever;
pub mod splitter;

pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, DocumentId, EmbeddedChunk, RetrievedDocument};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use ingest::IngestionPipeline;
pub use mock::HashingEmbedder;
#[cfg(feature = "openai")]
pub use openai::{AzureOpenAIEmbeddingProvider, OpenAIEmbeddingProvider};
pub use retriever::Retriever;
pub use splitter::{FixedSizeSplitter, TextSplitter};
