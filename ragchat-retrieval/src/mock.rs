//! Deterministic, offline embedding provider.
//!
//! [`HashingEmbedder`] embeds text as a hashed bag of lowercase word tokens.
//! Texts that share words get similar vectors, which is enough for demos
//! and tests that must run without API keys.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Hashed bag-of-words embeddings of a fixed dimensionality.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }
}

fn token_hash(token: &str) -> u64 {
    // FNV-1a
    token.bytes().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "Hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut tokens = 0usize;
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let slot = (token_hash(&token.to_lowercase()) % self.dimensions as u64) as usize;
            vector[slot] += 1.0;
            tokens += 1;
        }
        if tokens == 0 {
            return Err(RagError::embedding("Hashing", "text contains no word tokens"));
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        vector.iter_mut().for_each(|x| *x /= norm);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
