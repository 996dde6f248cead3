use ahash::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

use crate::{application::services::EmbeddingEngine, domain::DomainError};

const MIN_DIMS: usize = 8;
const MAX_DIMS: usize = 4096;

// Fixed seeds keep token buckets identical across processes. Buckets can still move
// with an `ahash` upgrade or a different target CPU, so an index built by one binary
// should be queried by the same binary.
const TOKEN_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// A lightweight, deterministic embedding engine that hashes tokens into a fixed-size vector.
/// Not meant for production-grade semantic search; it keeps the service usable offline
/// and gives tests a stable embedder.
pub struct SimpleEmbedEngine {
    model_name: String,
    dimensions: usize,
    hasher: RandomState,
}

impl SimpleEmbedEngine {
    pub fn try_new(model_name: impl Into<String>, dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::configuration(
                "embedding dimensions must be greater than zero",
            ));
        }
        Ok(Self::new(model_name, dimensions))
    }

    pub fn new(model_name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimensions: dimensions.clamp(MIN_DIMS, MAX_DIMS),
            hasher: RandomState::with_seeds(
                TOKEN_SEEDS[0],
                TOKEN_SEEDS[1],
                TOKEN_SEEDS[2],
                TOKEN_SEEDS[3],
            ),
        }
    }

    fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        text.split(|c: char| c.is_ascii_whitespace() || c.is_ascii_punctuation())
            .filter(move |token| !token.is_empty())
    }

    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = self.hasher.build_hasher();
        token.to_lowercase().hash(&mut hasher);
        hasher.finish() as usize
    }

    fn embed_internal(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in self.tokenize(text) {
            let idx = self.hash_token(token) % self.dimensions;
            vector[idx] += 1.0;
        }

        // L2 normalize to keep scores in [-1, 1]
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl EmbeddingEngine for SimpleEmbedEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text payload cannot be empty"));
        }
        Ok(self.embed_internal(text))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
