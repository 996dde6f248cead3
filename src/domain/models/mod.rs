use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A retrieved unit of text with its provenance label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub source: String,
    pub content: String,
}

impl DocumentChunk {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Record persisted in the vector index: chunk text, provenance and embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: Uuid,
    pub source: String,
    pub content: String,
    pub embedding: ChunkEmbedding,
}

impl IndexedChunk {
    pub fn new(
        source: impl Into<String>,
        content: impl Into<String>,
        embedding: ChunkEmbedding,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: sanitize_single_line(source),
            content: content.into(),
            embedding,
        }
    }

    pub fn as_document(&self) -> DocumentChunk {
        DocumentChunk {
            source: self.source.clone(),
            content: self.content.clone(),
        }
    }
}

/// Vector representation of a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub model: String,
    pub vector: Vec<f32>,
}

impl ChunkEmbedding {
    pub fn new(model: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            model: model.into(),
            vector,
        }
    }

    pub fn dims(&self) -> usize {
        self.vector.len()
    }
}

/// Outcome of answering one question. Lives for a single request.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub documents: Vec<DocumentChunk>,
    pub elapsed: Duration,
}

impl AnswerResult {
    /// Wall-clock seconds spent on retrieval plus generation.
    pub fn time_taken(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

fn sanitize_single_line(input: impl Into<String>) -> String {
    input
        .into()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
