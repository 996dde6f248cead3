use std::sync::Arc;

use tracing::debug;

use crate::domain::{DocumentChunk, DomainError};

use super::{EmbeddingEngine, VectorStore};

/// Binds an embedding engine to the vector index: question in, top-k chunks out.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingEngine>,
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingEngine>, store: Arc<dyn VectorStore>, k: usize) -> Self {
        Self { embedder, store, k }
    }

    /// Chunks ordered by similarity, best first. Fewer than `k` (or none) is fine.
    /// A blank question has nothing to match and retrieves nothing.
    pub fn relevant_chunks(&self, question: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        let question = question.trim();
        if self.k == 0 || question.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(question)?;
        let matches = self.store.search(&query_vector, self.k)?;

        debug!(
            target: "askdocs::retriever",
            requested = self.k,
            returned = matches.len(),
            top_score = matches.first().map(|(_, score)| *score),
            "retrieved chunks"
        );

        Ok(matches
            .into_iter()
            .map(|(chunk, _score)| chunk.as_document())
            .collect())
    }
}
