use std::path::Path;

use bincode::Options;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sled::{Config, Db, IVec, Tree};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::services::VectorStore,
    domain::{DomainError, IndexedChunk},
};

const CHUNKS_TREE: &str = "chunks";

/// Persisted vector index backed by `sled`.
///
/// Full `IndexedChunk` payloads live in a single tree. Similarity is computed
/// in-memory with cosine similarity over every record.
pub struct SledVectorStore {
    db: Db,
    chunks: Tree,
    write_lock: Mutex<()>,
}

impl SledVectorStore {
    /// Opens (or creates) the index rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();

        let db = Config::default()
            .path(&dir)
            .cache_capacity(64 * 1024 * 1024)
            .mode(sled::Mode::HighThroughput)
            .open()
            .map_err(|err| {
                DomainError::storage(format!("failed to open index at {}: {err}", dir.display()))
            })?;

        let chunks = db
            .open_tree(CHUNKS_TREE)
            .map_err(|err| DomainError::storage(format!("failed to open chunks tree: {err}")))?;

        info!(
            target: "askdocs::storage",
            path = %dir.display(),
            records = chunks.len(),
            "vector index opened"
        );

        Ok(Self {
            db,
            chunks,
            write_lock: Mutex::new(()),
        })
    }

    /// Writes one chunk and flushes. Used to seed an index; never on the request path.
    pub fn insert(&self, chunk: &IndexedChunk) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let bytes = Self::serialize(chunk)?;
        self.chunks
            .insert(Self::encode_key(&chunk.id), bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist chunk: {err}")))?;

        self.chunks
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush chunks: {err}")))?;

        Ok(())
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
    }

    fn encode_key(id: &Uuid) -> [u8; 16] {
        *id.as_bytes()
    }

    fn decode_chunk(bytes: &IVec) -> Result<IndexedChunk, DomainError> {
        Self::deserialize(bytes.as_ref())
    }

    fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, DomainError> {
        if query.len() != candidate.len() {
            return Err(DomainError::embedding(format!(
                "embedding dimension mismatch: query {} vs indexed {}",
                query.len(),
                candidate.len()
            )));
        }

        let mut dot = 0.0f32;
        let mut q_norm = 0.0f32;
        let mut c_norm = 0.0f32;

        for (q, c) in query.iter().zip(candidate.iter()) {
            dot += q * c;
            q_norm += q * q;
            c_norm += c * c;
        }

        let denom = q_norm.sqrt() * c_norm.sqrt();
        if denom == 0.0 {
            return Ok(0.0);
        }

        Ok((dot / denom).clamp(-1.0, 1.0))
    }
}

impl VectorStore for SledVectorStore {
    fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<(IndexedChunk, f32)>, DomainError> {
        let mut scored: Vec<(IndexedChunk, f32)> = Vec::new();

        for entry in self.chunks.iter() {
            let (_, value) = entry
                .map_err(|err| DomainError::storage(format!("failed to read chunk record: {err}")))?;
            let chunk = Self::decode_chunk(&value)?;
            let score = Self::cosine_similarity(vector, &chunk.embedding.vector)?;

            scored.push((chunk, score));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored)
    }

    fn count(&self) -> Result<usize, DomainError> {
        Ok(self.chunks.len())
    }

    fn ping(&self) -> Result<(), DomainError> {
        self.db
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush db: {err}")))?;

        Ok(())
    }
}
