//! Stub collaborators shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::{
    domain::{ChunkEmbedding, DomainError, IndexedChunk},
    infrastructure::{SimpleEmbedEngine, SledVectorStore},
};

use super::{EmbeddingEngine, TextGenerator, VectorStore};

pub(crate) const TEST_MODEL: &str = "stub";
pub(crate) const TEST_DIMS: usize = 256;

pub(crate) fn test_embedder() -> Arc<dyn EmbeddingEngine> {
    Arc::new(SimpleEmbedEngine::new(TEST_MODEL, TEST_DIMS))
}

/// Opens a sled index in a temp dir and inserts one chunk per `(source, content)`.
pub(crate) fn seeded_store(chunks: &[(&str, &str)]) -> (TempDir, Arc<dyn VectorStore>) {
    let dir = TempDir::new().expect("temp dir");
    let store = SledVectorStore::open(dir.path()).expect("open store");
    let embedder = SimpleEmbedEngine::new(TEST_MODEL, TEST_DIMS);

    for (source, content) in chunks {
        let vector = embedder.embed(content).expect("embed chunk");
        let chunk = IndexedChunk::new(*source, *content, ChunkEmbedding::new(TEST_MODEL, vector));
        store.insert(&chunk).expect("insert chunk");
    }

    (dir, Arc::new(store))
}

pub(crate) struct StaticGenerator {
    answer: String,
}

impl StaticGenerator {
    pub(crate) fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl TextGenerator for StaticGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
        Ok(self.answer.clone())
    }

    fn backend(&self) -> &str {
        "static"
    }
}

pub(crate) struct DelayedGenerator {
    answer: String,
    delay: Duration,
}

impl DelayedGenerator {
    pub(crate) fn new(answer: impl Into<String>, delay: Duration) -> Self {
        Self {
            answer: answer.into(),
            delay,
        }
    }
}

impl TextGenerator for DelayedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
        std::thread::sleep(self.delay);
        Ok(self.answer.clone())
    }

    fn backend(&self) -> &str {
        "delayed"
    }
}

pub(crate) struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
        Err(DomainError::generation("model runtime unavailable"))
    }

    fn backend(&self) -> &str {
        "failing"
    }
}

pub(crate) struct RecordingGenerator {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub(crate) fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    fn backend(&self) -> &str {
        "recording"
    }
}

/// Counts how many `generate` calls overlap.
pub(crate) struct ConcurrencyTrackingGenerator {
    hold: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyTrackingGenerator {
    pub(crate) fn new(hold: Duration) -> Self {
        Self {
            hold,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ConcurrencyTrackingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, DomainError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        std::thread::sleep(self.hold);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("done".into())
    }

    fn backend(&self) -> &str {
        "tracking"
    }
}
