use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    application::dtos::HealthStatusResponse,
    domain::{AnswerResult, DomainError, IndexedChunk},
};

use super::{qa_chain::RetrievalQa, retriever::Retriever};

/// High level configuration shared by the service and its adapters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub target_source_chunks: usize,
    pub return_source_documents: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            target_source_chunks: 4,
            return_source_documents: true,
        }
    }
}

impl ServiceConfig {
    pub fn new(target_source_chunks: usize) -> Self {
        Self {
            target_source_chunks,
            ..Self::default()
        }
    }
}

/// Abstraction over any embedding engine (FastEmbed, hash embedder, etc).
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    fn model_name(&self) -> &str;

    fn dims(&self) -> Option<usize> {
        None
    }
}

/// Read side of the persisted similarity index.
pub trait VectorStore: Send + Sync {
    /// Up to `limit` records ranked by similarity to `vector`, best first.
    fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<(IndexedChunk, f32)>, DomainError>;

    fn count(&self) -> Result<usize, DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// Given prompt text, produce completion text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, DomainError>;

    /// Label of the runtime behind this generator, e.g. `LlamaCpp`.
    fn backend(&self) -> &str;
}

/// Answers questions by retrieving context and asking the language model.
pub struct AnswerService {
    embedder: Arc<dyn EmbeddingEngine>,
    store: Arc<dyn VectorStore>,
    qa: RetrievalQa,
}

impl AnswerService {
    pub fn new(
        embedder: Arc<dyn EmbeddingEngine>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        config: ServiceConfig,
    ) -> Self {
        let retriever = Retriever::new(
            Arc::clone(&embedder),
            Arc::clone(&store),
            config.target_source_chunks,
        );
        let qa = RetrievalQa::new(retriever, generator, config.return_source_documents);

        Self {
            embedder,
            store,
            qa,
        }
    }

    pub fn ask(&self, question: &str) -> Result<AnswerResult, DomainError> {
        let start = Instant::now();
        let output = self.qa.run(question)?;
        let elapsed = start.elapsed();

        let documents = output.source_documents.unwrap_or_default();
        info!(
            target: "askdocs::answer",
            question_chars = question.chars().count(),
            documents = documents.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "answered question"
        );

        Ok(AnswerResult {
            answer: output.result,
            documents,
            elapsed,
        })
    }

    pub fn health(&self) -> Result<HealthStatusResponse, DomainError> {
        self.store.ping()?;
        let indexed_chunks = self.store.count()?;
        debug!(target: "askdocs::answer", indexed_chunks, "index reachable");

        Ok(HealthStatusResponse {
            ok: true,
            message: "ready".into(),
            indexed_chunks,
            embedding_model: self.embedder.model_name().to_string(),
            model_type: self.qa.backend().to_string(),
            checked_at: Utc::now(),
            uptime_seconds: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        application::services::testing::{
            seeded_store, test_embedder, ConcurrencyTrackingGenerator, DelayedGenerator,
            FailingGenerator, StaticGenerator,
        },
        domain::DocumentChunk,
        infrastructure::SledVectorStore,
    };

    fn service_with(
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        k: usize,
    ) -> AnswerService {
        AnswerService::new(test_embedder(), store, generator, ServiceConfig::new(k))
    }

    #[test]
    fn answers_with_at_most_k_documents() {
        let (_dir, store) = seeded_store(&[
            ("a.txt", "rust ownership and borrowing"),
            ("b.txt", "rust lifetimes explained"),
            ("c.txt", "cooking pasta at home"),
            ("d.txt", "borrowing rules in rust"),
            ("e.txt", "gardening for beginners"),
            ("f.txt", "async rust with tokio"),
        ]);
        let service = service_with(store, Arc::new(StaticGenerator::new("ownership")), 4);

        let result = service.ask("how does borrowing work in rust?").unwrap();
        assert_eq!(result.answer, "ownership");
        assert_eq!(result.documents.len(), 4);
    }

    #[test]
    fn empty_index_yields_no_documents() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SledVectorStore::open(dir.path()).unwrap());
        let service = service_with(store, Arc::new(StaticGenerator::new("I don't know")), 4);

        let result = service.ask("anything there?").unwrap();
        assert!(result.documents.is_empty());
        assert_eq!(result.answer, "I don't know");
    }

    #[test]
    fn single_chunk_is_returned_verbatim() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let service = service_with(store, Arc::new(StaticGenerator::new("4")), 4);

        let result = service.ask("What is 2+2?").unwrap();
        assert_eq!(result.answer, "4");
        assert_eq!(result.documents, vec![DocumentChunk::new("doc1.txt", "math facts")]);
    }

    #[test]
    fn elapsed_covers_generation_delay() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let delay = Duration::from_millis(40);
        let service = service_with(store, Arc::new(DelayedGenerator::new("4", delay)), 4);

        let result = service.ask("What is 2+2?").unwrap();
        assert!(result.elapsed >= delay);
        assert!(result.time_taken() >= delay.as_secs_f64());
    }

    #[test]
    fn generation_failure_propagates() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let service = service_with(store, Arc::new(FailingGenerator), 4);

        let err = service.ask("What is 2+2?").unwrap_err();
        assert!(matches!(err, DomainError::Generation(_)));
    }

    #[test]
    fn blank_question_is_answered_without_documents() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let service = service_with(store, Arc::new(StaticGenerator::new("4")), 4);

        let result = service.ask("  \n").unwrap();
        assert_eq!(result.answer, "4");
        assert!(result.documents.is_empty());
    }

    #[test]
    fn one_generation_in_flight_across_threads() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let generator = Arc::new(ConcurrencyTrackingGenerator::new(Duration::from_millis(20)));
        let service = Arc::new(service_with(store, generator.clone(), 4));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || service.ask(&format!("question {i}")).unwrap())
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(generator.calls(), 4);
        assert_eq!(generator.max_in_flight(), 1);
    }

    #[test]
    fn sources_omitted_when_chain_does_not_return_them() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts")]);
        let config = ServiceConfig {
            target_source_chunks: 4,
            return_source_documents: false,
        };
        let service = AnswerService::new(
            test_embedder(),
            store,
            Arc::new(StaticGenerator::new("4")),
            config,
        );

        let result = service.ask("What is 2+2?").unwrap();
        assert_eq!(result.answer, "4");
        assert!(result.documents.is_empty());
    }

    #[test]
    fn health_reports_index_and_backend() {
        let (_dir, store) = seeded_store(&[("doc1.txt", "math facts"), ("doc2.txt", "more")]);
        let service = service_with(store, Arc::new(StaticGenerator::new("4")), 4);

        let health = service.health().unwrap();
        assert!(health.ok);
        assert_eq!(health.indexed_chunks, 2);
        assert_eq!(health.embedding_model, "stub");
        assert_eq!(health.model_type, "static");
    }
}
