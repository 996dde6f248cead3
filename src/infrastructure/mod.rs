//! Infrastructure layer wiring concrete adapters (embeddings, storage, model runtimes).

pub mod embeddings;
pub mod llm;
pub mod storage;

#[cfg(feature = "fastembed-engine")]
pub use embeddings::FastEmbedEngine;
pub use embeddings::SimpleEmbedEngine;
pub use llm::{build_generator, Gpt4AllBackend, LlamaCppBackend};
pub use storage::SledVectorStore;
