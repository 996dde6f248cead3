//! Domain layer: retrieved chunks, answers, and the shared error type.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{AnswerResult, ChunkEmbedding, DocumentChunk, IndexedChunk};
