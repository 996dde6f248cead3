//! Service layer: collaborator traits, retrieval, and answer orchestration.

mod answer_service;
mod qa_chain;
mod retriever;

#[cfg(test)]
pub(crate) mod testing;

pub use answer_service::{
    AnswerService, EmbeddingEngine, ServiceConfig, TextGenerator, VectorStore,
};
pub use qa_chain::{QaOutput, RetrievalQa};
pub use retriever::Retriever;
