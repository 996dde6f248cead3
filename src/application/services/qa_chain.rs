use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{DocumentChunk, DomainError};

use super::{retriever::Retriever, TextGenerator};

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Result of one retrieval-augmented generation pass.
#[derive(Debug, Clone)]
pub struct QaOutput {
    pub result: String,
    pub source_documents: Option<Vec<DocumentChunk>>,
}

/// Retrieval QA with the "stuff" strategy: every retrieved chunk goes into one prompt.
pub struct RetrievalQa {
    retriever: Retriever,
    generator: Arc<dyn TextGenerator>,
    return_source_documents: bool,
    // one generation in flight; runtimes are not assumed reentrant
    generation_lock: Mutex<()>,
}

impl RetrievalQa {
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn TextGenerator>,
        return_source_documents: bool,
    ) -> Self {
        Self {
            retriever,
            generator,
            return_source_documents,
            generation_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &str {
        self.generator.backend()
    }

    pub fn run(&self, question: &str) -> Result<QaOutput, DomainError> {
        let chunks = self.retriever.relevant_chunks(question)?;
        let prompt = build_prompt(question, &chunks);

        let completion = {
            let _guard = self.generation_lock.lock();
            debug!(
                target: "askdocs::qa",
                backend = self.generator.backend(),
                prompt_chars = prompt.chars().count(),
                "invoking language model"
            );
            self.generator.generate(&prompt)?
        };

        Ok(QaOutput {
            result: completion.trim().to_string(),
            source_documents: self.return_source_documents.then_some(chunks),
        })
    }
}

pub(crate) fn build_prompt(question: &str, chunks: &[DocumentChunk]) -> String {
    let context = chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{PROMPT_PREAMBLE}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}
