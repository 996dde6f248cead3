use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The incoming question was missing or blank.
    #[error("validation error: {0}")]
    Validation(String),

    /// Startup configuration was missing, malformed, or unsupported.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The question could not be embedded, or vectors did not line up.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// The vector index could not be opened or read.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The language model runtime failed to produce a completion.
    #[error("generation failure: {0}")]
    Generation(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable machine-readable code surfaced in HTTP error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "INVALID_QUESTION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Embedding(_) | Self::Storage(_) => "RETRIEVAL_FAILED",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
