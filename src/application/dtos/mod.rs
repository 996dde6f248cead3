use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AnswerResult, DocumentChunk, DomainError};

/// Question as accepted on `POST /question`, either as query string or JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

/// Response envelope for a successfully answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub documents: Vec<DocumentChunk>,
    pub time_taken: f64,
}

impl From<AnswerResult> for AnswerResponse {
    fn from(value: AnswerResult) -> Self {
        let time_taken = value.time_taken();
        Self {
            answer: value.answer,
            documents: value.documents,
            time_taken,
        }
    }
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub ok: bool,
    pub message: String,
    pub indexed_chunks: usize,
    pub embedding_model: String,
    pub model_type: String,
    pub checked_at: DateTime<Utc>,
    /// Filled in by the HTTP layer, which owns the process start time.
    #[serde(default)]
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(value: &DomainError) -> Self {
        Self::new(value.to_string(), value.code())
    }
}
