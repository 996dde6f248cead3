//! Language model backends.
//!
//! Each backend is a blocking HTTP client for a locally running inference
//! runtime that owns the model weights. Exactly one is built at startup from
//! the configured `MODEL_TYPE`.

mod gpt4all;
mod llama_cpp;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

pub use gpt4all::Gpt4AllBackend;
pub use llama_cpp::LlamaCppBackend;

use crate::{
    application::services::TextGenerator,
    domain::DomainError,
    settings::{ModelKind, ModelSettings},
};

/// Generations run to completion; the agent only bounds a wedged runtime.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BODY_LIMIT: usize = 512;

/// Build the generator for the configured runtime.
pub fn build_generator(settings: &ModelSettings) -> Result<Arc<dyn TextGenerator>, DomainError> {
    let generator: Arc<dyn TextGenerator> = match settings.kind {
        ModelKind::LlamaCpp => Arc::new(LlamaCppBackend::new(settings)?),
        ModelKind::Gpt4All => Arc::new(Gpt4AllBackend::new(settings)?),
    };

    info!(
        target: "askdocs::llm",
        backend = generator.backend(),
        endpoint = settings.endpoint(),
        model = %settings.model_path,
        max_tokens = settings.max_tokens,
        n_batch = settings.n_batch,
        "language model backend ready"
    );

    Ok(generator)
}

fn build_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout(GENERATION_TIMEOUT)
        .build()
}

fn validate_endpoint(endpoint: &str) -> Result<String, DomainError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DomainError::configuration(format!(
            "model endpoint `{endpoint}` must be an http(s) URL"
        )));
    }
    Ok(trimmed.to_string())
}

/// Error envelope some runtimes send alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct RuntimeError {
    error: serde_json::Value,
}

fn generation_error(backend: &str, error: ureq::Error) -> DomainError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let detail = serde_json::from_str::<RuntimeError>(&body)
                .map(|envelope| match envelope.error {
                    serde_json::Value::String(message) => message,
                    other => other
                        .get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| other.to_string()),
                })
                .unwrap_or_else(|_| body.chars().take(ERROR_BODY_LIMIT).collect());
            DomainError::generation(format!("{backend} runtime returned HTTP {code}: {detail}"))
        }
        ureq::Error::Transport(transport) => {
            DomainError::generation(format!("{backend} runtime unreachable: {transport}"))
        }
    }
}
