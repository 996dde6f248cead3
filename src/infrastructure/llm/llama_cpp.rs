use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::TextGenerator,
    domain::DomainError,
    settings::{ModelKind, ModelSettings},
};

use super::{build_agent, generation_error, validate_endpoint};

/// Client for a llama.cpp server's native `/completion` endpoint.
pub struct LlamaCppBackend {
    completion_url: String,
    model_path: String,
    max_tokens: usize,
    n_batch: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n_predict: usize,
    n_batch: usize,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

impl LlamaCppBackend {
    pub fn new(settings: &ModelSettings) -> Result<Self, DomainError> {
        let base = validate_endpoint(settings.endpoint())?;
        Ok(Self {
            completion_url: format!("{base}/completion"),
            model_path: settings.model_path.clone(),
            max_tokens: settings.max_tokens,
            n_batch: settings.n_batch,
            agent: build_agent(),
        })
    }
}

impl TextGenerator for LlamaCppBackend {
    fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        let request = CompletionRequest {
            model: &self.model_path,
            prompt,
            n_predict: self.max_tokens,
            n_batch: self.n_batch,
            stream: false,
        };

        debug!(target: "askdocs::llm", url = %self.completion_url, "llama.cpp completion");
        let response = self
            .agent
            .post(&self.completion_url)
            .send_json(&request)
            .map_err(|err| generation_error(self.backend(), err))?;

        let body: CompletionResponse = response.into_json().map_err(|err| {
            DomainError::generation(format!("malformed llama.cpp completion: {err}"))
        })?;

        Ok(body.content)
    }

    fn backend(&self) -> &str {
        ModelKind::LlamaCpp.label()
    }
}
