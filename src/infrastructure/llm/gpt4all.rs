use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::TextGenerator,
    domain::DomainError,
    settings::{ModelKind, ModelSettings},
};

use super::{build_agent, generation_error, validate_endpoint};

/// Model architecture the GPT4All runtime is asked to load the weights with.
pub const GPT4ALL_ARCHITECTURE: &str = "gptj";

/// Client for the GPT4All local API server (`/v1/completions`).
pub struct Gpt4AllBackend {
    completions_url: String,
    model_path: String,
    max_tokens: usize,
    n_batch: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    n_batch: usize,
    backend: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

impl Gpt4AllBackend {
    pub fn new(settings: &ModelSettings) -> Result<Self, DomainError> {
        let base = validate_endpoint(settings.endpoint())?;
        Ok(Self {
            completions_url: format!("{base}/v1/completions"),
            model_path: settings.model_path.clone(),
            max_tokens: settings.max_tokens,
            n_batch: settings.n_batch,
            agent: build_agent(),
        })
    }
}

impl TextGenerator for Gpt4AllBackend {
    fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        let request = CompletionsRequest {
            model: &self.model_path,
            prompt,
            max_tokens: self.max_tokens,
            n_batch: self.n_batch,
            backend: GPT4ALL_ARCHITECTURE,
            stream: false,
        };

        debug!(target: "askdocs::llm", url = %self.completions_url, "gpt4all completion");
        let response = self
            .agent
            .post(&self.completions_url)
            .send_json(&request)
            .map_err(|err| generation_error(self.backend(), err))?;

        let body: CompletionsResponse = response.into_json().map_err(|err| {
            DomainError::generation(format!("malformed GPT4All completion: {err}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| DomainError::generation("GPT4All returned no choices"))
    }

    fn backend(&self) -> &str {
        ModelKind::Gpt4All.label()
    }
}
