use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::DomainError;

pub const EMBEDDINGS_MODEL_NAME: &str = "EMBEDDINGS_MODEL_NAME";
pub const PERSIST_DIRECTORY: &str = "PERSIST_DIRECTORY";
pub const MODEL_TYPE: &str = "MODEL_TYPE";
pub const MODEL_PATH: &str = "MODEL_PATH";
pub const MODEL_N_CTX: &str = "MODEL_N_CTX";
pub const MODEL_N_BATCH: &str = "MODEL_N_BATCH";
pub const TARGET_SOURCE_CHUNKS: &str = "TARGET_SOURCE_CHUNKS";
pub const MODEL_ENDPOINT: &str = "MODEL_ENDPOINT";
pub const SERVICE_HOST: &str = "ASKDOCS_HOST";
pub const SERVICE_PORT: &str = "ASKDOCS_PORT";

const DEFAULT_N_BATCH: usize = 8;
const DEFAULT_TARGET_SOURCE_CHUNKS: usize = 4;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;

/// Names that select the built-in hash embedder instead of a downloadable model.
const SIMPLE_MODEL_ALIASES: [&str; 3] = ["stub", "simple", "askdocs/simple-hash"];

/// Language model runtimes this service can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    LlamaCpp,
    Gpt4All,
}

impl ModelKind {
    pub const SUPPORTED: [ModelKind; 2] = [ModelKind::LlamaCpp, ModelKind::Gpt4All];

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::LlamaCpp => "LlamaCpp",
            ModelKind::Gpt4All => "GPT4All",
        }
    }

    /// Base URL of the local runtime when `MODEL_ENDPOINT` is not set.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ModelKind::LlamaCpp => "http://127.0.0.1:8080",
            ModelKind::Gpt4All => "http://127.0.0.1:4891",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::SUPPORTED
            .into_iter()
            .find(|kind| kind.label() == value)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::SUPPORTED.iter().map(ModelKind::label).collect();
                DomainError::configuration(format!(
                    "Model type {value} is not supported. Please choose one of the following: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Embedding backends compiled into the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Lightweight deterministic hash embedder (always available).
    Simple { model: String, dimensions: usize },
    /// Semantic sentence embeddings powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed { model: String },
}

impl EmbeddingBackend {
    /// Map a configured model name onto a backend.
    pub fn resolve(model_name: &str) -> Result<Self, DomainError> {
        let name = model_name.trim();
        if SIMPLE_MODEL_ALIASES
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(name))
        {
            return Ok(EmbeddingBackend::Simple {
                model: name.to_string(),
                dimensions: default_simple_dim(),
            });
        }

        #[cfg(feature = "fastembed-engine")]
        {
            Ok(EmbeddingBackend::FastEmbed {
                model: name.to_string(),
            })
        }

        #[cfg(not(feature = "fastembed-engine"))]
        {
            Err(DomainError::configuration(format!(
                "embedding model `{name}` requires the `fastembed-engine` feature; \
                 use one of {} for the built-in hash embedder",
                SIMPLE_MODEL_ALIASES.join(", ")
            )))
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => "simple",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => "fastembed",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingBackend::Simple { model, .. } => model,
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { model } => model,
        }
    }
}

/// Parameters handed to the language model backend at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub kind: ModelKind,
    pub model_path: String,
    pub max_tokens: usize,
    pub n_batch: usize,
    pub endpoint: Option<String>,
}

impl ModelSettings {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Process-wide settings, resolved once before any request is served.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub embeddings_model_name: String,
    pub persist_directory: PathBuf,
    pub model: ModelSettings,
    pub target_source_chunks: usize,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let embeddings_model_name = required(&lookup, EMBEDDINGS_MODEL_NAME)?;
        let persist_directory = PathBuf::from(required(&lookup, PERSIST_DIRECTORY)?);
        let kind: ModelKind = required(&lookup, MODEL_TYPE)?.parse()?;
        let model_path = required(&lookup, MODEL_PATH)?;

        let raw_n_ctx = required(&lookup, MODEL_N_CTX)?;
        let max_tokens = parse_integer(MODEL_N_CTX, &raw_n_ctx)?;
        if max_tokens == 0 {
            return Err(DomainError::configuration(format!(
                "{MODEL_N_CTX} must be greater than zero"
            )));
        }

        let n_batch = optional_integer(&lookup, MODEL_N_BATCH, DEFAULT_N_BATCH)?;
        let target_source_chunks =
            optional_integer(&lookup, TARGET_SOURCE_CHUNKS, DEFAULT_TARGET_SOURCE_CHUNKS)?;

        let endpoint = lookup(MODEL_ENDPOINT)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty());

        let host = lookup(SERVICE_HOST)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(SERVICE_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                DomainError::configuration(format!("{SERVICE_PORT} must be a port number, got `{raw}`"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            embeddings_model_name,
            persist_directory,
            model: ModelSettings {
                kind,
                model_path,
                max_tokens,
                n_batch,
                endpoint,
            },
            target_source_chunks,
            server: ServerSettings { host, port },
        })
    }

    pub fn embedding_backend(&self) -> Result<EmbeddingBackend, DomainError> {
        EmbeddingBackend::resolve(&self.embeddings_model_name)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DomainError::configuration(format!("{key} environment variable is required")))
}

fn optional_integer<F>(lookup: &F, key: &str, default: usize) -> Result<usize, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_integer(key, &raw),
        None => Ok(default),
    }
}

fn parse_integer(key: &str, raw: &str) -> Result<usize, DomainError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| DomainError::configuration(format!("{key} must be an integer, got `{raw}`")))
}

const fn default_simple_dim() -> usize {
    384
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (EMBEDDINGS_MODEL_NAME, "stub"),
            (PERSIST_DIRECTORY, "db"),
            (MODEL_TYPE, "LlamaCpp"),
            (MODEL_PATH, "models/ggml-model-q4_0.bin"),
            (MODEL_N_CTX, "1000"),
        ])
    }

    fn resolve(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, DomainError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = resolve(&base_env()).expect("config resolves");
        assert_eq!(config.model.kind, ModelKind::LlamaCpp);
        assert_eq!(config.model.max_tokens, 1000);
        assert_eq!(config.model.n_batch, 8);
        assert_eq!(config.target_source_chunks, 4);
        assert_eq!(config.persist_directory, PathBuf::from("db"));
        assert_eq!(config.server, ServerSettings::default());
        assert_eq!(config.model.endpoint(), "http://127.0.0.1:8080");
    }

    #[test]
    fn every_required_variable_is_enforced() {
        for key in [
            EMBEDDINGS_MODEL_NAME,
            PERSIST_DIRECTORY,
            MODEL_TYPE,
            MODEL_PATH,
            MODEL_N_CTX,
        ] {
            let mut env = base_env();
            env.remove(key);
            let err = resolve(&env).expect_err("missing variable must fail");
            assert!(matches!(err, DomainError::Configuration(_)));
            assert!(err.to_string().contains(key), "{err} should name {key}");

            let mut blank = base_env();
            blank.insert(key, "   ");
            assert!(resolve(&blank).is_err(), "blank {key} must fail");
        }
    }

    #[test]
    fn optional_integers_must_be_numeric_when_present() {
        let mut env = base_env();
        env.insert(MODEL_N_BATCH, "lots");
        let err = resolve(&env).expect_err("non-numeric batch");
        assert!(err.to_string().contains("MODEL_N_BATCH must be an integer"));

        let mut env = base_env();
        env.insert(TARGET_SOURCE_CHUNKS, "");
        assert!(resolve(&env).is_err());

        let mut env = base_env();
        env.insert(MODEL_N_BATCH, "16");
        env.insert(TARGET_SOURCE_CHUNKS, "2");
        let config = resolve(&env).expect("numeric overrides");
        assert_eq!(config.model.n_batch, 16);
        assert_eq!(config.target_source_chunks, 2);
    }

    #[test]
    fn context_size_must_be_positive_integer() {
        let mut env = base_env();
        env.insert(MODEL_N_CTX, "big");
        assert!(resolve(&env).is_err());

        env.insert(MODEL_N_CTX, "0");
        assert!(resolve(&env).is_err());
    }

    #[test]
    fn unsupported_model_type_names_allowed_set() {
        let mut env = base_env();
        env.insert(MODEL_TYPE, "OpenAI");
        let err = resolve(&env).expect_err("unsupported type");
        let message = err.to_string();
        assert!(message.contains("Model type OpenAI is not supported"));
        assert!(message.contains("LlamaCpp, GPT4All"));
    }

    #[test]
    fn model_kind_round_trips_labels() {
        for kind in ModelKind::SUPPORTED {
            assert_eq!(kind.label().parse::<ModelKind>().unwrap(), kind);
        }
        assert!("llamacpp".parse::<ModelKind>().is_err());
    }

    #[test]
    fn endpoint_and_server_overrides() {
        let mut env = base_env();
        env.insert(MODEL_TYPE, "GPT4All");
        env.insert(MODEL_ENDPOINT, "http://10.0.0.5:4891/");
        env.insert(SERVICE_HOST, "0.0.0.0");
        env.insert(SERVICE_PORT, "9000");
        let config = resolve(&env).expect("overrides resolve");
        assert_eq!(config.model.endpoint(), "http://10.0.0.5:4891");
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");

        env.insert(SERVICE_PORT, "99999");
        assert!(resolve(&env).is_err());
    }

    #[test]
    fn stub_names_select_hash_embedder() {
        let backend = EmbeddingBackend::resolve("stub").expect("alias resolves");
        assert_eq!(backend.id(), "simple");
        assert_eq!(backend.model_name(), "stub");
    }

    #[cfg(not(feature = "fastembed-engine"))]
    #[test]
    fn named_models_need_fastembed_feature() {
        let err = EmbeddingBackend::resolve("all-MiniLM-L6-v2").expect_err("feature missing");
        assert!(err.to_string().contains("fastembed-engine"));
    }
}
