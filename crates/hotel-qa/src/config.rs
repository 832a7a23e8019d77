use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{QaError, Result};

pub const DEFAULT_DATASET_PATH: &str = "hotels.csv";
pub const FALLBACK_DATASET_PATH: &str = "/mnt/data/hotels.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub dataset: DatasetConfig,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub primary_path: PathBuf,
    pub fallback_path: PathBuf,
}

/// Which query parser the pipeline uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserStrategy {
    /// Regex/keyword extraction with dataset-aware location matching
    #[default]
    Heuristic,
    /// Local Ollama server via `/api/chat`
    Ollama,
    /// OpenAI-compatible chat-completions endpoint (Groq by default)
    #[serde(alias = "groq")]
    OpenAi,
}

impl ParserStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "heuristic" | "rules" => Some(Self::Heuristic),
            "ollama" | "llama3" => Some(Self::Ollama),
            "openai" | "groq" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub strategy: ParserStrategy,
    /// Request timeout for model backends, in seconds
    pub timeout_secs: u64,
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from(DEFAULT_DATASET_PATH),
            fallback_path: PathBuf::from(FALLBACK_DATASET_PATH),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strategy: ParserStrategy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3:8b".to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
        }
    }
}

impl QaConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup, starting from defaults.
    ///
    /// Recognised keys: `HOTEL_QA_DATASET`, `HOTEL_QA_PARSER`,
    /// `HOTEL_QA_TIMEOUT_SECS`, `OLLAMA_HOST`, `OLLAMA_MODEL`,
    /// `GROQ_API_KEY`, `GROQ_MODEL`, `GROQ_ENDPOINT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("HOTEL_QA_DATASET") {
            config.dataset.primary_path = PathBuf::from(path.trim());
        }
        if let Some(name) = get("HOTEL_QA_PARSER") {
            config.parser.strategy = ParserStrategy::from_name(&name)
                .ok_or_else(|| QaError::Config(format!("unknown parser strategy '{}'", name)))?;
        }
        if let Some(secs) = get("HOTEL_QA_TIMEOUT_SECS") {
            config.parser.timeout_secs = secs.trim().parse().map_err(|_| {
                QaError::Config(format!("HOTEL_QA_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(host) = get("OLLAMA_HOST") {
            config.parser.ollama.host = host.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            config.parser.ollama.model = model.trim().to_string();
        }
        if let Some(endpoint) = get("GROQ_ENDPOINT") {
            config.parser.openai.endpoint = endpoint.trim().to_string();
        }
        if let Some(model) = get("GROQ_MODEL") {
            config.parser.openai.model = model.trim().to_string();
        }
        config.parser.openai.api_key = get("GROQ_API_KEY").map(|k| k.trim().to_string());

        config.validate()?;
        Ok(config)
    }

    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        if self.parser.timeout_secs == 0 {
            return Err(QaError::Config("parser.timeout_secs must be > 0".into()));
        }
        if self.parser.ollama.model.trim().is_empty() {
            return Err(QaError::Config("parser.ollama.model must not be empty".into()));
        }
        if self.parser.openai.model.trim().is_empty() {
            return Err(QaError::Config("parser.openai.model must not be empty".into()));
        }
        for (field, url) in [
            ("parser.ollama.host", &self.parser.ollama.host),
            ("parser.openai.endpoint", &self.parser.openai.endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(QaError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| QaError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
