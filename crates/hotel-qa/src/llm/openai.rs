//! OpenAI-compatible chat-completions endpoint (Groq by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{build_client, decode_envelope, post_json, ChatBackend, ChatMessage, EXTRACTION_TEMPERATURE};
use crate::config::OpenAiConfig;
use crate::error::{QaError, Result};

pub struct OpenAiCompatibleBackend {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleBackend {
    /// A missing API key is not an error here; every call then fails fast.
    pub fn new(config: &OpenAiConfig, timeout_secs: u64) -> Result<Self> {
        if config.api_key.is_none() {
            tracing::warn!(endpoint = %config.endpoint, "No API key configured; model calls will fall back");
        }
        tracing::info!(endpoint = %config.endpoint, model = %config.model, "Creating OpenAI-compatible backend");
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client: build_client(timeout_secs)?,
        })
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [ChatMessage::system(system), ChatMessage::user(user)],
            "temperature": EXTRACTION_TEMPERATURE
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatibleBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| QaError::ModelBackendUnavailable("GROQ_API_KEY not set".into()))?;

        let request = self.request_body(system, user);

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Sending OpenAI-compatible request");
        let builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key));
        let body = post_json(builder, &self.endpoint, &request).await?;
        let response: CompletionResponse = decode_envelope(&body, &self.endpoint)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| QaError::ModelBackendUnavailable("No choices returned from API".into()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
