//! Local Ollama server via the native `/api/chat` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{build_client, decode_envelope, post_json, ChatBackend, ChatMessage, EXTRACTION_TEMPERATURE};
use crate::config::OllamaConfig;
use crate::error::{QaError, Result};

pub struct OllamaBackend {
    endpoint: String,
    model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaBackend {
    pub fn new(config: &OllamaConfig, timeout_secs: u64) -> Result<Self> {
        let endpoint = format!("{}/api/chat", config.host.trim_end_matches('/'));
        tracing::info!(endpoint = %endpoint, model = %config.model, "Creating Ollama backend");
        Ok(Self {
            endpoint,
            model: config.model.clone(),
            client: build_client(timeout_secs)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = json!({
            "model": self.model,
            "messages": [ChatMessage::system(system), ChatMessage::user(user)],
            "stream": false,
            "options": {"temperature": EXTRACTION_TEMPERATURE, "top_p": 0.9}
        });

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Sending Ollama chat request");
        let body = post_json(self.client.post(&self.endpoint), &self.endpoint, &request).await?;
        let response: OllamaChatResponse = decode_envelope(&body, &self.endpoint)?;

        if response.message.content.trim().is_empty() {
            return Err(QaError::ModelBackendUnavailable(
                "Ollama returned an empty message".into(),
            ));
        }
        Ok(response.message.content)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
