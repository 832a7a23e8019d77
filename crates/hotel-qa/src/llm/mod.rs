//! Chat-model backends used by the LLM query parser.
//!
//! Every backend takes a system prompt plus one user message and returns the
//! raw assistant text. All transport and protocol failures are reported as
//! [`QaError::ModelBackendUnavailable`] so the parser can fall back.

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{QaError, Result};

pub use ollama::OllamaBackend;
pub use openai::OpenAiCompatibleBackend;

/// Sampling temperature for query extraction; low to keep output structured.
pub const EXTRACTION_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Single non-streaming chat turn.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeout_secs.min(15)))
        .timeout(Duration::from_secs(timeout_secs))
        .tcp_nodelay(true)
        .build()
        .map_err(|e| QaError::ModelBackendUnavailable(format!("failed to build HTTP client: {}", e)))
}

/// Send a JSON POST and return the body of a 2xx response.
pub(crate) async fn post_json<B: Serialize>(
    request: reqwest::RequestBuilder,
    endpoint: &str,
    body: &B,
) -> Result<String> {
    let response = request.json(body).send().await.map_err(|e| {
        if e.is_timeout() {
            tracing::error!(endpoint = %endpoint, "Model request timed out");
            QaError::ModelBackendUnavailable(format!("request to {} timed out", endpoint))
        } else if e.is_connect() {
            tracing::error!(endpoint = %endpoint, error = %e, "Connection failed");
            QaError::ModelBackendUnavailable(format!("failed to connect to {}: {}", endpoint, e))
        } else {
            tracing::error!(endpoint = %endpoint, error = %e, "Request failed");
            QaError::ModelBackendUnavailable(format!("request to {} failed: {}", endpoint, e))
        }
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|e| {
        QaError::ModelBackendUnavailable(format!(
            "failed to read response body from {}: {}",
            endpoint, e
        ))
    })?;

    if !status.is_success() {
        let preview: String = text.chars().take(300).collect();
        tracing::error!(endpoint = %endpoint, status = %status, error = %preview, "Model API returned error");
        return Err(QaError::ModelBackendUnavailable(format!(
            "API error ({}): {}",
            status, preview
        )));
    }

    Ok(text)
}

/// Decode a response envelope, rejecting HTML error pages with a readable message.
pub(crate) fn decode_envelope<T: serde::de::DeserializeOwned>(body: &str, endpoint: &str) -> Result<T> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(QaError::ModelBackendUnavailable(format!(
            "{} returned HTML instead of JSON: {}",
            endpoint, preview
        )));
    }

    serde_json::from_str::<T>(body).map_err(|e| {
        let preview: String = body.chars().take(300).collect();
        QaError::ModelBackendUnavailable(format!(
            "unexpected response shape from {}: {}. Body: {}",
            endpoint, e, preview
        ))
    })
}
