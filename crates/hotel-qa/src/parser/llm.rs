//! LLM-Backed Parser
//!
//! Asks a chat model to turn the request into a strict JSON object, then
//! normalizes it defensively. Any backend or decode failure is logged and the
//! regex fallback answers instead, so callers always get usable params.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::fallback::RegexFallbackParser;
use super::QueryParser;
use crate::error::{QaError, Result};
use crate::llm::ChatBackend;
use crate::types::{QueryParams, SortKey, DEFAULT_LIMIT};

const SYSTEM_PROMPT: &str = r#"Convert the user's hotel request into STRICT JSON with keys:
{ "city": string|null, "country": string|null, "min_star": number, "min_clean": number, "min_comfort": number, "min_facilities": number, "sort_by": "star_rating"|"cleanliness"|"comfort"|"facilities", "limit": number }
- Defaults: sort_by=star_rating, limit=5, thresholds 0
- 'top N' => limit=N (1..10)
- '4-star' => min_star=4
- If it mentions cleanliness, comfort or facilities, set sort_by accordingly
- Location: 'in City' or 'in City, Country'. If only one token, put it in city.
Return ONLY the JSON."#;

pub struct LlmQueryParser {
    backend: Arc<dyn ChatBackend>,
    fallback: RegexFallbackParser,
}

impl LlmQueryParser {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            fallback: RegexFallbackParser::new(),
        }
    }

    /// Model extraction without the fallback; errors are returned as-is.
    pub async fn try_parse(&self, text: &str) -> Result<QueryParams> {
        let raw = self.backend.complete(SYSTEM_PROMPT, text).await?;
        let payload = decode_payload(&raw)?;
        normalize_payload(&payload)
    }
}

#[async_trait]
impl QueryParser for LlmQueryParser {
    async fn parse(&self, text: &str) -> QueryParams {
        let start = std::time::Instant::now();
        let result = self.try_parse(text).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(params) => {
                tracing::info!(
                    backend = self.backend.name(),
                    params = ?params,
                    latency_ms = latency_ms,
                    "LLM query extraction"
                );
                params
            }
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    latency_ms = latency_ms,
                    "LLM extraction failed, using regex fallback"
                );
                self.fallback.parse_text(text)
            }
        }
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Strip markdown fences and decode the outermost `{...}` object.
fn decode_payload(raw: &str) -> Result<Value> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let json_str = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    };

    serde_json::from_str(json_str).map_err(|e| {
        let preview: String = raw.chars().take(200).collect();
        QaError::MalformedModelResponse(format!("not valid JSON ({}): {}", e, preview))
    })
}

/// Coerce a decoded model payload into `QueryParams`.
pub fn normalize_payload(payload: &Value) -> Result<QueryParams> {
    let obj = payload.as_object().ok_or_else(|| {
        QaError::MalformedModelResponse(format!("expected a JSON object, got {}", payload))
    })?;

    let mut params = QueryParams::default();
    params.city = text_field(obj, "city");
    params.country = text_field(obj, "country");
    params.min_star = number_field(obj, "min_star");
    params.min_clean = number_field(obj, "min_clean");
    params.min_comfort = number_field(obj, "min_comfort");
    params.min_facilities = number_field(obj, "min_facilities");
    params.sort_by = sort_field(obj)?;
    params.set_limit(limit_field(obj)?);
    Ok(params)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers, numeric strings and booleans coerce; anything else is 0.
fn number_field(obj: &Map<String, Value>, key: &str) -> f64 {
    let value = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn sort_field(obj: &Map<String, Value>) -> Result<SortKey> {
    match obj.get("sort_by") {
        None | Some(Value::Null) => Ok(SortKey::default()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(SortKey::default()),
        Some(Value::String(s)) => Ok(SortKey::parse_lenient(s)),
        Some(other) => Err(QaError::MalformedModelResponse(format!(
            "sort_by must be a string, got {}",
            other
        ))),
    }
}

fn limit_field(obj: &Map<String, Value>) -> Result<i64> {
    let malformed = |v: &Value| QaError::MalformedModelResponse(format!("limit is not an integer: {}", v));
    match obj.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_LIMIT as i64),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| malformed(&Value::Number(n.clone()))),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| malformed(&Value::String(s.clone()))),
        Some(Value::Bool(b)) => Ok(i64::from(*b)),
        Some(other) => Err(malformed(other)),
    }
}
