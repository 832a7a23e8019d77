//! Query parsers: free text in, `QueryParams` out.
//!
//! Parsing never fails. Each strategy degrades to defaults (or, for the LLM
//! parser, to the regex fallback) instead of returning an error.

pub mod fallback;
pub mod heuristic;
pub mod llm;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ParserConfig, ParserStrategy};
use crate::dataset::DatasetHandle;
use crate::error::Result;
use crate::llm::{ChatBackend, OllamaBackend, OpenAiCompatibleBackend};
use crate::types::QueryParams;

pub use fallback::RegexFallbackParser;
pub use heuristic::HeuristicParser;
pub use llm::LlmQueryParser;

#[async_trait]
pub trait QueryParser: Send + Sync {
    async fn parse(&self, text: &str) -> QueryParams;

    /// Strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Build the parser selected by `config.strategy`.
pub fn build_parser(config: &ParserConfig, dataset: Arc<DatasetHandle>) -> Result<Arc<dyn QueryParser>> {
    let parser: Arc<dyn QueryParser> = match config.strategy {
        ParserStrategy::Heuristic => Arc::new(HeuristicParser::new(dataset)),
        ParserStrategy::Ollama => {
            let backend: Arc<dyn ChatBackend> = Arc::new(OllamaBackend::new(&config.ollama, config.timeout_secs)?);
            Arc::new(LlmQueryParser::new(backend))
        }
        ParserStrategy::OpenAi => {
            let backend: Arc<dyn ChatBackend> =
                Arc::new(OpenAiCompatibleBackend::new(&config.openai, config.timeout_secs)?);
            Arc::new(LlmQueryParser::new(backend))
        }
    };

    tracing::info!(strategy = ?config.strategy, parser = parser.name(), "Query parser ready");
    Ok(parser)
}
