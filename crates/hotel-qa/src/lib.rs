pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod presenter;
pub mod text;
pub mod types;

// Re-export primary types for convenience
pub use config::{DatasetConfig, ParserConfig, ParserStrategy, QaConfig};
pub use dataset::{Dataset, DatasetHandle};
pub use engine::{explain_counts, query, FilterReport};
pub use error::{QaError, Result};
pub use parser::{build_parser, HeuristicParser, LlmQueryParser, QueryParser, RegexFallbackParser};
pub use pipeline::{HotelQaPipeline, ParsedRequest, QueryOutcome};
pub use types::{HotelRecord, QueryParams, ResultRow, ResultTable, SortKey};

// Re-export backend types
pub use llm::{ChatBackend, OllamaBackend, OpenAiCompatibleBackend};
