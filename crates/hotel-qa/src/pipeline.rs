//! Orchestrator: parse -> query -> respond, one query per call.

use std::sync::Arc;

use crate::dataset::DatasetHandle;
use crate::engine::{self, FilterReport};
use crate::error::Result;
use crate::parser::QueryParser;
use crate::presenter;
use crate::types::{QueryParams, ResultTable};

/// Output of the parse stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub text: String,
    pub params: QueryParams,
}

/// Output of the query stage.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub params: QueryParams,
    pub table: ResultTable,
}

pub struct HotelQaPipeline {
    dataset: Arc<DatasetHandle>,
    parser: Arc<dyn QueryParser>,
}

impl HotelQaPipeline {
    pub fn new(dataset: Arc<DatasetHandle>, parser: Arc<dyn QueryParser>) -> Self {
        Self { dataset, parser }
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    pub async fn parse(&self, text: &str) -> ParsedRequest {
        let params = self.parser.parse(text).await;
        tracing::debug!(parser = self.parser.name(), params = ?params, "Parsed hotel query");
        ParsedRequest {
            text: text.to_string(),
            params,
        }
    }

    pub fn run_query(&self, request: ParsedRequest) -> Result<QueryOutcome> {
        let dataset = self.dataset.load()?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let report = engine::explain_counts(&dataset, &request.params);
            tracing::debug!(query = %request.text, "Filter counts\n{}", report);
        }

        let table = engine::query(&dataset, &request.params);
        Ok(QueryOutcome {
            params: request.params,
            table,
        })
    }

    pub fn respond(&self, outcome: &QueryOutcome) -> String {
        presenter::render(&outcome.params, &outcome.table)
    }

    /// Full pipeline; failures are rendered as an error transcript.
    pub async fn answer(&self, text: &str) -> String {
        let request = self.parse(text).await;
        match self.run_query(request) {
            Ok(outcome) => {
                tracing::info!(
                    matched = outcome.table.total_matched,
                    returned = outcome.table.len(),
                    "Answered hotel query"
                );
                self.respond(&outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "Hotel query failed");
                format!("Agent error:\n\n{}", e)
            }
        }
    }

    /// Per-stage filter counts for `text`.
    pub async fn explain(&self, text: &str) -> Result<FilterReport> {
        let request = self.parse(text).await;
        let dataset = self.dataset.load()?;
        Ok(engine::explain_counts(&dataset, &request.params))
    }
}
