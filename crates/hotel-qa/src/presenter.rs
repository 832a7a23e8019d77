//! Result Presenter
//!
//! Turns a `ResultTable` into user-facing markdown: a one-line summary of what
//! was computed followed by the table, or a no-results message.

use crate::text::{format_number, title_case};
use crate::types::{non_blank, QueryParams, ResultRow, ResultTable, SortKey};

pub const NO_RESULTS_MESSAGE: &str = "No hotels found matching your criteria.";
pub const LOOSEN_SUGGESTION: &str =
    "Try loosening filters (e.g., lower star threshold or remove city/country).";

const MISSING_VALUE: &str = "n/a";

/// Label used for each active threshold in the summary.
fn threshold_label(key: SortKey) -> &'static str {
    match key {
        SortKey::StarRating => "stars",
        SortKey::Cleanliness => "cleanliness",
        SortKey::Comfort => "comfort",
        SortKey::Facilities => "facilities",
    }
}

fn location_clause(params: &QueryParams) -> String {
    let city = non_blank(&params.city).map(title_case);
    let country = non_blank(&params.country).map(title_case);
    match (city, country) {
        (Some(city), Some(country)) => format!("in {}, {}", city, country),
        (Some(place), None) | (None, Some(place)) => format!("in {}", place),
        (None, None) => "globally".to_string(),
    }
}

/// One-line bold summary; `total` is the number of rows returned.
pub fn summarize(params: &QueryParams, total: usize) -> String {
    let shown = params.limit().min(total);
    let mut scope = location_clause(params);

    let thresholds: Vec<String> = SortKey::ALL
        .iter()
        .filter(|key| params.threshold(**key) > 0.0)
        .map(|key| {
            format!(
                "{} ≥ {}",
                threshold_label(*key),
                format_number(params.threshold(*key))
            )
        })
        .collect();
    if !thresholds.is_empty() {
        scope.push_str(&format!(" ({})", thresholds.join(", ")));
    }

    format!(
        "**Showing {} of {} result(s) {}, sorted by {}.**",
        shown,
        total,
        scope,
        params.sort_by.label()
    )
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), format_number)
}

/// Markdown table with the projected columns.
pub fn format_table(rows: &[ResultRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", ResultRow::COLUMNS.join(" | ")));
    lines.push(format!("|{}|", vec!["---"; ResultRow::COLUMNS.len()].join("|")));

    for row in rows {
        let values = [
            row.hotel_name.clone(),
            row.city.clone(),
            row.country.clone(),
            cell(row.star_rating),
            cell(row.cleanliness_base),
            cell(row.comfort_base),
            cell(row.facilities_base),
        ];
        lines.push(format!("| {} |", values.join(" | ")));
    }

    lines.join("\n")
}

/// Summary plus table, or summary plus the no-results message.
pub fn render(params: &QueryParams, table: &ResultTable) -> String {
    let summary = summarize(params, table.len());
    if table.is_empty() {
        format!("{}\n\n{}\n\n{}", summary, NO_RESULTS_MESSAGE, LOOSEN_SUGGESTION)
    } else {
        format!("{}\n\n{}", summary, format_table(&table.rows))
    }
}
