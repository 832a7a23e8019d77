//! Regex fallback used when the model backend fails.
//!
//! Deliberately smaller than the heuristic parser: no dataset vocabulary,
//! only "top N", "N-star", "sorted by X" and "in City[, Country]".

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::QueryParser;
use crate::text::title_case;
use crate::types::{QueryParams, SortKey};

static TOP_N_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btop\s+(\d+)\b").expect("top-n regex is valid"));
static N_STAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:at\s+least\s+)?(\d+)\s*[- ]?\s*star").expect("n-star regex is valid")
});
static SORTED_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bsorted\s+by\s+(star(?:_?rating)?|rating|clean(?:liness)?|comfort|facilit(?:y|ies))\b")
        .expect("sorted-by regex is valid")
});
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s+([A-Za-z][A-Za-z\s\-]+?)(?:\s*,\s*([A-Za-z][A-Za-z\s\-]+))?(?:$|\b)")
        .expect("location regex is valid")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexFallbackParser;

impl RegexFallbackParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_text(&self, query: &str) -> QueryParams {
        let original = query.trim();
        let low = original.to_lowercase();
        let mut params = QueryParams::default();

        if let Some(caps) = TOP_N_RE.captures(&low) {
            // Digit runs too long for i64 are still "more than the max"
            params.set_limit(caps[1].parse().unwrap_or(i64::MAX));
        }

        if let Some(min_star) = N_STAR_RE
            .captures(&low)
            .and_then(|caps| caps[1].parse::<f64>().ok())
        {
            params.min_star = min_star;
        }

        if let Some(caps) = SORTED_BY_RE.captures(&low) {
            let key = &caps[1];
            params.sort_by = if key.starts_with("clean") {
                SortKey::Cleanliness
            } else if key.starts_with("comfort") {
                SortKey::Comfort
            } else if key.starts_with("facilit") {
                SortKey::Facilities
            } else {
                SortKey::StarRating
            };
        }

        // Case matters here: the location pattern runs on the original text
        if let Some(caps) = LOCATION_RE.captures(original) {
            let first = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let second = caps.get(2).map(|m| m.as_str().trim()).filter(|s| !s.is_empty());
            if !first.is_empty() {
                params.city = Some(title_case(first));
            }
            params.country = second.map(title_case);
        }

        params
    }
}

#[async_trait]
impl QueryParser for RegexFallbackParser {
    async fn parse(&self, text: &str) -> QueryParams {
        self.parse_text(text)
    }

    fn name(&self) -> &'static str {
        "regex_fallback"
    }
}
