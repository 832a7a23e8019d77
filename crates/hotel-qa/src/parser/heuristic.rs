//! Heuristic Parser
//!
//! Deterministic regex/keyword extraction with dataset-aware location
//! disambiguation. No external calls.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::QueryParser;
use crate::dataset::{DatasetHandle, Vocabulary};
use crate::text::WordMatcher;
use crate::types::{QueryParams, SortKey};

static TOP_N_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:top|list)\s+(\d{1,2})\b").expect("top-n regex is valid")
});
static ANY_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").expect("number regex is valid"));
static MIN_STAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"star(?:s| rating)?\s*(?:>=|≥|at\s+least)?\s*([0-9]+(?:\.[0-9]+)?)")
        .expect("min-star regex is valid")
});
static CITY_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcity\s*[:=]\s*([a-z][a-z\s\-']+)").expect("city field regex is valid")
});
static COUNTRY_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcountry\s*[:=]\s*([a-z][a-z\s\-']+)").expect("country field regex is valid")
});
static IN_PLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+([a-z][a-z\s\-']+)").expect("in-place regex is valid"));
static CONNECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:with|by|having|where|and)\b|[.,;:!?]").expect("connective regex is valid")
});

const STAR_SORT_PHRASES: [&str; 6] = [
    "best rated",
    "top rated",
    "highest rated",
    "star",
    "stars",
    "rating",
];

/// Keyword/regex parser backed by the dataset's city and country vocabulary.
pub struct HeuristicParser {
    dataset: Arc<DatasetHandle>,
}

impl HeuristicParser {
    pub fn new(dataset: Arc<DatasetHandle>) -> Self {
        Self { dataset }
    }

    /// Parse `text` against an explicit vocabulary.
    pub fn parse_with(text: &str, vocabulary: &Vocabulary) -> QueryParams {
        let low = text.trim().to_lowercase();
        let mut params = QueryParams::default();

        if let Some(limit) = extract_limit(&low) {
            params.set_limit(limit);
        }
        if let Some(sort_by) = extract_sort_key(&low) {
            params.sort_by = sort_by;
        }
        if let Some(min_star) = extract_min_star(&low) {
            params.min_star = min_star;
        }

        resolve_location(&low, vocabulary, &mut params);
        params
    }
}

#[async_trait]
impl QueryParser for HeuristicParser {
    async fn parse(&self, text: &str) -> QueryParams {
        match self.dataset.load() {
            Ok(dataset) => Self::parse_with(text, dataset.vocabulary()),
            Err(e) => {
                tracing::warn!(error = %e, "Dataset unavailable, parsing without location vocabulary");
                Self::parse_with(text, &Vocabulary::default())
            }
        }
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

fn extract_limit(low: &str) -> Option<i64> {
    TOP_N_RE
        .captures(low)
        .or_else(|| ANY_NUMBER_RE.captures(low))
        .and_then(|caps| caps[1].parse().ok())
}

fn extract_sort_key(low: &str) -> Option<SortKey> {
    if low.contains("cleanliness") {
        Some(SortKey::Cleanliness)
    } else if low.contains("comfort") {
        Some(SortKey::Comfort)
    } else if low.contains("facilities") {
        Some(SortKey::Facilities)
    } else if STAR_SORT_PHRASES.iter().any(|p| low.contains(p)) {
        Some(SortKey::StarRating)
    } else {
        None
    }
}

fn extract_min_star(low: &str) -> Option<f64> {
    MIN_STAR_RE
        .captures(low)
        .and_then(|caps| caps[1].parse().ok())
}

fn explicit_field(re: &Regex, low: &str) -> Option<String> {
    re.captures(low)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Location cascade: explicit fields, then "in X", then a vocabulary scan.
fn resolve_location(low: &str, vocabulary: &Vocabulary, params: &mut QueryParams) {
    params.city = explicit_field(&CITY_FIELD_RE, low);
    params.country = explicit_field(&COUNTRY_FIELD_RE, low);
    if params.city.is_some() || params.country.is_some() {
        return;
    }

    if let Some(caps) = IN_PLACE_RE.captures(low) {
        let token = CONNECTIVE_RE
            .split(&caps[1])
            .next()
            .unwrap_or_default()
            .trim();
        if vocabulary.is_country(token) {
            params.country = Some(token.to_string());
            return;
        }
        if vocabulary.is_city(token) {
            params.city = Some(token.to_string());
            return;
        }
    }

    params.country = find_whole_word(low, vocabulary.countries());
    params.city = find_whole_word(low, vocabulary.cities());
}

/// First candidate (longest names first) occurring as a whole word in `low`.
fn find_whole_word(low: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| WordMatcher::new(candidate).is_some_and(|m| m.is_match(low)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_dataset;

    fn parse(text: &str) -> QueryParams {
        let dataset = sample_dataset();
        HeuristicParser::parse_with(text, dataset.vocabulary())
    }

    #[test]
    fn test_top_n_with_city_and_min_star() {
        let params = parse("top 3 hotels in Paris with star rating >= 4");
        assert_eq!(params.limit(), 3);
        assert_eq!(params.city.as_deref(), Some("paris"));
        assert_eq!(params.country, None);
        assert_eq!(params.min_star, 4.0);
        assert_eq!(params.sort_by, SortKey::StarRating);
    }

    #[test]
    fn test_limit_rules() {
        assert_eq!(parse("show hotels").limit(), 5);
        assert_eq!(parse("list 7 hotels").limit(), 7);
        assert_eq!(parse("give me 2 hotels").limit(), 2);
        assert_eq!(parse("top 0 hotels").limit(), 1);
        assert_eq!(parse("top 99 hotels").limit(), 10);
        // three digits is not a limit token
        assert_eq!(parse("hotels near 123 main road").limit(), 5);
    }

    #[test]
    fn test_sort_key_priority() {
        assert_eq!(parse("cleanest by cleanliness and comfort").sort_by, SortKey::Cleanliness);
        assert_eq!(parse("comfort and facilities please").sort_by, SortKey::Comfort);
        assert_eq!(parse("great facilities").sort_by, SortKey::Facilities);
        assert_eq!(parse("highest rated hotels").sort_by, SortKey::StarRating);
        assert_eq!(parse("cheap places to sleep").sort_by, SortKey::StarRating);
    }

    #[test]
    fn test_min_star_variants() {
        assert_eq!(parse("stars at least 4.5 in rome").min_star, 4.5);
        assert_eq!(parse("star ≥ 3").min_star, 3.0);
        assert_eq!(parse("star rating 4").min_star, 4.0);
        assert_eq!(parse("hotels in berlin").min_star, 0.0);
    }

    #[test]
    fn test_explicit_fields_win() {
        let params = parse("hotels city: Berlin");
        assert_eq!(params.city.as_deref(), Some("berlin"));

        let params = parse("anything country=france");
        assert_eq!(params.country.as_deref(), Some("france"));
        assert_eq!(params.city, None);
    }

    #[test]
    fn test_in_token_resolves_country_before_city() {
        let params = parse("best hotels in Isle of Man, sorted");
        assert_eq!(params.country.as_deref(), Some("isle of man"));
        assert_eq!(params.city, None);

        let params = parse("hotels in sydney having great comfort");
        assert_eq!(params.city.as_deref(), Some("sydney"));
        assert_eq!(params.sort_by, SortKey::Comfort);
    }

    #[test]
    fn test_vocabulary_scan_when_no_in_token() {
        let params = parse("germany hotels with 4 stars");
        assert_eq!(params.country.as_deref(), Some("germany"));
        assert_eq!(params.city, None);

        let params = parse("rome or berlin, whichever is better rated");
        // longest city name wins when several appear
        assert_eq!(params.city.as_deref(), Some("berlin"));
    }

    #[test]
    fn test_partial_words_do_not_match_vocabulary() {
        let params = parse("hotels for a germane traveller");
        assert_eq!(params.country, None);
        assert_eq!(params.city, None);
    }

    #[test]
    fn test_unknown_in_token_falls_through_to_scan() {
        let params = parse("hotels in the north near paris");
        assert_eq!(params.city.as_deref(), Some("paris"));
    }

    #[test]
    fn test_empty_vocabulary_still_parses() {
        let params = HeuristicParser::parse_with("top 2 in paris", &Vocabulary::default());
        assert_eq!(params.limit(), 2);
        assert_eq!(params.city, None);
    }

    #[tokio::test]
    async fn test_trait_parse_uses_dataset_vocabulary() {
        let handle = Arc::new(DatasetHandle::preloaded(sample_dataset()));
        let parser = HeuristicParser::new(handle);
        let params = parser.parse("hotels in douglas").await;
        assert_eq!(params.city.as_deref(), Some("douglas"));
        assert_eq!(parser.name(), "heuristic");
    }
}
