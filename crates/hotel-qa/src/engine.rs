//! Filter/Sort Engine
//!
//! Applies `QueryParams` to the dataset: location filters, score thresholds,
//! descending sort on the resolved column, truncation and projection.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::dataset::Dataset;
use crate::text::{format_number, title_case, WordMatcher};
use crate::types::{clamp_limit, non_blank, HotelRecord, QueryParams, ResultRow, ResultTable, SortKey};

/// Compiled filters for one query.
struct FilterPlan {
    city: Option<WordMatcher>,
    country: Option<WordMatcher>,
    thresholds: Vec<(SortKey, f64)>,
}

impl FilterPlan {
    fn new(params: &QueryParams) -> Self {
        Self {
            city: non_blank(&params.city).and_then(WordMatcher::new),
            country: non_blank(&params.country).and_then(WordMatcher::new),
            thresholds: SortKey::ALL
                .iter()
                .map(|key| (*key, params.threshold(*key)))
                .collect(),
        }
    }

    fn matches(&self, record: &HotelRecord) -> bool {
        if let Some(city) = &self.city {
            if !city.is_match(&record.city) {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if !country.is_match(&record.country) {
                return false;
            }
        }
        self.thresholds
            .iter()
            .all(|(key, min)| passes_threshold(record, *key, *min))
    }
}

/// Inclusive lower bound; inert at 0, missing values count as 0.
fn passes_threshold(record: &HotelRecord, key: SortKey, min: f64) -> bool {
    if min > 0.0 {
        record.score(key).unwrap_or(0.0) >= min
    } else {
        true
    }
}

/// Descending by value, missing values last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn project(record: &HotelRecord) -> ResultRow {
    ResultRow {
        hotel_name: record.name.clone(),
        city: title_case(&record.city),
        country: title_case(&record.country),
        star_rating: record.star_rating,
        cleanliness_base: record.cleanliness_base,
        comfort_base: record.comfort_base,
        facilities_base: record.facilities_base,
    }
}

/// Filter, sort and truncate the dataset according to `params`.
pub fn query(dataset: &Dataset, params: &QueryParams) -> ResultTable {
    let plan = FilterPlan::new(params);
    let mut matched: Vec<&HotelRecord> = dataset
        .records()
        .iter()
        .filter(|r| plan.matches(r))
        .collect();

    let sort_key = params.sort_by;
    matched.sort_by(|a, b| descending(a.score(sort_key), b.score(sort_key)));

    let total_matched = matched.len();
    let limit = clamp_limit(params.limit() as i64);
    let rows: Vec<ResultRow> = matched.into_iter().take(limit).map(project).collect();

    tracing::debug!(
        total_matched,
        returned = rows.len(),
        sort_column = sort_key.column(),
        limit,
        "Hotel query executed"
    );

    ResultTable {
        rows,
        total_matched,
    }
}

/// Row count after one filter stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCount {
    pub stage: &'static str,
    /// Human description of the applied criterion; `None` when skipped
    pub criterion: Option<String>,
    pub before: usize,
    pub after: usize,
}

impl StageCount {
    pub fn skipped(&self) -> bool {
        self.criterion.is_none()
    }
}

/// Diagnostic breakdown of how many rows survive each filter stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub total_rows: usize,
    pub stages: Vec<StageCount>,
}

impl FilterReport {
    /// Rows remaining after the last stage.
    pub fn remaining(&self) -> usize {
        self.stages.last().map_or(self.total_rows, |s| s.after)
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- total rows in CSV: **{}**", self.total_rows)?;
        for stage in &self.stages {
            match (&stage.criterion, stage.stage) {
                (None, "city") | (None, "country") => {
                    write!(f, "\n- {} filter: *(none)*", stage.stage)?
                }
                (None, _) => write!(f, "\n- {} threshold: *(none)*", stage.stage)?,
                (Some(criterion), "city") | (Some(criterion), "country") => {
                    write!(f, "\n- after {}: **{}**", criterion, stage.after)?
                }
                (Some(criterion), _) => write!(
                    f,
                    "\n- after {}: **{}** (was {})",
                    criterion, stage.after, stage.before
                )?,
            }
        }
        Ok(())
    }
}

/// Apply the filter sequence of [`query`] and record counts per stage.
pub fn explain_counts(dataset: &Dataset, params: &QueryParams) -> FilterReport {
    let plan = FilterPlan::new(params);
    let mut remaining: Vec<&HotelRecord> = dataset.records().iter().collect();
    let mut stages = Vec::with_capacity(6);

    for (stage, matcher) in [("city", &plan.city), ("country", &plan.country)] {
        let before = remaining.len();
        let criterion = matcher.as_ref().map(|m| {
            remaining.retain(|r| {
                let field = if stage == "city" { &r.city } else { &r.country };
                m.is_match(field)
            });
            format!("{} == `{}`", stage, m.needle())
        });
        stages.push(StageCount {
            stage,
            criterion,
            before,
            after: remaining.len(),
        });
    }

    for (key, min) in &plan.thresholds {
        let before = remaining.len();
        let criterion = (*min > 0.0).then(|| {
            remaining.retain(|r| passes_threshold(r, *key, *min));
            format!("{} ≥ {}", key.label(), format_number(*min))
        });
        stages.push(StageCount {
            stage: key.label(),
            criterion,
            before,
            after: remaining.len(),
        });
    }

    FilterReport {
        total_rows: dataset.len(),
        stages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_dataset;

    fn names(table: &ResultTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.hotel_name.as_str()).collect()
    }

    #[test]
    fn test_city_filter_with_threshold() {
        let dataset = sample_dataset();
        let mut params = QueryParams::default().with_city("paris").with_limit(3);
        params.min_star = 4.0;

        let table = query(&dataset, &params);
        assert_eq!(names(&table), vec!["hotel lumiere", "le petit nid"]);
        assert_eq!(table.total_matched, 2);
        assert_eq!(table.rows[0].city, "Paris");
        assert_eq!(table.rows[0].country, "France");
    }

    #[test]
    fn test_whole_word_location_filters() {
        let dataset = sample_dataset();

        let by_country = query(&dataset, &QueryParams::default().with_country("man"));
        assert_eq!(by_country.total_matched, 2);
        assert!(by_country.rows.iter().all(|r| r.country == "Isle Of Man"));

        let by_city = query(&dataset, &QueryParams::default().with_city("man"));
        assert_eq!(names(&by_city), vec!["manx rest"]);

        let partial = query(&dataset, &QueryParams::default().with_country("germ"));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_missing_scores_fail_positive_thresholds() {
        let dataset = sample_dataset();
        let mut params = QueryParams::default().with_city("berlin");
        params.min_clean = 1.0;

        let table = query(&dataset, &params);
        assert_eq!(names(&table), vec!["berlin central"]);
    }

    #[test]
    fn test_global_query_sorted_descending_and_truncated() {
        let dataset = sample_dataset();
        let table = query(&dataset, &QueryParams::default());

        assert_eq!(table.len(), 5);
        assert_eq!(table.total_matched, 9);
        let stars: Vec<Option<f64>> = table.rows.iter().map(|r| r.star_rating).collect();
        assert_eq!(stars, vec![Some(5.0), Some(5.0), Some(4.0), Some(4.0), Some(4.0)]);
    }

    #[test]
    fn test_missing_sort_values_go_last() {
        let dataset = sample_dataset();
        let table = query(&dataset, &QueryParams::default().with_city("rome"));
        assert_eq!(names(&table), vec!["colosseo suites"]);

        let all = query(&dataset, &QueryParams::default().with_limit(10));
        assert_eq!(all.rows.last().unwrap().hotel_name, "colosseo suites");
    }

    #[test]
    fn test_sorts_by_resolved_column() {
        let dataset = sample_dataset();
        for key in SortKey::ALL {
            let table = query(&dataset, &QueryParams::default().with_sort(key).with_limit(10));
            let values: Vec<Option<f64>> = table.rows.iter().map(|r| r.score(key)).collect();
            for pair in values.windows(2) {
                assert_ne!(descending(pair[0], pair[1]), Ordering::Greater, "{:?}", key);
            }
        }

        let table = query(&dataset, &QueryParams::default().with_sort(SortKey::Facilities));
        assert_eq!(table.rows[0].hotel_name, "harbour view");
    }

    #[test]
    fn test_row_count_bounded_by_limit_and_matches() {
        let dataset = sample_dataset();
        for limit in [-5, 0, 1, 3, 9, 10, 50] {
            let params = QueryParams::default().with_limit(limit);
            let table = query(&dataset, &params);
            assert!(table.len() <= params.limit());
            assert!(table.len() <= table.total_matched);
            assert!((1..=10).contains(&params.limit()));
        }
    }

    #[test]
    fn test_no_matches() {
        let dataset = sample_dataset();
        let table = query(&dataset, &QueryParams::default().with_city("atlantis"));
        assert!(table.is_empty());
        assert_eq!(table.total_matched, 0);
    }

    #[test]
    fn test_explain_counts() {
        let dataset = sample_dataset();
        let mut params = QueryParams::default().with_city("paris");
        params.min_star = 4.0;

        let report = explain_counts(&dataset, &params);
        assert_eq!(report.total_rows, 9);
        assert_eq!(report.stages.len(), 6);
        assert_eq!(report.stages[0].after, 3);
        assert!(report.stages[1].skipped());
        assert_eq!(report.stages[2].before, 3);
        assert_eq!(report.stages[2].after, 2);
        assert_eq!(report.remaining(), 2);
        assert_eq!(report.remaining(), query(&dataset, &params).total_matched);

        let text = report.to_string();
        assert!(text.contains("- total rows in CSV: **9**"));
        assert!(text.contains("- after city == `paris`: **3**"));
        assert!(text.contains("- country filter: *(none)*"));
        assert!(text.contains("- after star rating ≥ 4: **2** (was 3)"));
        assert!(text.contains("- cleanliness threshold: *(none)*"));
    }
}
