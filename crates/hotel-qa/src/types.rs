use serde::{Deserialize, Serialize};

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 10;
pub const DEFAULT_LIMIT: usize = 5;

/// One row of the hotel dataset, with city/country/name case-folded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub hotel_id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub star_rating: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub cleanliness_base: Option<f64>,
    pub comfort_base: Option<f64>,
    pub facilities_base: Option<f64>,
}

impl HotelRecord {
    /// Value of the column backing `key`.
    pub fn score(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::StarRating => self.star_rating,
            SortKey::Cleanliness => self.cleanliness_base,
            SortKey::Comfort => self.comfort_base,
            SortKey::Facilities => self.facilities_base,
        }
    }
}

/// Business-level ranking attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    StarRating,
    Cleanliness,
    Comfort,
    Facilities,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::StarRating,
        SortKey::Cleanliness,
        SortKey::Comfort,
        SortKey::Facilities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StarRating => "star_rating",
            Self::Cleanliness => "cleanliness",
            Self::Comfort => "comfort",
            Self::Facilities => "facilities",
        }
    }

    /// Dataset column holding the values for this key.
    pub fn column(&self) -> &'static str {
        match self {
            Self::StarRating => "star_rating",
            Self::Cleanliness => "cleanliness_base",
            Self::Comfort => "comfort_base",
            Self::Facilities => "facilities_base",
        }
    }

    /// Human label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StarRating => "star rating",
            Self::Cleanliness => "cleanliness",
            Self::Comfort => "comfort",
            Self::Facilities => "facilities",
        }
    }

    /// Resolve free text to a key. Unknown input resolves to `StarRating`.
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(' ', "_");
        match normalized.as_str() {
            "cleanliness" | "cleanliness_base" => Self::Cleanliness,
            "comfort" | "comfort_base" => Self::Comfort,
            "facilities" | "facilities_base" => Self::Facilities,
            _ => Self::StarRating,
        }
    }
}

/// Structured intent extracted from a user query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    pub city: Option<String>,
    pub country: Option<String>,
    pub min_star: f64,
    pub min_clean: f64,
    pub min_comfort: f64,
    pub min_facilities: f64,
    pub sort_by: SortKey,
    limit: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            city: None,
            country: None,
            min_star: 0.0,
            min_clean: 0.0,
            min_comfort: 0.0,
            min_facilities: 0.0,
            sort_by: SortKey::StarRating,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl QueryParams {
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Set the result limit, clamped into `[MIN_LIMIT, MAX_LIMIT]`.
    pub fn set_limit(&mut self, limit: i64) {
        self.limit = clamp_limit(limit);
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.set_limit(limit);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Threshold configured for the column backing `key`.
    pub fn threshold(&self, key: SortKey) -> f64 {
        match key {
            SortKey::StarRating => self.min_star,
            SortKey::Cleanliness => self.min_clean,
            SortKey::Comfort => self.min_comfort,
            SortKey::Facilities => self.min_facilities,
        }
    }

    pub fn has_location(&self) -> bool {
        non_blank(&self.city).is_some() || non_blank(&self.country).is_some()
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as usize
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Projected, presentation-ready hotel row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub hotel_name: String,
    pub city: String,
    pub country: String,
    pub star_rating: Option<f64>,
    pub cleanliness_base: Option<f64>,
    pub comfort_base: Option<f64>,
    pub facilities_base: Option<f64>,
}

impl ResultRow {
    pub const COLUMNS: [&'static str; 7] = [
        "hotel_name",
        "city",
        "country",
        "star_rating",
        "cleanliness_base",
        "comfort_base",
        "facilities_base",
    ];

    pub fn score(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::StarRating => self.star_rating,
            SortKey::Cleanliness => self.cleanliness_base,
            SortKey::Comfort => self.comfort_base,
            SortKey::Facilities => self.facilities_base,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
    /// Rows that passed every filter, before truncation to the limit
    pub total_matched: usize,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
