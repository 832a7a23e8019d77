//! Dataset Accessor
//!
//! Loads the hotel CSV once, normalizes its schema, and hands out a shared,
//! immutable `Dataset` through `DatasetHandle`.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DatasetConfig;
use crate::error::{QaError, Result};
use crate::types::HotelRecord;

pub const REQUIRED_COLUMNS: [&str; 10] = [
    "hotel_id",
    "hotel_name",
    "city",
    "country",
    "star_rating",
    "lat",
    "lon",
    "cleanliness_base",
    "comfort_base",
    "facilities_base",
];

/// Canonical in-memory hotel table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<HotelRecord>,
    vocabulary: Vocabulary,
    source: Option<PathBuf>,
}

/// Known cities and countries, unique and ordered longest first.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    cities: Vec<String>,
    countries: Vec<String>,
}

impl Vocabulary {
    fn from_records(records: &[HotelRecord]) -> Self {
        Self {
            cities: longest_first(records.iter().map(|r| r.city.as_str())),
            countries: longest_first(records.iter().map(|r| r.country.as_str())),
        }
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn is_city(&self, token: &str) -> bool {
        self.cities.iter().any(|c| c == token)
    }

    pub fn is_country(&self, token: &str) -> bool {
        self.countries.iter().any(|c| c == token)
    }
}

/// Unique values in first-seen order, then stably sorted longest first, so
/// names of equal length keep their dataset order.
fn longest_first<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect();
    out.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    out
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    hotel_id: usize,
    hotel_name: usize,
    city: usize,
    country: usize,
    star_rating: usize,
    lat: usize,
    lon: usize,
    cleanliness_base: usize,
    comfort_base: usize,
    facilities_base: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self> {
        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS
            .iter()
            .map(|col| headers.iter().position(|h| h == col))
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(col, _)| col.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(QaError::SchemaInvalid {
                missing,
                available: headers.to_vec(),
            });
        }

        let p: Vec<usize> = positions.into_iter().flatten().collect();
        Ok(Self {
            hotel_id: p[0],
            hotel_name: p[1],
            city: p[2],
            country: p[3],
            star_rating: p[4],
            lat: p[5],
            lon: p[6],
            cleanliness_base: p[7],
            comfort_base: p[8],
            facilities_base: p[9],
        })
    }

    /// Build a record, or `None` when name/city/country end up empty.
    fn record(&self, row: &csv::StringRecord) -> Option<HotelRecord> {
        let text = |i: usize| row.get(i).unwrap_or("").trim().to_lowercase();
        let number = |i: usize| parse_number(row.get(i).unwrap_or(""));

        let name = text(self.hotel_name);
        let city = text(self.city);
        let country = text(self.country);
        if name.is_empty() || city.is_empty() || country.is_empty() {
            return None;
        }

        Some(HotelRecord {
            hotel_id: row.get(self.hotel_id).unwrap_or("").trim().to_string(),
            name,
            city,
            country,
            star_rating: number(self.star_rating),
            lat: number(self.lat),
            lon: number(self.lon),
            cleanliness_base: number(self.cleanliness_base),
            comfort_base: number(self.comfort_base),
            facilities_base: number(self.facilities_base),
        })
    }
}

/// Coerce a cell to a number; anything unparsable or non-finite is missing.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

impl Dataset {
    /// Locate the CSV (primary path, then fallback) and load it.
    pub fn load(config: &DatasetConfig) -> Result<Self> {
        let path = Self::locate(config)?;
        let start = std::time::Instant::now();
        let file = File::open(&path)?;
        let mut dataset = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            cities = dataset.vocabulary.cities.len(),
            countries = dataset.vocabulary.countries.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Hotel dataset loaded"
        );

        dataset.source = Some(path);
        Ok(dataset)
    }

    pub fn locate(config: &DatasetConfig) -> Result<PathBuf> {
        if config.primary_path.exists() {
            return Ok(config.primary_path.clone());
        }
        if config.fallback_path.exists() {
            tracing::debug!(
                primary = %config.primary_path.display(),
                fallback = %config.fallback_path.display(),
                "Primary dataset path missing, using fallback"
            );
            return Ok(config.fallback_path.clone());
        }
        Err(QaError::DatasetNotFound {
            primary: config.primary_path.clone(),
            fallback: config.fallback_path.clone(),
        })
    }

    /// Parse and normalize CSV content from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in csv_reader.records() {
            match columns.record(&row?) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "Dropped rows with empty name/city/country");
        }

        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<HotelRecord>) -> Self {
        let vocabulary = Vocabulary::from_records(&records);
        Self {
            records,
            vocabulary,
            source: None,
        }
    }

    pub fn records(&self) -> &[HotelRecord] {
        &self.records
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared, lazily loaded dataset.
///
/// The first `load` holds the lock while reading the file, so concurrent
/// first callers wait for a single load. Failed loads are not cached.
pub struct DatasetHandle {
    config: DatasetConfig,
    cached: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetHandle {
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    /// Wrap a dataset that is already in memory.
    pub fn preloaded(dataset: Dataset) -> Self {
        Self {
            config: DatasetConfig::default(),
            cached: Mutex::new(Some(Arc::new(dataset))),
        }
    }

    pub fn load(&self) -> Result<Arc<Dataset>> {
        let mut cached = self.cached.lock();
        if let Some(dataset) = cached.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(Dataset::load(&self.config)?);
        *cached = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.lock().is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{sample_dataset, HOTELS_CSV};
    use super::*;

    #[test]
    fn test_normalizes_headers_and_text() {
        let dataset = sample_dataset();
        let petit = dataset
            .records()
            .iter()
            .find(|r| r.hotel_id == "2")
            .unwrap();
        assert_eq!(petit.name, "le petit nid");
        assert_eq!(petit.city, "paris");
        assert_eq!(petit.country, "france");
        assert_eq!(petit.star_rating, Some(4.0));
    }

    #[test]
    fn test_drops_rows_missing_required_text() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 9);
        assert!(dataset.records().iter().all(|r| r.hotel_id != "9"));
    }

    #[test]
    fn test_non_numeric_values_become_missing() {
        let dataset = sample_dataset();
        let colosseo = dataset.records().iter().find(|r| r.hotel_id == "10").unwrap();
        assert_eq!(colosseo.star_rating, None);
        let spree = dataset.records().iter().find(|r| r.hotel_id == "5").unwrap();
        assert_eq!(spree.cleanliness_base, None);
        assert_eq!(spree.comfort_base, Some(7.4));
    }

    #[test]
    fn test_missing_columns_are_enumerated() {
        let csv = "hotel_id,hotel_name,city,country,star_rating\n1,A,Paris,France,4\n";
        match Dataset::from_reader(csv.as_bytes()) {
            Err(QaError::SchemaInvalid { missing, available }) => {
                assert_eq!(
                    missing,
                    vec!["lat", "lon", "cleanliness_base", "comfort_base", "facilities_base"]
                );
                assert_eq!(available.len(), 5);
            }
            other => panic!("expected SchemaInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_vocabulary_is_longest_first() {
        let dataset = sample_dataset();
        let vocab = dataset.vocabulary();
        assert_eq!(
            vocab.countries(),
            &["isle of man", "australia", "germany", "france", "italy"]
        );
        assert_eq!(vocab.cities().first().map(String::as_str), Some("douglas"));
        assert_eq!(vocab.cities().last().map(String::as_str), Some("man"));
        assert!(vocab.is_city("rome"));
        assert!(!vocab.is_country("rome"));
    }

    #[test]
    fn test_vocabulary_ties_keep_dataset_order() {
        let csv = "\
hotel_id,hotel_name,city,country,star_rating,lat,lon,cleanliness_base,comfort_base,facilities_base
1,A,Rome,Italy,4,0,0,8,8,8
2,B,Bern,Switzerland,4,0,0,8,8,8
3,C,Rome,Italy,3,0,0,7,7,7
4,D,Oslo,Norway,5,0,0,9,9,9
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.vocabulary().cities(), &["rome", "bern", "oslo"]);
        assert_eq!(dataset.vocabulary().countries(), &["switzerland", "norway", "italy"]);
    }

    #[test]
    fn test_locate_uses_fallback_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("hotels.csv");
        std::fs::write(&fallback, HOTELS_CSV).unwrap();

        let config = DatasetConfig {
            primary_path: dir.path().join("missing.csv"),
            fallback_path: fallback.clone(),
        };
        assert_eq!(Dataset::locate(&config).unwrap(), fallback);

        let config = DatasetConfig {
            primary_path: dir.path().join("missing.csv"),
            fallback_path: dir.path().join("also-missing.csv"),
        };
        assert!(matches!(
            Dataset::locate(&config),
            Err(QaError::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn test_handle_loads_once_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotels.csv");
        std::fs::write(&path, HOTELS_CSV).unwrap();

        let handle = DatasetHandle::new(DatasetConfig {
            primary_path: path.clone(),
            fallback_path: dir.path().join("unused.csv"),
        });
        assert!(!handle.is_loaded());

        let first = handle.load().unwrap();
        // Removing the file proves the second call is served from the cache
        std::fs::remove_file(&path).unwrap();
        let second = handle.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.source(), Some(&path));
    }

    #[test]
    fn test_concurrent_first_load_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotels.csv");
        std::fs::write(&path, HOTELS_CSV).unwrap();

        let handle = Arc::new(DatasetHandle::new(DatasetConfig {
            primary_path: path,
            fallback_path: dir.path().join("unused.csv"),
        }));

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || handle.load().unwrap())
            })
            .collect();
        let loaded: Vec<Arc<Dataset>> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert!(Arc::ptr_eq(&loaded[0], &loaded[1]));
        assert_eq!(loaded[0].len(), 9);
    }

    #[test]
    fn test_handle_does_not_cache_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotels.csv");
        let handle = DatasetHandle::new(DatasetConfig {
            primary_path: path.clone(),
            fallback_path: dir.path().join("unused.csv"),
        });

        assert!(handle.load().is_err());
        std::fs::write(&path, HOTELS_CSV).unwrap();
        assert_eq!(handle.load().unwrap().len(), 9);
    }
}
