//! Location matching service
//!
//! Resolves free-form location input. The weather provider is asked first
//! and is authoritative; when it cannot resolve the input, a small built-in
//! gazetteer is searched by string similarity.

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{location_key, Coordinates, GazetteerEntry, LocationMatch};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::external::WeatherProvider;

/// Minimum similarity for a gazetteer entry to count as a candidate
const MIN_CONFIDENCE: f64 = 0.75;

/// Maximum fuzzy candidates returned
const MAX_CANDIDATES: usize = 5;

/// Location matcher over the weather provider and the gazetteer
#[derive(Clone)]
pub struct LocationMatcher {
    weather: Arc<dyn WeatherProvider>,
    gazetteer: Arc<RwLock<Vec<GazetteerEntry>>>,
}

fn entry(name: &str, country: &str, state: Option<&str>, lat: i64, lon: i64) -> GazetteerEntry {
    GazetteerEntry {
        name: name.to_string(),
        country: country.to_string(),
        state: state.map(str::to_string),
        coordinates: Coordinates::new(Decimal::new(lat, 4), Decimal::new(lon, 4)),
    }
}

/// Built-in gazetteer of major cities
pub fn default_gazetteer() -> Vec<GazetteerEntry> {
    vec![
        entry("New York", "US", Some("NY"), 407128, -740060),
        entry("London", "GB", None, 515074, -1278),
        entry("Paris", "FR", None, 488566, 23522),
        entry("Tokyo", "JP", None, 356762, 1396503),
        entry("Sydney", "AU", Some("NSW"), -338688, 1512093),
        entry("Los Angeles", "US", Some("CA"), 340522, -1182437),
        entry("Chicago", "US", Some("IL"), 418781, -876298),
        entry("Toronto", "CA", Some("ON"), 436532, -793832),
        entry("Berlin", "DE", None, 525200, 134050),
        entry("Rome", "IT", None, 419028, 124964),
        entry("Dubai", "AE", None, 252048, 552708),
        entry("Singapore", "SG", None, 13521, 1038198),
        entry("Cape Town", "ZA", None, -339249, 184241),
        entry("Auckland", "NZ", None, -368485, 1747633),
    ]
}

/// Similarity of `input` against a gazetteer entry, in `[0, 1]`
fn similarity(input: &str, entry: &GazetteerEntry) -> f64 {
    let name = entry.name.to_lowercase();
    strsim::jaro_winkler(input, &name)
}

impl LocationMatcher {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self::with_gazetteer(weather, default_gazetteer())
    }

    pub fn with_gazetteer(weather: Arc<dyn WeatherProvider>, entries: Vec<GazetteerEntry>) -> Self {
        Self {
            weather,
            gazetteer: Arc::new(RwLock::new(entries)),
        }
    }

    /// Ranked candidates for `input`; empty when nothing matched
    pub async fn find_matches(&self, input: &str) -> Vec<LocationMatch> {
        let input = input.trim();
        if input.is_empty() {
            return Vec::new();
        }

        match self.weather.current_weather(input).await {
            Ok(snapshot) => {
                let coordinates = snapshot
                    .coordinates
                    .unwrap_or_else(|| Coordinates::new(Decimal::ZERO, Decimal::ZERO));
                vec![LocationMatch {
                    name: snapshot.location_name,
                    country: snapshot.country,
                    state: None,
                    coordinates,
                    confidence: 1.0,
                }]
            }
            Err(e) => {
                tracing::debug!(location = input, error = %e, "Provider lookup failed; trying gazetteer");
                self.fuzzy_matches(input).await
            }
        }
    }

    /// Best candidate for `input`, or `LocationNotFound`
    pub async fn resolve(&self, input: &str) -> AppResult<LocationMatch> {
        self.find_matches(input)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LocationNotFound(input.trim().to_string()))
    }

    /// Gazetteer-only matching, ranked by confidence (Jaro-Winkler
    /// similarity, i.e. `1 - distance`)
    pub async fn fuzzy_matches(&self, input: &str) -> Vec<LocationMatch> {
        let key = location_key(input);
        if key.is_empty() {
            return Vec::new();
        }

        let gazetteer = self.gazetteer.read().await;
        let mut matches: Vec<LocationMatch> = gazetteer
            .iter()
            .map(|entry| (entry, similarity(&key, entry)))
            .filter(|(_, confidence)| *confidence >= MIN_CONFIDENCE)
            .map(|(entry, confidence)| LocationMatch {
                name: entry.name.clone(),
                country: entry.country.clone(),
                state: entry.state.clone(),
                coordinates: entry.coordinates,
                confidence,
            })
            .collect();

        matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        matches.truncate(MAX_CANDIDATES);
        matches
    }

    /// Append an entry to the gazetteer
    pub async fn add_entry(&self, entry: GazetteerEntry) -> AppResult<()> {
        if entry.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Gazetteer entry name is required".to_string(),
            });
        }

        let mut gazetteer = self.gazetteer.write().await;
        let key = entry.name.trim().to_lowercase();
        if gazetteer
            .iter()
            .any(|e| e.name.to_lowercase() == key && e.country == entry.country)
        {
            return Err(AppError::ValidationError(format!(
                "{} ({}) is already in the gazetteer",
                entry.name, entry.country
            )));
        }

        tracing::info!(name = %entry.name, country = %entry.country, "Gazetteer entry added");
        gazetteer.push(entry);
        Ok(())
    }

    pub async fn gazetteer_len(&self) -> usize {
        self.gazetteer.read().await.len()
    }
}
