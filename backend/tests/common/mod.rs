//! Shared fixtures for integration tests: stub collaborators and app state

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use shared::{
    normalize_location, parse_coordinate_pair, AiInsight, Coordinates, DailyForecast, DateRange, ForecastSnapshot,
    WeatherQuery, WeatherSnapshot,
};
use uuid::Uuid;
use weather_query_backend::config::Config;
use weather_query_backend::error::{AppError, AppResult};
use weather_query_backend::external::{LlmGateway, WeatherProvider};
use weather_query_backend::store::{MemoryQueryStore, QueryStore};
use weather_query_backend::AppState;

// ============================================================================
// Weather provider stub
// ============================================================================

/// (lookup key, name, country, temperature, description, lat, lon)
type Place = (&'static str, &'static str, &'static str, f64, &'static str, f64, f64);

const PLACES: &[Place] = &[
    ("london", "London", "GB", 12.0, "light rain", 51.5074, -0.1278),
    ("paris", "Paris", "FR", 18.5, "clear sky", 48.8566, 2.3522),
    ("tokyo", "Tokyo", "JP", 24.0, "scattered clouds", 35.6762, 139.6503),
    ("sydney", "Sydney", "AU", 21.0, "clear sky", -33.8688, 151.2093),
];

pub fn snapshot(name: &str, country: &str, temperature: f64, description: &str) -> WeatherSnapshot {
    let observed = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    WeatherSnapshot {
        location_name: name.to_string(),
        country: country.to_string(),
        coordinates: None,
        temperature,
        feels_like: temperature - 1.0,
        description: description.to_string(),
        icon: "01d".to_string(),
        humidity: 60,
        pressure: 1013,
        wind_speed: 3.5,
        wind_direction: 225,
        visibility: 10000,
        cloud_cover: 20,
        sunrise: observed - Duration::hours(7),
        sunset: observed + Duration::hours(8),
        observed_at: observed,
    }
}

fn forecast_for(name: &str, country: &str, rain_probability: f64) -> ForecastSnapshot {
    let first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    ForecastSnapshot {
        city: name.to_string(),
        country: country.to_string(),
        days: (0..5)
            .map(|i| {
                let date = first + Duration::days(i);
                DailyForecast {
                    date,
                    label: date.format("%a, %b %-d").to_string(),
                    temp_min: 10.0,
                    temp_max: 20.0,
                    description: "few clouds".to_string(),
                    icon: "02d".to_string(),
                    humidity: 55,
                    wind_speed: 4.0,
                    precipitation_probability: rain_probability,
                }
            })
            .collect(),
    }
}

/// Resolves a handful of known cities by name or by exact coordinates
#[derive(Default)]
pub struct StubWeather {
    pub fail_forecast: bool,
    pub unreachable: bool,
    pub current_calls: AtomicUsize,
}

impl StubWeather {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, location: &str) -> AppResult<&'static Place> {
        if self.unreachable {
            return Err(AppError::weather_provider(None, "connection refused"));
        }
        let key = normalize_location(location);
        let coords = parse_coordinate_pair(location)
            .and_then(|(lat, lon)| Some((lat.parse::<f64>().ok()?, lon.parse::<f64>().ok()?)));
        PLACES
            .iter()
            .find(|p| match coords {
                Some((lat, lon)) => (p.5 - lat).abs() < 1e-4 && (p.6 - lon).abs() < 1e-4,
                None => p.0 == key,
            })
            .ok_or_else(|| AppError::weather_provider(Some(404), "city not found"))
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current_weather(&self, location: &str) -> AppResult<WeatherSnapshot> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let place = self.lookup(location)?;
        let mut snap = snapshot(place.1, place.2, place.3, place.4);
        snap.coordinates = Some(Coordinates::from_f64(place.5, place.6));
        Ok(snap)
    }

    async fn forecast(&self, location: &str) -> AppResult<ForecastSnapshot> {
        let place = self.lookup(location)?;
        if self.fail_forecast {
            return Err(AppError::weather_provider(Some(500), "forecast backend down"));
        }
        Ok(forecast_for(place.1, place.2, 0.2))
    }
}

// ============================================================================
// LLM gateway stub
// ============================================================================

/// Replies with a canned text, or fails when `reply` is `None`
pub struct StubLlm {
    pub reply: Option<String>,
    pub calls: AtomicUsize,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmGateway for StubLlm {
    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| AppError::AiUnavailable("gateway returned 502".to_string()))
    }
}

pub const JSON_REPLY: &str = r#"Sure! {"summary": "Mild and pleasant", "recommendations": ["Bring a light jacket"], "travel_advice": "Trains run normally", "clothing_tips": ["Layers"]}"#;

// ============================================================================
// State builders
// ============================================================================

pub fn test_config() -> Config {
    Config::defaults().unwrap()
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryQueryStore>,
    pub weather: Arc<StubWeather>,
}

pub fn app_with(weather: StubWeather, llm: Option<Arc<dyn LlmGateway>>) -> TestApp {
    let store = Arc::new(MemoryQueryStore::new());
    let weather = Arc::new(weather);
    let state = AppState::new(
        test_config(),
        store.clone() as Arc<dyn QueryStore>,
        weather.clone() as Arc<dyn WeatherProvider>,
        llm,
    );
    TestApp {
        state,
        store,
        weather,
    }
}

pub fn app() -> TestApp {
    app_with(StubWeather::new(), None)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// A stored-shape query built directly, bypassing the service
pub fn sample_query(location: &str, notes: &str, tags: &[&str]) -> WeatherQuery {
    let now = Utc::now();
    WeatherQuery {
        id: Uuid::new_v4(),
        location: location.to_string(),
        normalized_location: normalize_location(location),
        coordinates: None,
        date_range: DateRange::new(today(), today() + Duration::days(2)),
        weather_data: snapshot(location, "GB", 14.0, "overcast clouds"),
        forecast_data: None,
        user_notes: notes.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_insight(query: &WeatherQuery, text: &str) -> AiInsight {
    AiInsight {
        id: Uuid::new_v4(),
        query_id: query.id,
        location: query.location.clone(),
        insight: text.to_string(),
        recommendations: vec!["Pack an umbrella".to_string(), "Book indoor tours".to_string()],
        weather_summary: query.weather_data.summary(),
        travel_advice: Some("Expect delays on the ring road".to_string()),
        clothing_recommendations: Some(vec!["Raincoat".to_string()]),
        activity_suggestions: None,
        generated_at: Utc::now(),
        model: "stub-model".to_string(),
    }
}
