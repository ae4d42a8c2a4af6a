//! Weather API client for fetching weather data
//!
//! Integrates with OpenWeatherMap API for current conditions and the
//! 5-day/3-hour forecast. Locations may be place names, postal codes or
//! `lat,lon` pairs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{
    is_postal_code, parse_coordinate_pair, Coordinates, DailyForecast, ForecastSnapshot,
    WeatherSnapshot,
};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Forecast days kept after grouping
pub const FORECAST_DAYS: usize = 5;

/// Read operations consumed from the upstream weather provider
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for a place name, postal code or `lat,lon` pair
    async fn current_weather(&self, location: &str) -> AppResult<WeatherSnapshot>;

    /// Daily forecast for a place name, postal code or `lat,lon` pair
    async fn forecast(&self, location: &str) -> AppResult<ForecastSnapshot>;
}

/// How a location string is sent to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSelector {
    Coordinates { lat: String, lon: String },
    PostalCode(String),
    Name(String),
}

impl LocationSelector {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if let Some((lat, lon)) = parse_coordinate_pair(location) {
            return Self::Coordinates {
                lat: lat.to_string(),
                lon: lon.to_string(),
            };
        }
        if is_postal_code(location) {
            return Self::PostalCode(location.replace(' ', ""));
        }
        Self::Name(location.to_string())
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Coordinates { lat, lon } => vec![("lat", lat.clone()), ("lon", lon.clone())],
            Self::PostalCode(zip) => vec![("zip", zip.clone())],
            Self::Name(name) => vec![("q", name.clone())],
        }
    }
}

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    coord: Option<OWMCoord>,
    #[serde(default)]
    weather: Vec<OWMWeather>,
    main: OWMMain,
    visibility: Option<i32>,
    wind: OWMWind,
    clouds: OWMClouds,
    dt: i64,
    sys: OWMSys,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OWMCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: i32,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
    deg: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OWMClouds {
    all: i32,
}

#[derive(Debug, Deserialize)]
struct OWMSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

/// OpenWeatherMap API response for forecast
#[derive(Debug, Deserialize)]
struct OWMForecastResponse {
    city: OWMCity,
    list: Vec<OWMForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OWMCity {
    name: String,
    country: Option<String>,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OWMForecastItem {
    dt: i64,
    main: OWMMain,
    #[serde(default)]
    weather: Vec<OWMWeather>,
    wind: OWMWind,
    #[serde(default)]
    pop: f64,
}

/// Error body returned by OpenWeatherMap (`cod` is sometimes a string)
#[derive(Debug, Deserialize)]
struct OWMError {
    message: Option<String>,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("Weather HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &str,
    ) -> AppResult<T> {
        let selector = LocationSelector::parse(location);
        let mut params = selector.query_pairs();
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, ?selector, "Requesting weather provider");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                AppError::weather_provider(None, format!("Weather API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OWMError>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(AppError::weather_provider(
                Some(status.as_u16()),
                format!("Weather API error: {} - {}", status, message),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::weather_provider(None, format!("Failed to parse weather response: {}", e))
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn current_weather(&self, location: &str) -> AppResult<WeatherSnapshot> {
        let data: OWMCurrentResponse = self.fetch("weather", location).await?;
        Ok(convert_current_response(data))
    }

    async fn forecast(&self, location: &str) -> AppResult<ForecastSnapshot> {
        let data: OWMForecastResponse = self.fetch("forecast", location).await?;
        Ok(convert_forecast_response(data))
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Convert OpenWeatherMap current response to our format
fn convert_current_response(data: OWMCurrentResponse) -> WeatherSnapshot {
    let weather = data.weather.first();

    WeatherSnapshot {
        location_name: data.name,
        country: data.sys.country.unwrap_or_default(),
        coordinates: data.coord.map(|c| Coordinates::from_f64(c.lat, c.lon)),
        temperature: data.main.temp,
        feels_like: data.main.feels_like,
        description: weather.map(|w| w.description.clone()).unwrap_or_default(),
        icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        wind_speed: data.wind.speed,
        wind_direction: data.wind.deg.unwrap_or(0),
        visibility: data.visibility.unwrap_or(10000),
        cloud_cover: data.clouds.all,
        sunrise: timestamp(data.sys.sunrise),
        sunset: timestamp(data.sys.sunset),
        observed_at: timestamp(data.dt),
    }
}

/// Group 3-hour records by the city's local calendar day
fn convert_forecast_response(data: OWMForecastResponse) -> ForecastSnapshot {
    let offset = FixedOffset::east_opt(data.city.timezone).unwrap_or(Utc.fix());

    let mut by_day: BTreeMap<NaiveDate, DailyForecast> = BTreeMap::new();
    for item in data.list {
        let local = timestamp(item.dt).with_timezone(&offset);
        let date = local.date_naive();
        let weather = item.weather.first();

        by_day
            .entry(date)
            .and_modify(|day| {
                day.temp_min = day.temp_min.min(item.main.temp_min);
                day.temp_max = day.temp_max.max(item.main.temp_max);
                day.precipitation_probability = day.precipitation_probability.max(item.pop);
            })
            .or_insert_with(|| DailyForecast {
                date,
                label: date.format("%a, %b %-d").to_string(),
                temp_min: item.main.temp_min,
                temp_max: item.main.temp_max,
                description: weather.map(|w| w.description.clone()).unwrap_or_default(),
                icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
                humidity: item.main.humidity,
                wind_speed: item.wind.speed,
                precipitation_probability: item.pop,
            });
    }

    ForecastSnapshot {
        city: data.city.name,
        country: data.city.country.unwrap_or_default(),
        days: by_day.into_values().take(FORECAST_DAYS).collect(),
    }
}
