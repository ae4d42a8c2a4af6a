//! Weather data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Coordinates;

/// Current conditions captured from the weather provider at one instant.
///
/// Embedded by value inside a [`crate::WeatherQuery`]; never referenced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coordinates: Option<Coordinates>,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub icon: String,
    pub humidity: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub visibility: i32,
    pub cloud_cover: i32,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// "London, GB" or just the name when the provider gave no country
    pub fn display_location(&self) -> String {
        if self.country.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country)
        }
    }

    /// 16-point compass label for the wind direction
    pub fn wind_compass(&self) -> &'static str {
        compass_point(self.wind_direction)
    }

    /// One-line human summary of the conditions
    pub fn summary(&self) -> String {
        format!(
            "{}, {:.1}°C (feels like {:.1}°C), humidity {}%, wind {:.1} m/s {}",
            capitalize(&self.description),
            self.temperature,
            self.feels_like,
            self.humidity,
            self.wind_speed,
            self.wind_compass()
        )
    }
}

/// Five-day forecast grouped into calendar days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSnapshot {
    pub city: String,
    pub country: String,
    pub days: Vec<DailyForecast>,
}

/// Daily aggregate of the provider's 3-hour records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub label: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub description: String,
    pub icon: String,
    pub humidity: i32,
    pub wind_speed: f64,
    /// Probability of precipitation (0-1)
    pub precipitation_probability: f64,
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Map a bearing in degrees onto a 16-point compass label
pub fn compass_point(degrees: i32) -> &'static str {
    let normalized = f64::from(degrees.rem_euclid(360));
    let index = ((normalized / 22.5).round() as usize) % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compass_points() {
        assert_eq!(compass_point(0), "N");
        assert_eq!(compass_point(360), "N");
        assert_eq!(compass_point(90), "E");
        assert_eq!(compass_point(200), "SSW");
        assert_eq!(compass_point(-90), "W");
        assert_eq!(compass_point(350), "N");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("light rain"), "Light rain");
        assert_eq!(capitalize(""), "");
    }
}
