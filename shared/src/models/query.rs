//! Weather query records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::weather::{ForecastSnapshot, WeatherSnapshot};
use crate::types::{Coordinates, DateRange};

/// A saved weather lookup: location, date range and the weather captured
/// when it was created or last relocated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherQuery {
    pub id: Uuid,
    pub location: String,
    /// Lowercased, whitespace-collapsed location used for search
    pub normalized_location: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coordinates: Option<Coordinates>,
    pub date_range: DateRange,
    pub weather_data: WeatherSnapshot,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub forecast_data: Option<ForecastSnapshot>,
    #[serde(default)]
    pub user_notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filters over stored queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Substring of the normalized location
    pub location: Option<String>,
    /// Inclusive lower bound on the range start date
    pub date_from: Option<chrono::NaiveDate>,
    /// Inclusive upper bound on the range start date
    pub date_to: Option<chrono::NaiveDate>,
    /// Match-any tag membership
    pub tags: Vec<String>,
    pub has_insight: Option<bool>,
    /// Restrict to these ids (export selection)
    pub ids: Vec<Uuid>,
}

impl QueryFilter {
    /// Whether `query` passes every filter except `has_insight`, which needs
    /// the insight collection to decide.
    pub fn matches_document(&self, query: &WeatherQuery) -> bool {
        if let Some(location) = &self.location {
            let needle = crate::validation::normalize_location(location);
            if !query.normalized_location.contains(&needle) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if query.date_range.start < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if query.date_range.start > to {
                return false;
            }
        }
        if !self.tags.is_empty() && !query.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if !self.ids.is_empty() && !self.ids.contains(&query.id) {
            return false;
        }
        true
    }
}

/// Normalize a user tag list: trim, drop empties and duplicates, keep order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " trip ".to_string(),
            "".to_string(),
            "work".to_string(),
            "trip".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["trip", "work"]);
    }
}
