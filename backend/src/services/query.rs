//! Weather query lifecycle: create, read, update, delete and list
//!
//! Every write that sets a location also captures a fresh weather snapshot.
//! The current-conditions fetch is required; the forecast is best effort.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    normalize_location, normalize_tags, validate_date_range_at, validate_range_at, Coordinates,
    DateRange, DateRangeValidation, ForecastSnapshot, Pagination, PaginatedResponse, QueryFilter,
    WeatherQuery, WeatherSnapshot,
};
use uuid::Uuid;
use validator::Validate;

use super::location::LocationMatcher;
use crate::config::ListingConfig;
use crate::error::{AppError, AppResult};
use crate::external::WeatherProvider;
use crate::store::QueryStore;

/// Query service
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn QueryStore>,
    weather: Arc<dyn WeatherProvider>,
    locations: LocationMatcher,
    listing: ListingConfig,
}

/// Input for creating a query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQueryInput {
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    #[serde(default)]
    pub location: String,
    #[validate(length(min = 1, message = "Start date is required"))]
    #[serde(default)]
    pub start_date: String,
    #[validate(length(min = 1, message = "End date is required"))]
    #[serde(default)]
    pub end_date: String,
    #[validate(length(max = 5000))]
    pub user_notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Skip insight generation when false
    pub generate_insight: Option<bool>,
}

/// Partial update; omitted fields stay untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQueryInput {
    #[validate(length(min = 1, max = 200, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[validate(length(max = 5000))]
    pub user_notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Result of an update
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub query: WeatherQuery,
    /// The stored location now differs from before the update
    pub location_changed: bool,
}

/// Snapshots captured for one location
struct CapturedWeather {
    weather: WeatherSnapshot,
    forecast: Option<ForecastSnapshot>,
    coordinates: Option<Coordinates>,
}

fn required_location(location: &str) -> AppResult<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::Validation {
            field: "location".to_string(),
            message: "Location is required".to_string(),
        });
    }
    Ok(location.to_string())
}

fn parse_date(field: &str, input: &str) -> AppResult<chrono::NaiveDate> {
    shared::parse_calendar_date(input).ok_or_else(|| AppError::Validation {
        field: field.to_string(),
        message: format!("Invalid {}: '{}'", field.replace('_', " "), input.trim()),
    })
}

fn check_range(validation: DateRangeValidation) -> AppResult<()> {
    if validation.valid {
        return Ok(());
    }
    Err(AppError::Validation {
        field: "date_range".to_string(),
        message: validation.errors.join("; "),
    })
}

impl QueryService {
    pub fn new(
        store: Arc<dyn QueryStore>,
        weather: Arc<dyn WeatherProvider>,
        locations: LocationMatcher,
        listing: ListingConfig,
    ) -> Self {
        Self {
            store,
            weather,
            locations,
            listing,
        }
    }

    /// Fetch current conditions and forecast concurrently. When the
    /// provider cannot resolve the input, retry once with the best
    /// gazetteer candidate's coordinates.
    async fn capture_weather(&self, location: &str) -> AppResult<CapturedWeather> {
        let (current, forecast) = tokio::join!(
            self.weather.current_weather(location),
            self.weather.forecast(location)
        );

        let (weather, forecast) = match current {
            Ok(weather) => (weather, forecast),
            Err(e) => {
                let candidates = self.locations.fuzzy_matches(location).await;
                let Some(candidate) = candidates.into_iter().next() else {
                    tracing::debug!(location, error = %e, "Location could not be resolved");
                    return Err(match e {
                        AppError::WeatherProvider {
                            status: Some(404), ..
                        } => AppError::LocationNotFound(location.to_string()),
                        other => other,
                    });
                };

                tracing::info!(
                    location,
                    candidate = %candidate.name,
                    confidence = candidate.confidence,
                    "Using gazetteer match"
                );
                let coordinates = candidate.coordinates.as_query();
                let (current, forecast) = tokio::join!(
                    self.weather.current_weather(&coordinates),
                    self.weather.forecast(&coordinates)
                );
                (current?, forecast)
            }
        };

        let forecast = match forecast {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                tracing::warn!(location, error = %e, "Forecast unavailable; continuing without it");
                None
            }
        };

        Ok(CapturedWeather {
            coordinates: weather.coordinates,
            weather,
            forecast,
        })
    }

    /// Create a query after validating its range and resolving its location
    pub async fn create(&self, input: CreateQueryInput) -> AppResult<WeatherQuery> {
        input.validate()?;
        let location = required_location(&input.location)?;

        let validation =
            validate_date_range_at(&input.start_date, &input.end_date, Utc::now().date_naive());
        let date_range = validation.adjusted_range;
        check_range(validation)?;

        let captured = self.capture_weather(&location).await?;

        let now = Utc::now();
        let query = WeatherQuery {
            id: Uuid::new_v4(),
            normalized_location: normalize_location(&location),
            location,
            coordinates: captured.coordinates,
            date_range,
            weather_data: captured.weather,
            forecast_data: captured.forecast,
            user_notes: input.user_notes.unwrap_or_default(),
            tags: normalize_tags(&input.tags),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_query(&query).await?;
        tracing::info!(query_id = %query.id, location = %query.location, "Weather query created");

        Ok(query)
    }

    /// Get a query by id; `None` when absent
    pub async fn get(&self, id: Uuid) -> AppResult<Option<WeatherQuery>> {
        self.store.find_query(id).await
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, input: UpdateQueryInput) -> AppResult<UpdateOutcome> {
        input.validate()?;

        let mut query = self
            .store
            .find_query(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Weather query {}", id)))?;

        if input.start_date.is_some() || input.end_date.is_some() {
            let start = match &input.start_date {
                Some(s) => parse_date("start_date", s)?,
                None => query.date_range.start,
            };
            let end = match &input.end_date {
                Some(s) => parse_date("end_date", s)?,
                None => query.date_range.end,
            };
            let date_range = DateRange::new(start, end);
            check_range(validate_range_at(date_range, Utc::now().date_naive()))?;
            query.date_range = date_range;
        }

        let mut location_changed = false;
        if let Some(location) = &input.location {
            let location = required_location(location)?;
            let captured = self.capture_weather(&location).await?;

            let normalized = normalize_location(&location);
            location_changed = normalized != query.normalized_location;

            query.location = location;
            query.normalized_location = normalized;
            query.coordinates = captured.coordinates;
            query.weather_data = captured.weather;
            query.forecast_data = captured.forecast;
        }

        if let Some(notes) = input.user_notes {
            query.user_notes = notes;
        }
        if let Some(tags) = &input.tags {
            query.tags = normalize_tags(tags);
        }
        query.updated_at = Utc::now();

        if !self.store.replace_query(&query).await? {
            return Err(AppError::NotFound(format!("Weather query {}", id)));
        }
        tracing::info!(query_id = %id, location_changed, "Weather query updated");

        Ok(UpdateOutcome {
            query,
            location_changed,
        })
    }

    /// Delete a query and its insights; false when nothing was removed
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        // insights first: an insight never outlives its query
        let insights = self.store.delete_insights_for_query(id).await?;
        let removed = self.store.delete_query(id).await?;

        if removed {
            tracing::info!(query_id = %id, insights_removed = insights, "Weather query deleted");
        }
        Ok(removed)
    }

    /// One page of queries, newest first
    pub async fn list(
        &self,
        filter: &QueryFilter,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> AppResult<PaginatedResponse<WeatherQuery>> {
        let pagination = Pagination::clamped(
            page,
            per_page,
            self.listing.default_page_size,
            self.listing.max_page_size,
        );

        let total = self.store.count_queries(filter).await?;
        let data = self
            .store
            .find_queries(filter, pagination.offset(), u64::from(pagination.per_page))
            .await?;

        Ok(PaginatedResponse {
            data,
            pagination: pagination.meta(total),
        })
    }

    /// Queries selected for export, bounded by `max_records`
    pub async fn list_for_export(
        &self,
        filter: &QueryFilter,
        max_records: u32,
    ) -> AppResult<Vec<WeatherQuery>> {
        self.store
            .find_queries(filter, 0, u64::from(max_records))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_location_trims() {
        assert_eq!(required_location("  Paris ").unwrap(), "Paris");
        assert!(matches!(
            required_location("   "),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_parse_date_reports_field() {
        match parse_date("start_date", "yesterday") {
            Err(AppError::Validation { field, message }) => {
                assert_eq!(field, "start_date");
                assert!(message.contains("yesterday"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_create_input_validation() {
        let input = CreateQueryInput {
            location: String::new(),
            start_date: "2024-06-01".to_string(),
            end_date: "2024-06-03".to_string(),
            user_notes: None,
            tags: vec![],
            generate_insight: None,
        };
        let err: AppError = input.validate().unwrap_err().into();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "location"));
    }
}
