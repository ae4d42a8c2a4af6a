//! Live weather lookup handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::{ForecastSnapshot, WeatherSnapshot};

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    pub location: String,
}

fn required(location: &str) -> AppResult<&str> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::Validation {
            field: "location".to_string(),
            message: "Location is required".to_string(),
        });
    }
    Ok(location)
}

/// A provider 404 means the place is unknown, which is the caller's problem
fn unknown_location(location: &str) -> impl FnOnce(AppError) -> AppError + '_ {
    move |e| match e {
        AppError::WeatherProvider {
            status: Some(404), ..
        } => AppError::LocationNotFound(location.to_string()),
        other => other,
    }
}

/// Current conditions for a location
pub async fn current_weather(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> AppResult<Json<WeatherSnapshot>> {
    let location = required(&params.location)?;
    let snapshot = state
        .weather
        .current_weather(location)
        .await
        .map_err(unknown_location(location))?;
    Ok(Json(snapshot))
}

/// Five-day forecast for a location
pub async fn forecast(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> AppResult<Json<ForecastSnapshot>> {
    let location = required(&params.location)?;
    let forecast = state
        .weather
        .forecast(location)
        .await
        .map_err(unknown_location(location))?;
    Ok(Json(forecast))
}
