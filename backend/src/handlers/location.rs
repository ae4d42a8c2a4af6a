//! Location search and gazetteer handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{Coordinates, GazetteerEntry, LocationMatch};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GazetteerInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 2, max = 3, message = "Country must be an ISO code"))]
    pub country: String,
    pub state: Option<String>,
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GazetteerInput {
    fn into_entry(self) -> AppResult<GazetteerEntry> {
        if self.latitude.abs() > Decimal::from(90) {
            return Err(AppError::Validation {
                field: "latitude".to_string(),
                message: "Latitude must be between -90 and 90".to_string(),
            });
        }
        if self.longitude.abs() > Decimal::from(180) {
            return Err(AppError::Validation {
                field: "longitude".to_string(),
                message: "Longitude must be between -180 and 180".to_string(),
            });
        }

        Ok(GazetteerEntry {
            name: self.name.trim().to_string(),
            country: self.country.trim().to_uppercase(),
            state: self
                .state
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            coordinates: Coordinates::new(self.latitude, self.longitude),
        })
    }
}

/// Ranked location candidates for free-form input
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<LocationMatch>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::Validation {
            field: "q".to_string(),
            message: "Search text is required".to_string(),
        });
    }
    Ok(Json(state.locations.find_matches(&params.q).await))
}

/// Append an entry to the fuzzy-match gazetteer
pub async fn add_gazetteer_entry(
    State(state): State<AppState>,
    Json(input): Json<GazetteerInput>,
) -> AppResult<(StatusCode, Json<GazetteerEntry>)> {
    input.validate()?;
    let entry = input.into_entry()?;
    state.locations.add_entry(entry.clone()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
