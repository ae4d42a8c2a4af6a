//! Date range validation handler

use axum::Json;
use serde::Deserialize;
use shared::{validate_date_range, DateRangeValidation};

#[derive(Debug, Deserialize)]
pub struct DateRangeInput {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

/// Check a proposed range against the forecast window
pub async fn validate_dates(Json(input): Json<DateRangeInput>) -> Json<DateRangeValidation> {
    Json(validate_date_range(&input.start_date, &input.end_date))
}
