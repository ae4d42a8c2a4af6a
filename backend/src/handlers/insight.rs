//! AI insight and location context handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::{AiInsight, LocationContext};
use uuid::Uuid;

use super::query::load_query;
use crate::error::{AppError, AppResult};
use crate::services::context;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub query_id: Uuid,
    pub location: String,
    pub activities: Vec<String>,
}

/// Latest stored insight for a query
pub async fn get_insight(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<Json<AiInsight>> {
    let query = load_query(&state, query_id).await?;
    let insight = state
        .insights
        .get_for_query(query.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Insight for weather query {}", query_id)))?;
    Ok(Json(insight))
}

/// Regenerate the insight for a query
pub async fn regenerate_insight(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<Json<AiInsight>> {
    let query = load_query(&state, query_id).await?;
    let insight = state.insights.regenerate(&query).await?;
    Ok(Json(insight))
}

/// Location context for the stored snapshot
pub async fn get_context(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<Json<LocationContext>> {
    let query = load_query(&state, query_id).await?;
    Ok(Json(context::generate(
        &query.location,
        &query.weather_data,
        query.forecast_data.as_ref(),
    )))
}

/// Activity suggestions for a query's location and dates
pub async fn suggest_activities(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<Json<ActivitiesResponse>> {
    let query = load_query(&state, query_id).await?;
    let activities = state
        .insights
        .activity_suggestions(&query.location, &query.weather_data, &query.date_range)
        .await;

    Ok(Json(ActivitiesResponse {
        query_id: query.id,
        location: query.location,
        activities,
    }))
}
