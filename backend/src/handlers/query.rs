//! Weather query HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{AiInsight, LocationContext, PaginatedResponse, QueryFilter, WeatherQuery};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::context;
use crate::services::query::{CreateQueryInput, UpdateQueryInput};
use crate::AppState;

/// A query with its latest insight and derived location context
#[derive(Debug, Serialize)]
pub struct QueryDetail {
    pub query: WeatherQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<AiInsight>,
    pub context: LocationContext,
}

/// Listing filters shared by the list and export endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQueriesParams {
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Comma-separated, match-any
    pub tags: Option<String>,
    pub has_insight: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Split a comma-separated parameter, dropping blanks
pub(crate) fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn build_filter(
    location: Option<&str>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    tags: Option<&str>,
    has_insight: Option<bool>,
) -> AppResult<QueryFilter> {
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(AppError::Validation {
                field: "date_from".to_string(),
                message: "date_from must be on or before date_to".to_string(),
            });
        }
    }

    Ok(QueryFilter {
        location: location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
        date_from,
        date_to,
        tags: split_list(tags),
        has_insight,
        ids: Vec::new(),
    })
}

/// Assemble a detail response; insight and context are derived concurrently
async fn query_detail(state: &AppState, query: WeatherQuery, refresh: bool) -> AppResult<QueryDetail> {
    let derive_context = async {
        context::generate(&query.location, &query.weather_data, query.forecast_data.as_ref())
    };

    let (insight, context) = if refresh {
        tokio::join!(state.insights.refresh_for_query(&query), derive_context)
    } else {
        let (stored, context) = tokio::join!(state.insights.get_for_query(query.id), derive_context);
        (stored?, context)
    };

    Ok(QueryDetail {
        query,
        insight,
        context,
    })
}

pub(crate) async fn load_query(state: &AppState, id: Uuid) -> AppResult<WeatherQuery> {
    state
        .queries
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Weather query {}", id)))
}

/// List saved queries, newest first
pub async fn list_queries(
    State(state): State<AppState>,
    Query(params): Query<ListQueriesParams>,
) -> AppResult<Json<PaginatedResponse<WeatherQuery>>> {
    let filter = build_filter(
        params.location.as_deref(),
        params.date_from,
        params.date_to,
        params.tags.as_deref(),
        params.has_insight,
    )?;
    let page = state.queries.list(&filter, params.page, params.limit).await?;
    Ok(Json(page))
}

/// Create a query
pub async fn create_query(
    State(state): State<AppState>,
    Json(input): Json<CreateQueryInput>,
) -> AppResult<(StatusCode, Json<QueryDetail>)> {
    let generate_insight = input.generate_insight.unwrap_or(true);
    let query = state.queries.create(input).await?;
    let detail = query_detail(&state, query, generate_insight).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get a query with its insight and context
pub async fn get_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<Json<QueryDetail>> {
    let query = load_query(&state, query_id).await?;
    Ok(Json(query_detail(&state, query, false).await?))
}

/// Partially update a query
pub async fn update_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
    Json(input): Json<UpdateQueryInput>,
) -> AppResult<Json<QueryDetail>> {
    let outcome = state.queries.update(query_id, input).await?;
    let detail = query_detail(&state, outcome.query, outcome.location_changed).await?;
    Ok(Json(detail))
}

/// Delete a query and its insights
pub async fn delete_query(
    State(state): State<AppState>,
    Path(query_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.queries.delete(query_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Weather query {}", query_id)))
    }
}
