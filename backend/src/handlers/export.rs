//! Export download handler

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::query::{build_filter, split_list};
use crate::error::{AppError, AppResult};
use crate::services::ExportFormat;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    /// json, csv, xml, pdf or markdown; defaults to json
    pub format: Option<String>,
    /// Comma-separated query ids; when present, filters narrow this set
    pub ids: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub tags: Option<String>,
    pub has_insight: Option<bool>,
}

fn parse_ids(ids: Option<&str>) -> AppResult<Vec<Uuid>> {
    split_list(ids)
        .iter()
        .map(|id| {
            Uuid::parse_str(id).map_err(|_| AppError::Validation {
                field: "ids".to_string(),
                message: format!("Invalid query id: '{}'", id),
            })
        })
        .collect()
}

/// Render saved queries and their insights as a download
pub async fn export_queries(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let format: ExportFormat = params.format.as_deref().unwrap_or("json").parse()?;

    let mut filter = build_filter(
        params.location.as_deref(),
        params.date_from,
        params.date_to,
        params.tags.as_deref(),
        params.has_insight,
    )?;
    filter.ids = parse_ids(params.ids.as_deref())?;

    let queries = state
        .queries
        .list_for_export(&filter, state.exporter.max_records())
        .await?;
    let ids: Vec<Uuid> = queries.iter().map(|q| q.id).collect();
    let insights = state.insights.insights_for_queries(&ids).await?;

    let payload = state
        .exporter
        .export(&queries, &insights, format, Utc::now())?;

    Ok((
        [
            (header::CONTENT_TYPE, payload.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", payload.filename),
            ),
        ],
        payload.body,
    )
        .into_response())
}
