//! PostgreSQL document store
//!
//! Each record is kept whole in a JSONB `document` column; a handful of
//! projected columns carry what listing needs to filter and sort.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::QueryStore;
use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{AiInsight, QueryFilter, WeatherQuery};

/// Newest first; ties on `created_at` keep the most recent insertion first
const LISTING_ORDER: &str = " ORDER BY q.created_at DESC, q.insert_seq DESC";

#[derive(Clone)]
pub struct PgQueryStore {
    pool: PgPool,
}

impl PgQueryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Storage(format!("Migration failed: {}", e)))
    }
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &QueryFilter) {
    if let Some(location) = &filter.location {
        builder
            .push(" AND q.normalized_location LIKE ")
            .push_bind(like_pattern(&shared::normalize_location(location)));
    }
    if let Some(from) = filter.date_from {
        builder.push(" AND q.start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        builder.push(" AND q.start_date <= ").push_bind(to);
    }
    if !filter.tags.is_empty() {
        builder.push(" AND q.tags && ").push_bind(filter.tags.clone());
    }
    if !filter.ids.is_empty() {
        builder
            .push(" AND q.id = ANY(")
            .push_bind(filter.ids.clone())
            .push(")");
    }
    match filter.has_insight {
        Some(true) => {
            builder.push(" AND EXISTS (SELECT 1 FROM ai_insights i WHERE i.query_id = q.id)");
        }
        Some(false) => {
            builder.push(" AND NOT EXISTS (SELECT 1 FROM ai_insights i WHERE i.query_id = q.id)");
        }
        None => {}
    }
}

#[async_trait]
impl QueryStore for PgQueryStore {
    async fn insert_query(&self, query: &WeatherQuery) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_queries (
                id, normalized_location, start_date, end_date, tags,
                created_at, updated_at, document
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(query.id)
        .bind(&query.normalized_location)
        .bind(query.date_range.start)
        .bind(query.date_range.end)
        .bind(&query.tags)
        .bind(query.created_at)
        .bind(query.updated_at)
        .bind(Json(query))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_query(&self, id: Uuid) -> AppResult<Option<WeatherQuery>> {
        let document = sqlx::query_scalar::<_, Json<WeatherQuery>>(
            "SELECT document FROM weather_queries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document.map(|Json(query)| query))
    }

    async fn replace_query(&self, query: &WeatherQuery) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE weather_queries
            SET normalized_location = $2, start_date = $3, end_date = $4, tags = $5,
                updated_at = $6, document = $7
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .bind(&query.normalized_location)
        .bind(query.date_range.start)
        .bind(query.date_range.end)
        .bind(&query.tags)
        .bind(query.updated_at)
        .bind(Json(query))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_query(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM weather_queries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_queries(
        &self,
        filter: &QueryFilter,
        skip: u64,
        limit: u64,
    ) -> AppResult<Vec<WeatherQuery>> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT q.document FROM weather_queries q WHERE TRUE");
        push_filters(&mut builder, filter);
        builder
            .push(LISTING_ORDER)
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(skip).unwrap_or(i64::MAX));

        let documents = builder
            .build_query_scalar::<Json<WeatherQuery>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(documents.into_iter().map(|Json(query)| query).collect())
    }

    async fn count_queries(&self, filter: &QueryFilter) -> AppResult<u64> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM weather_queries q WHERE TRUE");
        push_filters(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert_insight(&self, insight: &AiInsight) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ai_insights (id, query_id, generated_at, document)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(insight.id)
        .bind(insight.query_id)
        .bind(insight.generated_at)
        .bind(Json(insight))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_insight_for_query(&self, query_id: Uuid) -> AppResult<Option<AiInsight>> {
        let document = sqlx::query_scalar::<_, Json<AiInsight>>(
            r#"
            SELECT document FROM ai_insights
            WHERE query_id = $1
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(query_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document.map(|Json(insight)| insight))
    }

    async fn find_insights_for_queries(&self, query_ids: &[Uuid]) -> AppResult<Vec<AiInsight>> {
        if query_ids.is_empty() {
            return Ok(Vec::new());
        }

        let documents = sqlx::query_scalar::<_, Json<AiInsight>>(
            r#"
            SELECT document FROM ai_insights
            WHERE query_id = ANY($1)
            ORDER BY generated_at DESC
            "#,
        )
        .bind(query_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents.into_iter().map(|Json(insight)| insight).collect())
    }

    async fn delete_insights_for_query(&self, query_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM ai_insights WHERE query_id = $1")
            .bind(query_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
