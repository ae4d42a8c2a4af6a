//! Document store for weather queries and their AI insights
//!
//! Two independent collections: query documents and insight documents, the
//! latter keyed back to their query by `query_id`. Writes are atomic per
//! document only; nothing spans both collections.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AiInsight, QueryFilter, WeatherQuery};

pub use memory::MemoryQueryStore;
pub use postgres::PgQueryStore;

#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn insert_query(&self, query: &WeatherQuery) -> AppResult<()>;

    async fn find_query(&self, id: Uuid) -> AppResult<Option<WeatherQuery>>;

    /// Replace the stored document; false when the id is unknown
    async fn replace_query(&self, query: &WeatherQuery) -> AppResult<bool>;

    /// Remove the document; false when the id is unknown
    async fn delete_query(&self, id: Uuid) -> AppResult<bool>;

    /// Filtered find, newest first, with skip/limit
    async fn find_queries(
        &self,
        filter: &QueryFilter,
        skip: u64,
        limit: u64,
    ) -> AppResult<Vec<WeatherQuery>>;

    async fn count_queries(&self, filter: &QueryFilter) -> AppResult<u64>;

    async fn insert_insight(&self, insight: &AiInsight) -> AppResult<()>;

    /// Most recent insight for a query
    async fn find_insight_for_query(&self, query_id: Uuid) -> AppResult<Option<AiInsight>>;

    async fn find_insights_for_queries(&self, query_ids: &[Uuid]) -> AppResult<Vec<AiInsight>>;

    /// Delete every insight owned by a query; returns how many were removed
    async fn delete_insights_for_query(&self, query_id: Uuid) -> AppResult<u64>;

    /// Connectivity check
    async fn ping(&self) -> AppResult<()>;
}
