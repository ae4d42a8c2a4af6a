//! In-process document store
//!
//! Used by the test suite and by `database.backend = "memory"`.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::QueryStore;
use crate::error::AppResult;
use crate::models::{AiInsight, QueryFilter, WeatherQuery};

#[derive(Default)]
pub struct MemoryQueryStore {
    /// Insertion order is kept so equal timestamps sort newest-inserted first
    queries: RwLock<Vec<WeatherQuery>>,
    insights: RwLock<Vec<AiInsight>>,
}

impl MemoryQueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered(&self, filter: &QueryFilter) -> Vec<WeatherQuery> {
        let queries = self.queries.read().await;
        let insights = self.insights.read().await;

        let mut matched: Vec<WeatherQuery> = queries
            .iter()
            .rev()
            .filter(|q| filter.matches_document(q))
            .filter(|q| match filter.has_insight {
                Some(wanted) => insights.iter().any(|i| i.query_id == q.id) == wanted,
                None => true,
            })
            .cloned()
            .collect();

        // stable: ties keep newest-inserted first
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

#[async_trait]
impl QueryStore for MemoryQueryStore {
    async fn insert_query(&self, query: &WeatherQuery) -> AppResult<()> {
        self.queries.write().await.push(query.clone());
        Ok(())
    }

    async fn find_query(&self, id: Uuid) -> AppResult<Option<WeatherQuery>> {
        let queries = self.queries.read().await;
        Ok(queries.iter().find(|q| q.id == id).cloned())
    }

    async fn replace_query(&self, query: &WeatherQuery) -> AppResult<bool> {
        let mut queries = self.queries.write().await;
        match queries.iter_mut().find(|q| q.id == query.id) {
            Some(existing) => {
                *existing = query.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_query(&self, id: Uuid) -> AppResult<bool> {
        let mut queries = self.queries.write().await;
        let before = queries.len();
        queries.retain(|q| q.id != id);
        Ok(queries.len() != before)
    }

    async fn find_queries(
        &self,
        filter: &QueryFilter,
        skip: u64,
        limit: u64,
    ) -> AppResult<Vec<WeatherQuery>> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .filtered(filter)
            .await
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count_queries(&self, filter: &QueryFilter) -> AppResult<u64> {
        Ok(self.filtered(filter).await.len() as u64)
    }

    async fn insert_insight(&self, insight: &AiInsight) -> AppResult<()> {
        self.insights.write().await.push(insight.clone());
        Ok(())
    }

    async fn find_insight_for_query(&self, query_id: Uuid) -> AppResult<Option<AiInsight>> {
        let insights = self.insights.read().await;
        Ok(insights
            .iter()
            .filter(|i| i.query_id == query_id)
            .max_by_key(|i| i.generated_at)
            .cloned())
    }

    async fn find_insights_for_queries(&self, query_ids: &[Uuid]) -> AppResult<Vec<AiInsight>> {
        let insights = self.insights.read().await;
        let mut found: Vec<AiInsight> = insights
            .iter()
            .filter(|i| query_ids.contains(&i.query_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(found)
    }

    async fn delete_insights_for_query(&self, query_id: Uuid) -> AppResult<u64> {
        let mut insights = self.insights.write().await;
        let before = insights.len();
        insights.retain(|i| i.query_id != query_id);
        Ok((before - insights.len()) as u64)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
