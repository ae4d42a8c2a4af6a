//! AI-generated insight records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Natural-language insight owned by exactly one [`crate::WeatherQuery`].
///
/// Stored separately from the query (referenced by `query_id`) so it can be
/// regenerated wholesale without touching the query document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiInsight {
    pub id: Uuid,
    pub query_id: Uuid,
    pub location: String,
    pub insight: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub weather_summary: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub travel_advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clothing_recommendations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub activity_suggestions: Option<Vec<String>>,
    pub generated_at: DateTime<Utc>,
    pub model: String,
}
