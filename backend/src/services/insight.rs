//! AI insight generation
//!
//! One gateway call per generation. Replies are expected to carry a JSON
//! object but frequently do not, so parsing degrades to line heuristics
//! instead of failing.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{AiInsight, DateRange, ForecastSnapshot, WeatherQuery, WeatherSnapshot};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::LlmGateway;
use crate::store::QueryStore;

/// Forecast days included in the prompt
const PROMPT_FORECAST_DAYS: usize = 3;

const INSIGHT_SYSTEM_PROMPT: &str = "You are a practical travel weather assistant. \
Answer with a single JSON object and nothing else.";

const ACTIVITY_SYSTEM_PROMPT: &str = "You suggest activities that suit the weather. \
Answer with one short suggestion per line.";

/// Used when the gateway is unavailable or its reply is unusable
const FALLBACK_ACTIVITIES: [&str; 5] = [
    "Visit a local museum or gallery",
    "Explore the historic city centre on foot",
    "Try a well-reviewed local restaurant",
    "Browse a local market",
    "Check the events calendar for concerts or shows",
];

/// Insight fields produced by one generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightContent {
    pub insight: String,
    pub recommendations: Vec<String>,
    pub weather_summary: String,
    pub travel_advice: Option<String>,
    pub clothing_recommendations: Option<Vec<String>>,
    pub activity_suggestions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct InsightReply {
    #[serde(default, alias = "insight", alias = "overview")]
    summary: Option<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default, alias = "travelAdvice", alias = "travel")]
    travel_advice: Option<String>,
    #[serde(
        default,
        alias = "clothingTips",
        alias = "clothing",
        alias = "clothing_recommendations"
    )]
    clothing_tips: Option<Vec<String>>,
    #[serde(default, alias = "activitySuggestions", alias = "activities")]
    activity_suggestions: Option<Vec<String>>,
}

/// Insight service
#[derive(Clone)]
pub struct InsightService {
    gateway: Option<Arc<dyn LlmGateway>>,
    store: Arc<dyn QueryStore>,
}

impl InsightService {
    pub fn new(gateway: Option<Arc<dyn LlmGateway>>, store: Arc<dyn QueryStore>) -> Self {
        Self { gateway, store }
    }

    /// True only when a gateway credential is configured
    pub fn is_available(&self) -> bool {
        self.gateway.is_some()
    }

    fn gateway(&self) -> AppResult<&Arc<dyn LlmGateway>> {
        self.gateway
            .as_ref()
            .ok_or_else(|| AppError::AiUnavailable("No AI credential configured".to_string()))
    }

    /// Generate insight fields for a location's conditions
    pub async fn generate(
        &self,
        location: &str,
        weather: &WeatherSnapshot,
        forecast: Option<&ForecastSnapshot>,
    ) -> AppResult<InsightContent> {
        let gateway = self.gateway()?;
        let prompt = build_insight_prompt(location, weather, forecast);
        let reply = gateway.complete(INSIGHT_SYSTEM_PROMPT, &prompt).await?;
        Ok(parse_insight_reply(&reply, weather))
    }

    /// Regenerate the stored insight for `query`, replacing any previous one
    pub async fn regenerate(&self, query: &WeatherQuery) -> AppResult<AiInsight> {
        let gateway = self.gateway()?;
        let content = self
            .generate(&query.location, &query.weather_data, query.forecast_data.as_ref())
            .await?;

        let insight = AiInsight {
            id: Uuid::new_v4(),
            query_id: query.id,
            location: query.location.clone(),
            insight: content.insight,
            recommendations: content.recommendations,
            weather_summary: content.weather_summary,
            travel_advice: content.travel_advice,
            clothing_recommendations: content.clothing_recommendations,
            activity_suggestions: content.activity_suggestions,
            generated_at: Utc::now(),
            model: gateway.model().to_string(),
        };

        self.store.delete_insights_for_query(query.id).await?;
        self.store.insert_insight(&insight).await?;
        tracing::info!(query_id = %query.id, model = %insight.model, "AI insight stored");

        Ok(insight)
    }

    /// `regenerate` with every failure logged and absorbed
    pub async fn refresh_for_query(&self, query: &WeatherQuery) -> Option<AiInsight> {
        if !self.is_available() {
            tracing::debug!(query_id = %query.id, "AI gateway not configured; skipping insight");
            return None;
        }

        match self.regenerate(query).await {
            Ok(insight) => Some(insight),
            Err(e) => {
                tracing::warn!(query_id = %query.id, error = %e, "AI insight generation failed");
                None
            }
        }
    }

    /// Latest stored insight for a query
    pub async fn get_for_query(&self, query_id: Uuid) -> AppResult<Option<AiInsight>> {
        self.store.find_insight_for_query(query_id).await
    }

    /// Stored insights for a set of queries, newest first
    pub async fn insights_for_queries(&self, query_ids: &[Uuid]) -> AppResult<Vec<AiInsight>> {
        self.store.find_insights_for_queries(query_ids).await
    }

    /// Activity ideas for a location and date range; never fails
    pub async fn activity_suggestions(
        &self,
        location: &str,
        weather: &WeatherSnapshot,
        date_range: &DateRange,
    ) -> Vec<String> {
        let gateway = match self.gateway() {
            Ok(gateway) => gateway,
            Err(_) => return fallback_activities(),
        };

        let prompt = format!(
            "Suggest up to 5 activities in {} between {} and {}.\nCurrent conditions: {}.",
            location,
            date_range.start,
            date_range.end,
            weather.summary()
        );

        match gateway.complete(ACTIVITY_SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => {
                let suggestions = parse_suggestion_list(&reply);
                if suggestions.is_empty() {
                    fallback_activities()
                } else {
                    suggestions
                }
            }
            Err(e) => {
                tracing::warn!(location, error = %e, "Activity suggestions failed; using defaults");
                fallback_activities()
            }
        }
    }
}

fn fallback_activities() -> Vec<String> {
    FALLBACK_ACTIVITIES.iter().map(|s| s.to_string()).collect()
}

/// Prompt embedding current conditions and the first forecast days
pub fn build_insight_prompt(
    location: &str,
    weather: &WeatherSnapshot,
    forecast: Option<&ForecastSnapshot>,
) -> String {
    let mut prompt = format!(
        "Location: {} ({})\nCurrent conditions: {}\nPressure: {} hPa, visibility {} m, cloud cover {}%\n",
        location,
        weather.display_location(),
        weather.summary(),
        weather.pressure,
        weather.visibility,
        weather.cloud_cover
    );

    if let Some(forecast) = forecast {
        prompt.push_str("Forecast:\n");
        for day in forecast.days.iter().take(PROMPT_FORECAST_DAYS) {
            prompt.push_str(&format!(
                "- {}: {:.0} to {:.0}°C, {}, {:.0}% chance of rain\n",
                day.label,
                day.temp_min,
                day.temp_max,
                day.description,
                day.precipitation_probability * 100.0
            ));
        }
    }

    prompt.push_str(
        "\nReply with JSON: {\"summary\": string, \"recommendations\": [string], \
         \"travel_advice\": string, \"clothing_tips\": [string]}",
    );
    prompt
}

/// Slice between the first `{` and the last `}`
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Strip list markers and markdown emphasis from a reply line
fn clean_line(line: &str) -> &str {
    let line = line.trim().trim_start_matches('#').trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    let line = if digits > 0 && line[digits..].starts_with(['.', ')']) {
        &line[digits + 1..]
    } else {
        line
    };
    line.trim().trim_matches('*').trim()
}

fn non_empty(list: Option<Vec<String>>) -> Option<Vec<String>> {
    list.map(|items| {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    })
    .filter(|items| !items.is_empty())
}

/// Parse a gateway reply; always yields a result
pub fn parse_insight_reply(reply: &str, weather: &WeatherSnapshot) -> InsightContent {
    let weather_summary = weather.summary();

    if let Some(parsed) = extract_json(reply)
        .and_then(|json| serde_json::from_str::<InsightReply>(json).ok())
    {
        let insight = parsed
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| weather_summary.clone());

        return InsightContent {
            insight,
            recommendations: non_empty(Some(parsed.recommendations)).unwrap_or_default(),
            weather_summary,
            travel_advice: parsed
                .travel_advice
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            clothing_recommendations: non_empty(parsed.clothing_tips),
            activity_suggestions: non_empty(parsed.activity_suggestions),
        };
    }

    let mut summary: Option<String> = None;
    let mut recommendations = Vec::new();
    let mut travel_advice: Option<String> = None;

    for line in reply.lines().map(clean_line).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if ["recommend", "suggest", "should"]
            .iter()
            .any(|k| lower.contains(k))
        {
            recommendations.push(line.to_string());
        } else if travel_advice.is_none()
            && ["travel", "drive", "transport"]
                .iter()
                .any(|k| lower.contains(k))
        {
            travel_advice = Some(line.to_string());
        } else if summary.is_none() {
            summary = Some(line.to_string());
        }
    }

    InsightContent {
        insight: summary.unwrap_or_else(|| weather_summary.clone()),
        recommendations,
        weather_summary,
        travel_advice,
        clothing_recommendations: None,
        activity_suggestions: None,
    }
}

/// One suggestion per line, or a JSON string array
fn parse_suggestion_list(reply: &str) -> Vec<String> {
    if let Some(start) = reply.find('[') {
        if let Some(end) = reply.rfind(']') {
            if end > start {
                if let Ok(items) = serde_json::from_str::<Vec<String>>(&reply[start..=end]) {
                    return non_empty(Some(items)).unwrap_or_default();
                }
            }
        }
    }

    reply
        .lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("here: {\"a\":1} done"), Some("{\"a\":1}"));
        assert_eq!(extract_json("no json"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  - Pack an umbrella"), "Pack an umbrella");
        assert_eq!(clean_line("2. **Wear layers**"), "Wear layers");
        assert_eq!(clean_line("## Overview"), "Overview");
        assert_eq!(clean_line("2024 was warm"), "2024 was warm");
    }

    #[test]
    fn test_suggestion_list_formats() {
        assert_eq!(
            parse_suggestion_list("[\"Hike\", \"Swim\"]"),
            vec!["Hike", "Swim"]
        );
        assert_eq!(
            parse_suggestion_list("1. Hike\n2. Swim\n"),
            vec!["Hike", "Swim"]
        );
    }
}
