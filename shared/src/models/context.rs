//! Location context (computed per request, never persisted)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationContext {
    pub facts: Vec<String>,
    pub activities: Vec<String>,
    pub seasonal_info: String,
    pub local_time: String,
    pub timezone: String,
    pub weather_tips: Vec<String>,
}
