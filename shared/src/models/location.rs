//! Location matching models

use serde::{Deserialize, Serialize};

use crate::types::Coordinates;

/// A ranked candidate for a free-form location string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationMatch {
    pub name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    pub coordinates: Coordinates,
    /// Confidence in `[0, 1]`; 1.0 means the weather provider resolved it
    pub confidence: f64,
}

/// Entry of the built-in gazetteer used for fuzzy fallback matching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GazetteerEntry {
    pub name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    pub coordinates: Coordinates,
}
