//! Validation utilities for the Weather Query service
//!
//! Date range policy for the forecast provider, plus the string helpers used
//! to classify and normalize free-form location input.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DateRange;

/// Provider forecast horizon in days
pub const FORECAST_HORIZON_DAYS: i64 = 5;

/// How far back a range may start
pub const HISTORY_LIMIT_DAYS: i64 = 365;

// ============================================================================
// Date Range Validation
// ============================================================================

/// Outcome of validating a proposed date range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRangeValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// The input range when valid, otherwise today → today + 5 days
    pub adjusted_range: DateRange,
}

/// Parse a calendar date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, in
/// which case the UTC date part is used.
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Validate a date range against today's UTC date
pub fn validate_date_range(start: &str, end: &str) -> DateRangeValidation {
    validate_date_range_at(start, end, Utc::now().date_naive())
}

/// Validate a date range against an explicit `today`.
///
/// All violations are collected. Unparseable dates skip the ordering and
/// horizon checks.
pub fn validate_date_range_at(start: &str, end: &str, today: NaiveDate) -> DateRangeValidation {
    let mut errors = Vec::new();

    let start_date = parse_calendar_date(start);
    let end_date = parse_calendar_date(end);

    if start_date.is_none() {
        errors.push(format!("Invalid start date: '{}'", start.trim()));
    }
    if end_date.is_none() {
        errors.push(format!("Invalid end date: '{}'", end.trim()));
    }

    let (start_date, end_date) = match (start_date, end_date) {
        (Some(s), Some(e)) => (s, e),
        _ => return rejected(errors, today),
    };

    errors.extend(range_violations(start_date, end_date, today));

    if errors.is_empty() {
        DateRangeValidation {
            valid: true,
            errors,
            adjusted_range: DateRange::new(start_date, end_date),
        }
    } else {
        rejected(errors, today)
    }
}

/// Validate an already-parsed range against an explicit `today`
pub fn validate_range_at(range: DateRange, today: NaiveDate) -> DateRangeValidation {
    let errors = range_violations(range.start, range.end, today);
    if errors.is_empty() {
        DateRangeValidation {
            valid: true,
            errors,
            adjusted_range: range,
        }
    } else {
        rejected(errors, today)
    }
}

fn range_violations(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<String> {
    let mut errors = Vec::new();
    let horizon = today + Duration::days(FORECAST_HORIZON_DAYS);
    let history_limit = today - Duration::days(HISTORY_LIMIT_DAYS);

    if start > end {
        errors.push("Start date must be on or before the end date".to_string());
    }
    if start < history_limit {
        errors.push(format!(
            "Start date cannot be more than {} days in the past; historical data is not available",
            HISTORY_LIMIT_DAYS
        ));
    }
    if start > horizon {
        errors.push(format!(
            "Start date cannot be more than {} days in the future (forecast limit)",
            FORECAST_HORIZON_DAYS
        ));
    }
    if end > horizon {
        errors.push(format!(
            "End date is beyond the {}-day forecast horizon; rely on seasonal patterns for later dates",
            FORECAST_HORIZON_DAYS
        ));
    }
    errors
}

fn rejected(errors: Vec<String>, today: NaiveDate) -> DateRangeValidation {
    DateRangeValidation {
        valid: false,
        errors,
        adjusted_range: DateRange::default_from(today),
    }
}

// ============================================================================
// Location Validation
// ============================================================================

/// Lowercase, trim and collapse internal whitespace
pub fn normalize_location(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Drop a trailing ", country" / ", state" qualifier, then normalize
pub fn location_key(input: &str) -> String {
    let head = input.split(',').next().unwrap_or(input);
    normalize_location(head)
}

/// True for "lat,lon" pairs: optional sign, digits, optional decimal part,
/// on both sides of a single comma.
pub fn is_coordinate_pair(input: &str) -> bool {
    parse_coordinate_pair(input).is_some()
}

/// Split a "lat,lon" pair into its two numeric tokens
pub fn parse_coordinate_pair(input: &str) -> Option<(&str, &str)> {
    let (lat, lon) = input.trim().split_once(',')?;
    let (lat, lon) = (lat.trim(), lon.trim());
    if is_signed_decimal(lat) && is_signed_decimal(lon) {
        Some((lat, lon))
    } else {
        None
    }
}

fn is_signed_decimal(token: &str) -> bool {
    let unsigned = token.strip_prefix(['-', '+']).unwrap_or(token);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

/// Postal codes: 3-10 digits, optionally followed by ",<country code>"
pub fn is_postal_code(input: &str) -> bool {
    let input = input.trim();
    let (code, country) = match input.split_once(',') {
        Some((c, k)) => (c.trim(), Some(k.trim())),
        None => (input, None),
    };
    let code_ok = (3..=10).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit());
    let country_ok = country.map_or(true, |k| {
        (2..=3).contains(&k.len()) && k.chars().all(|c| c.is_ascii_alphabetic())
    });
    code_ok && country_ok
}
