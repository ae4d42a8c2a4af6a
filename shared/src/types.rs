//! Common types used across the service

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl Coordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build from floating point values as returned by the weather provider,
    /// rounded to six decimal places
    pub fn from_f64(latitude: f64, longitude: f64) -> Self {
        let convert = |v: f64| {
            Decimal::from_f64_retain(v)
                .map(|d| d.round_dp(6).normalize())
                .unwrap_or_default()
        };
        Self {
            latitude: convert(latitude),
            longitude: convert(longitude),
        }
    }

    /// Render as the `lat,lon` form accepted by the weather provider lookups
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Inclusive calendar date range (no time component)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The fallback range used when a proposed range is rejected
    pub fn default_from(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: today + Duration::days(crate::validation::FORECAST_HORIZON_DAYS),
        }
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Pagination parameters (1-indexed)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Clamp page to >= 1 and page size to `1..=max_per_page`
    pub fn clamped(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        let max = max_per_page.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max),
        }
    }

    /// Number of records to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn meta(&self, total_items: u64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            per_page: self.per_page,
            total_items,
            total_pages: total_pages(total_items, self.per_page),
        }
    }
}

/// Ceiling division of items over page size; zero items means zero pages
pub fn total_pages(total_items: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    let per_page = u64::from(per_page);
    u32::try_from(total_items.div_ceil(per_page)).unwrap_or(u32::MAX)
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}
