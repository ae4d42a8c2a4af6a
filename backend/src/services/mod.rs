//! Business logic services for the weather query service

pub mod context;
pub mod export;
pub mod insight;
pub mod location;
pub mod query;

pub use export::{ExportFormat, ExportPayload, ExportService};
pub use insight::InsightService;
pub use location::LocationMatcher;
pub use query::QueryService;
