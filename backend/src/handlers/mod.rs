//! HTTP request handlers

pub mod dates;
pub mod export;
pub mod health;
pub mod insight;
pub mod location;
pub mod query;
pub mod weather;

pub use dates::validate_dates;
pub use export::export_queries;
pub use health::health_check;
pub use insight::{get_context, get_insight, regenerate_insight, suggest_activities};
pub use location::{add_gazetteer_entry, search_locations};
pub use query::{create_query, delete_query, get_query, list_queries, update_query};
pub use weather::{current_weather, forecast};
