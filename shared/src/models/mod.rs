//! Domain models for the Weather Query service

mod context;
mod insight;
mod location;
mod query;
mod weather;

pub use context::*;
pub use insight::*;
pub use location::*;
pub use query::*;
pub use weather::*;
