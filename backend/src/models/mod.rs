//! Domain models for the Weather Query service
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
pub use shared::types::*;
