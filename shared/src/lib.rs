//! Shared types and models for the Weather Query service
//!
//! This crate contains the domain records exchanged between the backend,
//! its document store and its HTTP clients. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
