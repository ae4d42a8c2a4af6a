//! External API integrations

pub mod llm;
pub mod weather;

pub use llm::{ChatCompletionClient, LlmGateway};
pub use weather::{WeatherClient, WeatherProvider};
