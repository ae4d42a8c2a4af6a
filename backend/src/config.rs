//! Configuration management for the Weather Query service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WQ_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub database: DatabaseConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// LLM gateway configuration
    pub ai: AiConfig,

    /// Interactive listing limits
    pub listing: ListingConfig,

    /// Export limits
    pub export: ExportConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

/// Which document store implementation backs the service
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,

    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    pub acquire_timeout_seconds: u64,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// OpenAI-compatible base URL
    pub api_endpoint: String,

    /// Gateway credential; insights are disabled without one
    #[serde(default)]
    pub api_key: Option<String>,

    pub model: String,

    pub timeout_seconds: u64,

    pub max_tokens: u32,

    pub temperature: f32,
}

impl AiConfig {
    /// A credential is configured and non-blank
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ListingConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ExportConfig {
    /// Upper bound on records pulled into one export
    pub max_records: u32,

    /// Queries summarized in a PDF export
    pub pdf_max_queries: usize,

    /// Insights summarized in a PDF export
    pub pdf_max_insights: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// "pretty" or "json"
    pub format: String,

    /// Default filter directive when RUST_LOG is unset
    pub filter: String,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WQ_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::builder_with_defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WQ_ prefix)
            .add_source(
                Environment::with_prefix("WQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration built from defaults only
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults("development")?
            .build()?
            .try_deserialize()
    }

    fn builder_with_defaults(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_seconds", 30)?
            .set_default("database.run_migrations", environment == "development")?
            .set_default("weather.api_endpoint", "https://api.openweathermap.org/data/2.5")?
            .set_default("weather.api_key", "")?
            .set_default("weather.timeout_seconds", 10)?
            .set_default("ai.api_endpoint", "https://api.openai.com/v1")?
            .set_default("ai.model", "gpt-4o-mini")?
            .set_default("ai.timeout_seconds", 30)?
            .set_default("ai.max_tokens", 800)?
            .set_default("ai.temperature", 0.7)?
            .set_default("listing.default_page_size", 10)?
            .set_default("listing.max_page_size", 50)?
            .set_default("export.max_records", 1000)?
            .set_default("export.pdf_max_queries", 10)?
            .set_default("export.pdf_max_insights", 5)?
            .set_default("logging.format", "pretty")?
            .set_default(
                "logging.filter",
                "wq_server=debug,weather_query_backend=debug,tower_http=debug,sqlx=warn",
            )
    }
}
