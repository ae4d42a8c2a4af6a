//! Weather Query Service - server binary

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_query_backend::{
    config::{Config, StoreBackend},
    create_app,
    external::{ChatCompletionClient, LlmGateway, WeatherClient, WeatherProvider},
    store::{MemoryQueryStore, PgQueryStore, QueryStore},
    AppState,
};

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.clone().into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn QueryStore>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let store = PgQueryStore::connect(&config.database)
                .await
                .context("database connection failed")?;
            tracing::info!("Database connection established");

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                store.migrate().await?;
                tracing::info!("Migrations completed");
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on restart");
            Ok(Arc::new(MemoryQueryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    init_tracing(&config);

    tracing::info!("Starting Weather Query Server");
    tracing::info!("Environment: {}", config.environment);

    let store = build_store(&config).await?;
    let weather: Arc<dyn WeatherProvider> = Arc::new(WeatherClient::new(&config.weather)?);
    let llm: Option<Arc<dyn LlmGateway>> = match ChatCompletionClient::from_config(&config.ai)? {
        Some(client) => {
            tracing::info!(model = client.model(), "AI insights enabled");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("No AI credential configured; insights disabled");
            None
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    // Build application
    let app = create_app(AppState::new(config, store, weather, llm));

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
