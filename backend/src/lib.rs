//! Weather Query Service
//!
//! Looks up current conditions and forecasts, keeps user-created weather
//! queries with AI-generated insights, and exports them in several formats.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::{LlmGateway, WeatherProvider};
use services::{ExportService, InsightService, LocationMatcher, QueryService};
use store::QueryStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn QueryStore>,
    pub weather: Arc<dyn WeatherProvider>,
    pub locations: LocationMatcher,
    pub queries: QueryService,
    pub insights: InsightService,
    pub exporter: ExportService,
}

impl AppState {
    /// Wire the services once over the injected collaborators
    pub fn new(
        config: Config,
        store: Arc<dyn QueryStore>,
        weather: Arc<dyn WeatherProvider>,
        llm: Option<Arc<dyn LlmGateway>>,
    ) -> Self {
        let locations = LocationMatcher::new(weather.clone());
        let queries = QueryService::new(
            store.clone(),
            weather.clone(),
            locations.clone(),
            config.listing,
        );
        let insights = InsightService::new(llm, store.clone());
        let exporter = ExportService::new(config.export);

        Self {
            config: Arc::new(config),
            store,
            weather,
            locations,
            queries,
            insights,
            exporter,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Weather Query Service API"
}
