//! Route definitions for the weather query API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/queries", query_routes())
        .route("/export", get(handlers::export_queries))
        .nest("/weather", weather_routes())
        .nest("/locations", location_routes())
        .route("/dates/validate", post(handlers::validate_dates))
}

/// Saved query routes
fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_queries).post(handlers::create_query))
        .route(
            "/:id",
            get(handlers::get_query)
                .put(handlers::update_query)
                .patch(handlers::update_query)
                .delete(handlers::delete_query),
        )
        .route(
            "/:id/insight",
            get(handlers::get_insight).post(handlers::regenerate_insight),
        )
        .route("/:id/context", get(handlers::get_context))
        .route("/:id/activities", post(handlers::suggest_activities))
}

/// Live weather routes
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::current_weather))
        .route("/forecast", get(handlers::forecast))
}

/// Location matching routes
fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(handlers::search_locations))
        .route("/gazetteer", post(handlers::add_gazetteer_entry))
}
