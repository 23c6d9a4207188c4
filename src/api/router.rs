//! Router setup and configuration.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health, mint, settings};
use crate::api::middleware::auth::require_admin;
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and metrics routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    // Setting administration (admin auth required)
    let admin_routes = Router::new()
        .route("/settings", put(settings::update_setting))
        .route("/settings/resume", post(settings::resume))
        .route("/usage", get(settings::list_usage))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let public_routes = Router::new()
        .route("/mint", get(mint::mint))
        .route("/settings", get(settings::get_setting))
        .route("/settings/capacity", get(settings::capacity));

    Router::new()
        .merge(health_routes)
        .nest("/v1", public_routes.merge(admin_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
