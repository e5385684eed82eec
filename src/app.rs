//! HTTP router construction.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, middleware, state::AppState};

/// Build the full router around `state`.
///
/// `/health` is public; everything under `/api/v1` passes through the
/// credential middleware first.
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        // Credential management (elevated credentials only)
        .route(
            "/api/v1/credentials",
            post(handlers::credentials::issue_credential),
        )
        .route(
            "/api/v1/credentials",
            get(handlers::credentials::list_credentials),
        )
        .route(
            "/api/v1/credentials/{id}/deactivate",
            post(handlers::credentials::deactivate_credential),
        )
        .route(
            "/api/v1/credentials/{id}",
            delete(handlers::credentials::purge_credential),
        )
        // Query gateway
        .route("/api/v1/query", post(handlers::query::execute_query))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
