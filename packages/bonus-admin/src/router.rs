//! HTTP router setup.

use crate::handlers;
use crate::middleware::{admin_auth, inject_request_id, track_requests};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/tiers", post(handlers::add_tier))
        .route(
            "/tiers/{tier}",
            put(handlers::update_tier).delete(handlers::remove_tier),
        )
        .route("/stats", get(handlers::stats))
        .route("/users", get(handlers::list_users))
        .route("/users/{id}/adjust", put(handlers::adjust_balance))
        .route("/users/{id}/transactions", get(handlers::user_transactions))
        .route("/deposits", post(handlers::record_deposit))
        .route("/calculate", get(handlers::calculate))
        .route_layer(from_fn_with_state(state.clone(), admin_auth));

    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(admin)
        .layer(from_fn_with_state(state.clone(), track_requests))
        .layer(from_fn(inject_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .with_state(state)
}
