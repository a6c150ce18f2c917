//! Authentication and request correlation middleware.

use crate::metrics::{Metrics, METRICS};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Identity recorded as editor/actor on audit fields.
#[derive(Clone, Debug)]
pub struct AdminIdentity(pub String);

const DEFAULT_ADMIN: &str = "admin";

/// Validate `X-Api-Key` or `Authorization: Bearer` header, then attach the
/// caller's [`AdminIdentity`] taken from `X-Admin-Id`.
/// Bypassed if no API key is configured (dev mode).
/// Uses constant-time comparison to prevent timing attacks.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.config.api_key() {
        let provided = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                request
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "))
            });

        let authorized = matches!(
            provided,
            Some(key) if key.len() == expected.len()
                && bool::from(key.as_bytes().ct_eq(expected.as_bytes()))
        );
        if !authorized {
            warn!(path = %request.uri().path(), "Rejected unauthenticated admin request");
            let body = ApiResponse::<()>::err("Unauthorized: invalid or missing API key", None);
            return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
        }
    }

    let admin = request
        .headers()
        .get("x-admin-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ADMIN)
        .to_string();
    request.extensions_mut().insert(AdminIdentity(admin));

    next.run(request).await
}

/// Propagate or generate `x-request-id` for end-to-end correlation.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            format!("bon-{:016x}", rng.gen::<u64>())
        });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", val);
    }

    response
}

/// Count requests and error responses.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    Metrics::incr(&METRICS.requests_total);

    let response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        Metrics::incr(&METRICS.request_errors);
    }
    response
}

/// Request correlation ID, extractable from `Request::extensions()`.
#[derive(Clone, Debug, Default)]
pub struct RequestId(pub String);
