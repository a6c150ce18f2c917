use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bonus_admin::store::{MemoryStore, Store};
use bonus_admin::{create_router, AppState, Config};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const API_KEY: &str = "integration-key";

/// In-process service with auth enabled.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let config = Config {
            api_key: Some(API_KEY.into()),
            ..Config::default()
        };
        let state = Arc::new(AppState::with_store(config, store));
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        admin: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", API_KEY)
            .header("x-admin-id", admin);
        let request = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, uri, "auditor", None).await
    }
}
