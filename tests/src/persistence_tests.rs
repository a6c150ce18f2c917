//! Snapshot persistence across service restarts.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use bonus_admin::store::MemoryStore;
use serde_json::json;
use std::sync::Arc;

use crate::utils::TestApp;

#[tokio::test]
async fn test_state_survives_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bonus.json");

    let tier_id = {
        let app = TestApp::with_store(Arc::new(MemoryStore::open(path.clone())?));
        app.call(
            Method::PUT,
            "/settings",
            "alice",
            Some(json!({"regularBonusPercent": 10, "useTierBonus": true})),
        )
        .await?;
        let (_, body) = app
            .call(
                Method::POST,
                "/tiers",
                "alice",
                Some(json!({"minDeposit": 0, "maxDeposit": 1000, "bonusPercent": 5})),
            )
            .await?;
        app.call(
            Method::POST,
            "/deposits",
            "system",
            Some(json!({"userId": "frank", "amount": 400})),
        )
        .await?;
        app.state.store.flush()?;
        body["data"]["tier"]["id"].as_str().map(str::to_string)
    };

    let app = TestApp::with_store(Arc::new(MemoryStore::open(path)?));

    let (_, body) = app.get("/settings").await?;
    assert_eq!(body["data"]["regularBonusPercent"], 10.0);
    assert_eq!(body["data"]["tiers"][0]["id"].as_str().map(str::to_string), tier_id);

    let (_, body) = app.get("/stats").await?;
    assert_eq!(body["data"]["totalBonusGiven"], 20.0);
    assert_eq!(body["data"]["depositsWithBonus"], 1);

    let (status, body) = app
        .call(
            Method::PUT,
            "/users/frank/adjust",
            "alice",
            Some(json!({"amount": -20})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["bonusBalance"], 0.0);
    Ok(())
}
