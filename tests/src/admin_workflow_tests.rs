//! End-to-end admin workflows through the full router: auth, settings,
//! tiers, deposits, adjustments and reporting.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::utils::TestApp;

// ── Configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn test_tiered_campaign_setup_and_preview() -> Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            Method::PUT,
            "/settings",
            "alice",
            Some(json!({
                "enabled": true,
                "regularBonusPercent": 3,
                "useTierBonus": true,
                "maxBonusAmount": 250
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lastUpdatedBy"], "alice");

    for (min, max, pct) in [(0, 1000, 5), (1000, 5000, 10), (5000, 100000, 20)] {
        let (status, _) = app
            .call(
                Method::POST,
                "/tiers",
                "alice",
                Some(json!({"minDeposit": min, "maxDeposit": max, "bonusPercent": pct})),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get("/calculate?amount=2000").await?;
    assert_eq!(body["data"]["bonusAmount"], 200.0);
    assert_eq!(body["data"]["totalCredit"], 2200.0);

    // 20% of 10000 is capped at 250.
    let (_, body) = app.get("/calculate?amount=10000").await?;
    assert_eq!(body["data"]["bonusAmount"], 250.0);
    assert_eq!(body["data"]["capped"], true);

    // Deactivating the middle tier leaves 2000 without a tier: no bonus,
    // and the regular rate is not used as a fallback.
    let (status, _) = app
        .call(
            Method::PUT,
            "/tiers/1",
            "bob",
            Some(json!({"active": false})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/calculate?amount=2000").await?;
    assert_eq!(body["data"]["bonusAmount"], 0.0);

    // Turning the feature off zeroes everything.
    app.call(Method::PUT, "/settings", "bob", Some(json!({"enabled": false})))
        .await?;
    let (_, body) = app.get("/calculate?amount=500").await?;
    assert_eq!(body["data"]["bonusAmount"], 0.0);
    assert_eq!(body["data"]["source"], "disabled");

    let (_, body) = app.get("/settings").await?;
    assert_eq!(body["data"]["lastUpdatedBy"], "bob");
    assert_eq!(body["data"]["tiers"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_overlapping_tier_rejected_and_settings_unchanged() -> Result<()> {
    let app = TestApp::new();
    app.call(
        Method::POST,
        "/tiers",
        "alice",
        Some(json!({"minDeposit": 0, "maxDeposit": 50, "bonusPercent": 5})),
    )
    .await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/tiers",
            "mallory",
            Some(json!({"minDeposit": 40, "maxDeposit": 60, "bonusPercent": 50})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (_, body) = app.get("/settings").await?;
    assert_eq!(body["data"]["tiers"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["lastUpdatedBy"], "alice");
    Ok(())
}

#[tokio::test]
async fn test_rejects_without_api_key() -> Result<()> {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/stats")
        .body(axum::body::Body::empty())?;
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

// ── Balances ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deposits_adjustments_and_reporting() -> Result<()> {
    let app = TestApp::new();
    app.call(
        Method::PUT,
        "/settings",
        "alice",
        Some(json!({
            "regularBonusPercent": 10,
            "minDepositForBonus": 100,
            "firstDepositBonusEnabled": true,
            "firstDepositBonusPercent": 50
        })),
    )
    .await?;

    // First deposit for carol gets the first-deposit rate.
    let (status, body) = app
        .call(
            Method::POST,
            "/deposits",
            "system",
            Some(json!({"userId": "carol", "amount": 200, "username": "carol"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["quote"]["bonusAmount"], 100.0);
    assert_eq!(body["data"]["quote"]["source"], "firstDeposit");

    // Second deposit falls back to the regular rate.
    let (_, body) = app
        .call(
            Method::POST,
            "/deposits",
            "system",
            Some(json!({"userId": "carol", "amount": 500})),
        )
        .await?;
    assert_eq!(body["data"]["quote"]["bonusAmount"], 50.0);
    assert_eq!(body["data"]["user"]["bonusBalance"], 150.0);

    // Below the minimum: recorded, but no bonus.
    let (_, body) = app
        .call(
            Method::POST,
            "/deposits",
            "system",
            Some(json!({"userId": "dave", "amount": 50, "isFirstDeposit": false})),
        )
        .await?;
    assert_eq!(body["data"]["quote"]["bonusAmount"], 0.0);

    let (status, body) = app
        .call(
            Method::PUT,
            "/users/carol/adjust",
            "alice",
            Some(json!({"amount": -500, "reason": "clawback"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .call(
            Method::PUT,
            "/users/carol/adjust",
            "alice",
            Some(json!({"amount": -150, "reason": "clawback"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["bonusBalance"], 0.0);
    assert_eq!(body["data"]["transaction"]["reason"], "clawback");
    assert_eq!(body["data"]["transaction"]["actor"], "alice");
    assert_eq!(body["data"]["transaction"]["bonusBalanceAfter"], 0.0);

    let (status, _) = app
        .call(
            Method::PUT,
            "/users/dave/adjust",
            "alice",
            Some(json!({"amount": 25})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/stats").await?;
    assert_eq!(body["data"]["totalBonusGiven"], 175.0);
    assert_eq!(body["data"]["usersWithBonus"], 1);
    assert_eq!(body["data"]["depositsWithBonus"], 2);

    let (_, body) = app.get("/users").await?;
    let users = body["data"]["users"].as_array().cloned().unwrap_or_default();
    let ids: Vec<&str> = users.iter().filter_map(|u| u["userId"].as_str()).collect();
    assert_eq!(ids, vec!["dave", "carol"]);

    let (_, body) = app.get("/users/carol/transactions?limit=2").await?;
    let log = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0]["kind"], "bonusAdjustment");
    assert_eq!(log[1]["amount"], 500.0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_adjustments_serialize_per_user() -> Result<()> {
    let app = std::sync::Arc::new(TestApp::new());
    app.call(
        Method::POST,
        "/deposits",
        "system",
        Some(json!({"userId": "erin", "amount": 0})),
    )
    .await?;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            app.call(
                Method::PUT,
                "/users/erin/adjust",
                "ops",
                Some(json!({"amount": 2.5, "reason": format!("batch {i}")})),
            )
            .await
        }));
    }
    for task in tasks {
        let (status, _) = task.await??;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app.get("/users/erin/transactions?limit=100").await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(21));

    let user = app.state.store.user("erin")?;
    assert_eq!(user.map(|u| u.bonus_balance), Some(50.0));
    Ok(())
}
