//! HTTP request handlers.

use crate::metrics::{Metrics, METRICS};
use crate::middleware::{AdminIdentity, RequestId};
use crate::response::{
    ApiResponse, BalanceChange, DepositRecorded, HealthResponse, Pagination, StatsResponse,
    TierMutation, UsersPage,
};
use crate::state::AppState;
use crate::store::{BalanceAdjustment, DepositCredit, PageRequest};
use crate::Error;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use bonus_engine::{
    BonusError, BonusQuote, BonusSettings, BonusTransaction, FieldError, NewTier, SettingsPatch,
    TierPatch, TierRef,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

type ApiResult<T> = Result<Json<ApiResponse<T>>, Error>;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| Error::BadRequest(e.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    query
        .map(|Query(v)| v)
        .map_err(|e| Error::BadRequest(e.body_text()))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| BonusError::Validation(vec![FieldError::new(field, "is required")]).into())
}

/// Liveness check with basic counters.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        auth_enabled: state.config.api_key().is_some(),
        persistent: state.store.is_persistent(),
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tiers, enabled) = match state.store.current_settings() {
        Ok(Some(s)) => (s.tiers.len(), s.enabled),
        Ok(None) => (0, BonusSettings::default().enabled),
        Err(e) => {
            warn!(error = %e, "Settings unavailable for metrics");
            (0, false)
        }
    };
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        METRICS.render(tiers, enabled),
    )
}

/// `GET /settings`
pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<BonusSettings> {
    let settings = state.store.get_or_create_default()?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// `PUT /settings` — partial update of the scalar fields.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> ApiResult<BonusSettings> {
    let patch = json_body(payload)?;
    let mut settings = state.store.get_or_create_default()?;

    if let Err(e) = patch.apply(&mut settings, &admin.0, Utc::now()) {
        warn!(req_id = %req_id.0, error = %e, "Settings update rejected");
        return Err(e.into());
    }
    state.store.save_settings(&settings)?;

    Metrics::incr(&METRICS.settings_updates);
    info!(
        req_id = %req_id.0,
        admin = %admin.0,
        enabled = settings.enabled,
        use_tiers = settings.use_tier_bonus,
        "Bonus settings updated"
    );
    Ok(Json(ApiResponse::ok_with_message(
        settings,
        "Bonus settings updated successfully",
    )))
}

fn tier_rejected(req_id: &RequestId, op: &'static str, e: BonusError) -> Error {
    Metrics::incr(&METRICS.tier_rejections);
    warn!(req_id = %req_id.0, op, error = %e, "Tier mutation rejected");
    e.into()
}

/// `POST /tiers`
pub async fn add_tier(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<NewTier>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TierMutation>>), Error> {
    let candidate = json_body(payload)?;
    let mut settings = state.store.get_or_create_default()?;

    let tier = bonus_engine::add_tier(&mut settings, &candidate, &admin.0, Utc::now())
        .cloned()
        .map_err(|e| tier_rejected(&req_id, "add", e))?;
    state.store.save_settings(&settings)?;

    Metrics::incr(&METRICS.tier_mutations);
    info!(
        req_id = %req_id.0,
        admin = %admin.0,
        tier_id = %tier.id,
        min = tier.min_deposit,
        max = tier.max_deposit,
        percent = tier.bonus_percent,
        "Bonus tier added"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            TierMutation { tier, settings },
            "Bonus tier added successfully",
        )),
    ))
}

/// `PUT /tiers/{tier}` — `tier` is a position or a tier id.
pub async fn update_tier(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    Path(tier): Path<String>,
    payload: Result<Json<TierPatch>, JsonRejection>,
) -> ApiResult<TierMutation> {
    let tier_ref: TierRef = tier.parse()?;
    let patch = json_body(payload)?;
    let mut settings = state.store.get_or_create_default()?;

    let tier = bonus_engine::update_tier(
        &mut settings,
        tier_ref,
        &patch,
        state.config.tier_policy(),
        &admin.0,
        Utc::now(),
    )
    .cloned()
    .map_err(|e| tier_rejected(&req_id, "update", e))?;
    state.store.save_settings(&settings)?;

    Metrics::incr(&METRICS.tier_mutations);
    info!(req_id = %req_id.0, admin = %admin.0, tier_id = %tier.id, "Bonus tier updated");
    Ok(Json(ApiResponse::ok_with_message(
        TierMutation { tier, settings },
        "Bonus tier updated successfully",
    )))
}

/// `DELETE /tiers/{tier}`
pub async fn remove_tier(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    Path(tier): Path<String>,
) -> ApiResult<TierMutation> {
    let tier_ref: TierRef = tier.parse()?;
    let mut settings = state.store.get_or_create_default()?;

    let tier = bonus_engine::remove_tier(&mut settings, tier_ref, &admin.0, Utc::now())
        .map_err(|e| tier_rejected(&req_id, "remove", e))?;
    state.store.save_settings(&settings)?;

    Metrics::incr(&METRICS.tier_mutations);
    info!(req_id = %req_id.0, admin = %admin.0, tier_id = %tier.id, "Bonus tier removed");
    Ok(Json(ApiResponse::ok_with_message(
        TierMutation { tier, settings },
        "Bonus tier deleted successfully",
    )))
}

/// `GET /stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<StatsResponse> {
    let totals = state.store.totals()?;
    let deposits_with_bonus = state.store.deposits_with_bonus()?;
    Ok(Json(ApiResponse::ok(StatsResponse {
        total_bonus_given: totals.total_bonus_given,
        users_with_bonus: totals.users_with_balance,
        deposits_with_bonus,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

/// `GET /users?limit&page`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> ApiResult<UsersPage> {
    let query = query_params(query)?;
    let max = state.config.max_page_limit.max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.default_page_limit)
        .clamp(1, max);
    let page = query.page.unwrap_or(1).max(1);

    let result = state.store.bonus_recipients(PageRequest { page, limit })?;
    Ok(Json(ApiResponse::ok(UsersPage {
        users: result.items,
        pagination: Pagination {
            page,
            limit,
            total: result.total,
            pages: result.total.div_ceil(limit),
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub amount: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// `PUT /users/{id}/adjust` — not idempotent; callers must dedupe retries.
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    payload: Result<Json<AdjustRequest>, JsonRejection>,
) -> ApiResult<BalanceChange> {
    let body = json_body(payload)?;
    let delta = required(body.amount, "amount")?;
    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(state.config.default_adjust_reason.as_str());

    let adjustment = BalanceAdjustment {
        user_id: &user_id,
        delta,
        actor: &admin.0,
        reason: Some(reason),
    };
    match state.store.adjust_balance(&adjustment) {
        Ok((user, transaction)) => {
            Metrics::incr(&METRICS.adjustments);
            info!(
                req_id = %req_id.0,
                admin = %admin.0,
                user_id = %user_id,
                delta,
                balance = user.bonus_balance,
                "Bonus balance adjusted"
            );
            Ok(Json(ApiResponse::ok_with_message(
                BalanceChange { user, transaction },
                "Bonus balance adjusted successfully",
            )))
        }
        Err(e) => {
            Metrics::incr(&METRICS.adjustment_rejections);
            warn!(req_id = %req_id.0, user_id = %user_id, delta, error = %e, "Adjustment rejected");
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

/// `GET /users/{id}/transactions` — newest first.
pub async fn user_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> ApiResult<Vec<BonusTransaction>> {
    let query = query_params(query)?;
    if state.store.user(&user_id)?.is_none() {
        return Err(BonusError::NotFound(format!("user {user_id}")).into());
    }
    let limit = query
        .limit
        .unwrap_or(state.config.default_page_limit)
        .clamp(1, state.config.max_page_limit.max(1));
    let transactions = state.store.transactions_for(&user_id, limit)?;
    Ok(Json(ApiResponse::ok(transactions)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub is_first_deposit: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
}

/// `POST /deposits` — record a completed deposit and credit its bonus.
pub async fn record_deposit(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<DepositRecorded>>), Error> {
    let body = json_body(payload)?;
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(BonusError::Validation(vec![FieldError::new("userId", "is required")]).into());
    }

    let settings = state.store.get_or_create_default()?;
    let receipt = state.store.credit_deposit(
        &DepositCredit {
            user_id,
            username: body.username.as_deref(),
            amount: body.amount,
            is_first_deposit: body.is_first_deposit,
            actor: &admin.0,
        },
        &settings,
    )?;

    Metrics::incr(&METRICS.deposits_credited);
    info!(
        req_id = %req_id.0,
        user_id = %user_id,
        amount = body.amount,
        bonus = receipt.quote.bonus_amount,
        source = ?receipt.quote.source,
        "Deposit recorded"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DepositRecorded {
            user: receipt.user,
            transaction: receipt.transaction,
            quote: receipt.quote,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateQuery {
    pub amount: Option<f64>,
    pub is_first_deposit: Option<bool>,
}

/// `GET /calculate?amount&isFirstDeposit` — preview only, nothing is stored.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CalculateQuery>, QueryRejection>,
) -> ApiResult<BonusQuote> {
    let query = query_params(query)?;
    let amount = required(query.amount, "amount")?;
    bonus_engine::check_deposit_amount(amount)?;

    let settings = state.store.get_or_create_default()?;
    let quote = bonus_engine::quote(&settings, amount, query.is_first_deposit.unwrap_or(false));
    Metrics::incr(&METRICS.previews);
    Ok(Json(ApiResponse::ok(quote)))
}
