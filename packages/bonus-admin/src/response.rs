//! Response types for the admin API.

use bonus_engine::{
    BonusQuote, BonusSettings, BonusTier, BonusTransaction, FieldError, UserBonusState,
};
use serde::Serialize;

/// Envelope for every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn err(message: impl Into<String>, errors: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors,
        }
    }
}

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub requests: u64,
    pub auth_enabled: bool,
    pub persistent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_bonus_given: f64,
    pub users_with_bonus: u64,
    pub deposits_with_bonus: u64,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct UsersPage {
    pub users: Vec<UserBonusState>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMutation {
    pub tier: BonusTier,
    pub settings: BonusSettings,
}

#[derive(Debug, Serialize)]
pub struct BalanceChange {
    pub user: UserBonusState,
    pub transaction: BonusTransaction,
}

#[derive(Debug, Serialize)]
pub struct DepositRecorded {
    pub user: UserBonusState,
    pub transaction: BonusTransaction,
    pub quote: BonusQuote,
}
