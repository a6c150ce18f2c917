//! Error types for the bonus admin service.

use crate::response::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bonus_engine::{BonusError, FieldError};
use std::fmt;
use tracing::error;

/// Service error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Persistence failure. Never shown to clients.
    Store(String),
    /// Malformed request (bad JSON, bad query string, bad path).
    BadRequest(String),
    /// Domain rule violation.
    Bonus(BonusError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Store(msg) => write!(f, "store error: {msg}"),
            Error::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Error::Bonus(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<BonusError> for Error {
    fn from(e: BonusError) -> Self {
        Error::Bonus(e)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Bonus(e) => match e {
                BonusError::Validation(_)
                | BonusError::InvalidRange { .. }
                | BonusError::NegativeBalance { .. } => StatusCode::BAD_REQUEST,
                BonusError::Overlap { .. } => StatusCode::CONFLICT,
                BonusError::NotFound(_) => StatusCode::NOT_FOUND,
            },
        }
    }

    fn client_message(&self) -> String {
        match self {
            Error::Config(_) | Error::Store(_) => "Internal server error".into(),
            Error::BadRequest(msg) => msg.clone(),
            Error::Bonus(BonusError::Validation(_)) => "Validation failed".into(),
            Error::Bonus(BonusError::NotFound(what)) => {
                let mut msg = format!("{what} not found");
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg
            }
            Error::Bonus(BonusError::InvalidRange { .. }) => {
                "Minimum deposit must be less than maximum deposit".into()
            }
            Error::Bonus(BonusError::Overlap { .. }) => {
                "Tier range overlaps with an existing tier".into()
            }
            Error::Bonus(BonusError::NegativeBalance { .. }) => {
                "Bonus balance cannot be negative".into()
            }
        }
    }

    fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            Error::Bonus(BonusError::Validation(errors)) => Some(errors.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        let body = ApiResponse::<()>::err(self.client_message(), self.field_errors());
        (status, Json(body)).into_response()
    }
}
