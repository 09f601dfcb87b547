use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

use crate::application::AppError;

/// Errors a handler can return. Ledger outcomes are mapped to status codes here.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    BadRequest { code: &'static str, message: String },
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: code,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Unknown accounts are reported with a bare `0` body.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(0)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest { code, message } => {
                debug!(code, %message, "Rejected request");
                return json_error(StatusCode::BAD_REQUEST, code, message);
            }
            ApiError::App(err) => err,
        };

        match &err {
            AppError::AccountNotFound(account) => {
                debug!(%account, "Account not found");
                not_found()
            }
            AppError::InvalidAmount(_) => {
                json_error(StatusCode::BAD_REQUEST, "invalid_amount", err.to_string())
            }
            AppError::InvalidAccountId(_) => {
                json_error(StatusCode::BAD_REQUEST, "invalid_account_id", err.to_string())
            }
            AppError::InsufficientFunds { .. } => {
                json_error(StatusCode::BAD_REQUEST, "insufficient_funds", err.to_string())
            }
            AppError::Storage(storage) => {
                error!(error = %storage, "Ledger storage failure");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "ledger storage is unavailable",
                )
            }
        }
    }
}
