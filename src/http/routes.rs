use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::LedgerService;
use crate::domain::{Account, Cents};

use super::error::{ApiError, not_found};

/// Query parameters for `GET /balance`.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub account_id: Option<String>,
}

/// Body of `POST /event`, discriminated by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Deposit {
        destination: String,
        amount: Cents,
    },
    Withdraw {
        origin: String,
        amount: Cents,
    },
    Transfer {
        origin: String,
        destination: String,
        amount: Cents,
    },
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub destination: Account,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub origin: Account,
}

pub async fn reset(State(service): State<Arc<LedgerService>>) -> Result<&'static str, ApiError> {
    service.reset().await?;
    Ok("OK")
}

pub async fn balance(
    State(service): State<Arc<LedgerService>>,
    Query(query): Query<BalanceQuery>,
) -> Result<Response, ApiError> {
    let account_id = query
        .account_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("missing_account_id", "account_id query parameter is required")
        })?;

    Ok(match service.get_balance(&account_id).await {
        Some(balance) => (StatusCode::OK, Json(balance)).into_response(),
        None => not_found(),
    })
}

pub async fn event(
    State(service): State<Arc<LedgerService>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let event: Event = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request("invalid_event", e.to_string()))?;

    let response = match event {
        Event::Deposit {
            destination,
            amount,
        } => {
            let destination = service.deposit_or_open(&destination, amount).await?;
            (StatusCode::CREATED, Json(DepositResponse { destination })).into_response()
        }
        Event::Withdraw { origin, amount } => {
            let origin = service.withdraw(&origin, amount).await?;
            (StatusCode::CREATED, Json(WithdrawResponse { origin })).into_response()
        }
        Event::Transfer {
            origin,
            destination,
            amount,
        } => {
            let outcome = service.transfer(&origin, &destination, amount).await?;
            (StatusCode::CREATED, Json(outcome)).into_response()
        }
    };
    Ok(response)
}
