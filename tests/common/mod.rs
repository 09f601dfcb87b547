// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tally::application::LedgerService;
use tally::domain::{AccountId, ResetPolicy};
use tally::http::create_router;
use tempfile::TempDir;
use tower::ServiceExt;

/// Path of the ledger file inside a test directory
pub fn data_file(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("var/data/accounts.json")
}

/// Helper to create a test service backed by a temporary file
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::open(data_file(&temp_dir), ResetPolicy::Empty).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service whose reset recreates the given accounts
pub async fn seeded_service(ids: &[&str]) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let ids = ids
        .iter()
        .map(|id| AccountId::new(*id))
        .collect::<Result<Vec<_>, _>>()?;
    let service = LedgerService::open(data_file(&temp_dir), ResetPolicy::Seeded(ids)).await?;
    Ok((service, temp_dir))
}

/// Helper to build the HTTP router over a fresh ledger
pub async fn test_app() -> Result<(Router, Arc<LedgerService>, TempDir)> {
    let (service, temp_dir) = test_service().await?;
    let service = Arc::new(service);
    Ok((create_router(service.clone()), service, temp_dir))
}

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Send a request with an optional raw body through the router
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> Result<TestResponse> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes().to_vec();
    Ok(TestResponse { status, body })
}

/// POST a JSON event to `/event`
pub async fn post_event(app: &Router, event: Value) -> Result<TestResponse> {
    send(app, Method::POST, "/event", Some(&event.to_string())).await
}

/// GET `/balance` for an account
pub async fn get_balance(app: &Router, account_id: &str) -> Result<TestResponse> {
    send(
        app,
        Method::GET,
        &format!("/balance?account_id={}", account_id),
        None,
    )
    .await
}
