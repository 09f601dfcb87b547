//! HTTP surface of the ledger.
//!
//! A thin dispatch layer: handlers pull typed parameters out of the request,
//! call [`LedgerService`] and map its outcome to a status code.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::application::LedgerService;

pub use error::{ApiError, ErrorBody};

/// Creates the application router.
pub fn create_router(service: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/reset", post(routes::reset))
        .route("/balance", get(routes::balance))
        .route("/event", post(routes::event))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
