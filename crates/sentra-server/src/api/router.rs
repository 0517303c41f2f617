//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use sentra_runtime::LifecycleService;
use sentra_store::Store;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the REST API router
pub fn create_router(service: Arc<LifecycleService<dyn Store>>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/v1/transactions", post(ingest).get(list_transactions))
        .route("/v1/transactions/:id", get(get_transaction))
        .route("/v1/transactions/:id/flag", post(flag_transaction))
        .route("/v1/transactions/:id/review", post(review_transaction))
        .route("/v1/users/:user_id/risk-profile", get(user_risk_profile))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
