//! API endpoint handlers

use super::types::*;
use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use sentra_core::types::{Transaction, TransactionFilter, TransactionRequest, UserRiskSummary};
use sentra_runtime::CancelToken;
use tracing::info;
use uuid::Uuid;

/// Default and maximum page sizes for listings
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Ingest a transaction
pub(super) async fn ingest(
    State(state): State<AppState>,
    Json(payload): Json<TransactionRequest>,
) -> Result<Json<IngestResponsePayload>, ApiError> {
    info!(
        user_id = %payload.user_id,
        kind = %payload.kind,
        "received transaction"
    );

    let cancel = CancelToken::new();
    let outcome = state.service.ingest(payload, &cancel).await?;

    Ok(Json(IngestResponsePayload {
        risk_level: outcome.transaction.risk_level,
        action: outcome.decision.as_ref().map(|decision| decision.action),
        transaction: outcome.transaction,
    }))
}

/// Read a single transaction
pub(super) async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    let tx = state.service.get(id).await?;
    Ok(Json(tx))
}

/// Filtered transaction listing
pub(super) async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponsePayload>, ApiError> {
    let filter = TransactionFilter {
        user_id: query.user_id,
        kind: query.kind,
        status: query.status,
        risk_level: query.risk_level,
        from: query.from,
        to: query.to,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        currency: query.currency,
        flagged_only: query.flagged_only,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let cancel = CancelToken::new();
    let transactions = state.service.list(&filter, limit, offset, &cancel).await?;

    Ok(Json(ListResponsePayload {
        count: transactions.len(),
        transactions,
    }))
}

/// Flag a transaction for manual review
pub(super) async fn flag_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlagRequestPayload>,
) -> Result<Json<Transaction>, ApiError> {
    let cancel = CancelToken::new();
    let tx = state
        .service
        .flag(id, payload.reason, payload.flagged_by, &cancel)
        .await?;
    Ok(Json(tx))
}

/// Resolve a flagged or pending transaction
pub(super) async fn review_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequestPayload>,
) -> Result<Json<Transaction>, ApiError> {
    let cancel = CancelToken::new();
    let tx = state
        .service
        .review(
            id,
            payload.status,
            payload.notes,
            payload.reviewed_by,
            &cancel,
        )
        .await?;
    Ok(Json(tx))
}

/// Aggregated risk view for a user
pub(super) async fn user_risk_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserRiskSummary>, ApiError> {
    let summary = state.service.risk_profile(user_id).await?;
    Ok(Json(summary))
}
