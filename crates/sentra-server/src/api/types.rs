//! REST API type definitions
//!
//! Request and response payloads for the transaction endpoints. Wire field
//! names are camelCase.

use chrono::{DateTime, Utc};
use sentra_core::types::{
    Action, RiskLevel, Transaction, TransactionKind, TransactionState,
};
use sentra_runtime::LifecycleService;
use sentra_store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LifecycleService<dyn Store>>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Ingest response: the created transaction plus the decision outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponsePayload {
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// Flag request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRequestPayload {
    pub reason: String,
    pub flagged_by: String,
}

/// Review request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequestPayload {
    pub status: TransactionState,
    #[serde(default)]
    pub notes: String,
    pub reviewed_by: String,
}

/// Transaction list query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionState>,
    pub risk_level: Option<RiskLevel>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub currency: Option<String>,
    pub flagged_only: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Transaction list response
#[derive(Debug, Serialize)]
pub struct ListResponsePayload {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}
