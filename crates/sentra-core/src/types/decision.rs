//! Decision records and user risk summaries

use super::{Action, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of scoring a single transaction
///
/// Immutable once written; exactly one per transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub transaction_id: Uuid,
    /// Rule-weighted score in [0, 1]
    pub fraud_score: f64,
    /// Statistical-deviation score in [0, 1]
    pub anomaly_score: f64,
    /// Fused score in [0, 1]
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Ordered indicator tags, e.g. HIGH_AMOUNT, MULTIPLE_RECENT
    pub indicators: Vec<String>,
    pub action: Action,
    pub created_at: DateTime<Utc>,
}

/// Aggregated risk view for a user, served by the risk-profile endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRiskSummary {
    pub user_id: Uuid,
    /// Cumulative profile risk score in [0, 1]
    pub risk_score: f64,
    pub average_fraud_score: f64,
    pub average_anomaly_score: f64,
    /// Deduplicated indicators over recent decisions, first-seen order
    pub recent_indicators: Vec<String>,
    pub last_updated: DateTime<Utc>,
}
