//! Transaction record, ingestion request, and list filter

use super::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Investment,
    Sale,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "DEPOSIT"),
            TransactionKind::Withdrawal => write!(f, "WITHDRAWAL"),
            TransactionKind::Transfer => write!(f, "TRANSFER"),
            TransactionKind::Payment => write!(f, "PAYMENT"),
            TransactionKind::Investment => write!(f, "INVESTMENT"),
            TransactionKind::Sale => write!(f, "SALE"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAWAL" => Ok(TransactionKind::Withdrawal),
            "TRANSFER" => Ok(TransactionKind::Transfer),
            "PAYMENT" => Ok(TransactionKind::Payment),
            "INVESTMENT" => Ok(TransactionKind::Investment),
            "SALE" => Ok(TransactionKind::Sale),
            other => Err(crate::error::CoreError::InvalidInput(format!(
                "unknown transaction type {:?}",
                other
            ))),
        }
    }
}

/// Lifecycle state of a transaction
///
/// Allowed transitions:
/// - PENDING -> APPROVED | FLAGGED | REJECTED | CANCELLED
/// - FLAGGED -> APPROVED | REJECTED | CANCELLED | FLAGGED (re-flag)
/// - APPROVED, REJECTED, CANCELLED are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    Pending,
    Approved,
    Flagged,
    Rejected,
    Cancelled,
}

impl TransactionState {
    /// Whether no further transition out of this state is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Approved | TransactionState::Rejected | TransactionState::Cancelled
        )
    }

    /// Whether the lifecycle graph permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: TransactionState) -> bool {
        match self {
            TransactionState::Pending => next != TransactionState::Pending,
            TransactionState::Flagged => next != TransactionState::Pending,
            _ => false,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Pending => write!(f, "PENDING"),
            TransactionState::Approved => write!(f, "APPROVED"),
            TransactionState::Flagged => write!(f, "FLAGGED"),
            TransactionState::Rejected => write!(f, "REJECTED"),
            TransactionState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for TransactionState {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionState::Pending),
            "APPROVED" => Ok(TransactionState::Approved),
            "FLAGGED" => Ok(TransactionState::Flagged),
            "REJECTED" => Ok(TransactionState::Rejected),
            "CANCELLED" => Ok(TransactionState::Cancelled),
            other => Err(crate::error::CoreError::InvalidInput(format!(
                "unknown transaction status {:?}",
                other
            ))),
        }
    }
}

/// Geographical origin of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// ISO-3166 alpha-2 country code
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ip_address: String,
    pub device_id: String,
    pub location: GeoLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub status: TransactionState,
    /// Set exactly once, at scoring time; never rewritten by reviewers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a PENDING transaction from a validated request
    ///
    /// The amount is normalized to two fractional digits, the persisted
    /// precision.
    pub fn from_request(id: Uuid, request: TransactionRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: request.user_id,
            kind: request.kind,
            amount: (request.amount * 100.0).round() / 100.0,
            currency: request.currency,
            source_account: request.source_account,
            destination_account: request.destination_account,
            description: request.description,
            ip_address: request.ip_address,
            device_id: request.device_id,
            location: request.location,
            metadata: request.metadata,
            status: TransactionState::Pending,
            risk_level: None,
            flagged_by: None,
            flag_reason: None,
            reviewed_by: None,
            review_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Asset type carried in metadata, for investment transactions
    pub fn asset_type(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("asset_type")?.as_str()
    }

    /// Asset sector carried in metadata, for investment transactions
    pub fn asset_sector(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("asset_sector")?.as_str()
    }
}

/// Ingestion request as received from the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ip_address: String,
    pub device_id: String,
    pub location: GeoLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Filter for transaction listing; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_only: Option<bool>,
}

impl TransactionFilter {
    /// Whether a transaction satisfies every set predicate
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(user_id) = self.user_id {
            if tx.user_id != user_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if tx.status != status {
                return false;
            }
        }
        if let Some(risk_level) = self.risk_level {
            if tx.risk_level != Some(risk_level) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if tx.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if tx.created_at > to {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if tx.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if tx.amount > max {
                return false;
            }
        }
        if let Some(ref currency) = self.currency {
            if &tx.currency != currency {
                return false;
            }
        }
        if self.flagged_only == Some(true) && tx.status != TransactionState::Flagged {
            return false;
        }
        true
    }
}
