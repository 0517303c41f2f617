//! Data model for transactions, profiles, and decisions

mod decision;
mod profile;
mod transaction;

pub use decision::{DecisionRecord, UserRiskSummary};
pub use profile::{GeoPoint, UserProfile, UsualSet};
pub use transaction::{
    GeoLocation, Transaction, TransactionFilter, TransactionKind, TransactionRequest,
    TransactionState,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse risk bucket derived from the fused score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(crate::error::CoreError::InvalidInput(format!(
                "unknown risk level {:?}",
                other
            ))),
        }
    }
}

/// Operational directive produced by the decision fuser
///
/// Maps one-to-one onto lifecycle transitions applied at ingest:
/// Approve -> APPROVED, Review -> FLAGGED, Reject -> REJECTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Approve,
    Review,
    Reject,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Approve => write!(f, "APPROVE"),
            Action::Review => write!(f, "REVIEW"),
            Action::Reject => write!(f, "REJECT"),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(Action::Approve),
            "REVIEW" => Ok(Action::Review),
            "REJECT" => Ok(Action::Reject),
            other => Err(crate::error::CoreError::InvalidInput(format!(
                "unknown action {:?}",
                other
            ))),
        }
    }
}

impl Action {
    /// Lifecycle state an ingest-time action resolves to
    pub fn target_state(&self) -> TransactionState {
        match self {
            Action::Approve => TransactionState::Approved,
            Action::Review => TransactionState::Flagged,
            Action::Reject => TransactionState::Rejected,
        }
    }
}
