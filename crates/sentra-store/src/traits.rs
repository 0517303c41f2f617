//! Core trait definition for the store
//!
//! All implementations must be `Send + Sync` for use across async tasks.
//! The store enforces compare-and-set on state updates but not the lifecycle
//! graph itself; the lifecycle controller owns the graph.

use crate::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sentra_core::types::{
    DecisionRecord, RiskLevel, Transaction, TransactionFilter, TransactionState, UserProfile,
};
use uuid::Uuid;

/// Compare-and-set state transition with audit fields
///
/// `expected` is the state the caller last observed; the update applies only
/// if the row still holds it. `risk_level` is set at scoring time and never
/// overwritten once present.
#[derive(Debug, Clone)]
pub struct StateUpdate {
    pub expected: TransactionState,
    pub new_state: TransactionState,
    pub risk_level: Option<RiskLevel>,
    pub flagged_by: Option<String>,
    pub flag_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StateUpdate {
    /// Bare transition carrying no audit fields
    pub fn transition(
        expected: TransactionState,
        new_state: TransactionState,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            expected,
            new_state,
            risk_level: None,
            flagged_by: None,
            flag_reason: None,
            reviewed_by: None,
            review_notes: None,
            updated_at: now,
        }
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = Some(level);
        self
    }

    pub fn with_flag(mut self, reason: String, flagged_by: String) -> Self {
        self.flag_reason = Some(reason);
        self.flagged_by = Some(flagged_by);
        self
    }

    pub fn with_review(mut self, notes: String, reviewed_by: String) -> Self {
        self.review_notes = Some(notes);
        self.reviewed_by = Some(reviewed_by);
        self
    }
}

/// Persistence boundary for profiles, transactions, and decisions
#[async_trait]
pub trait Store: Send + Sync {
    /// Read a user's behavioral profile; `NotFound` when absent
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<UserProfile>;

    /// Write a profile, last-writer-wins at profile granularity
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<()>;

    /// Transactions for the user created within `now - window`, newest
    /// first, bounded by `cap`
    async fn get_recent_transactions(
        &self,
        user_id: Uuid,
        window: Duration,
        cap: usize,
    ) -> StoreResult<Vec<Transaction>>;

    async fn get_transaction(&self, id: Uuid) -> StoreResult<Transaction>;

    async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()>;

    /// Compare-and-set state update; returns the row after the update
    ///
    /// Fails with `Conflict` when the row's state no longer matches
    /// `update.expected`, and `NotFound` for a missing id.
    async fn update_transaction_state(
        &self,
        id: Uuid,
        update: StateUpdate,
    ) -> StoreResult<Transaction>;

    /// Write a decision record; `Conflict` if one already exists for the
    /// transaction
    async fn insert_decision(&self, record: &DecisionRecord) -> StoreResult<()>;

    async fn get_decision(&self, transaction_id: Uuid) -> StoreResult<DecisionRecord>;

    /// Filtered listing, newest first
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Transaction>>;

    /// Most recent decisions for a user's transactions, newest first
    async fn recent_decisions(&self, user_id: Uuid, limit: usize)
        -> StoreResult<Vec<DecisionRecord>>;
}
