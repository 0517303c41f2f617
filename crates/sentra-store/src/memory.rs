//! In-memory store backend
//!
//! Simple memory-based storage for testing and development. Data is lost
//! when the process restarts.

use crate::error::{StoreError, StoreResult};
use crate::traits::{StateUpdate, Store};
use async_trait::async_trait;
use chrono::Duration;
use sentra_core::types::{
    DecisionRecord, Transaction, TransactionFilter, TransactionState, UserProfile,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
    transactions: RwLock<HashMap<Uuid, Transaction>>,
    decisions: RwLock<HashMap<Uuid, DecisionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<UserProfile> {
        let profiles = self.profiles.read().await;
        profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile for user {}", user_id)))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_recent_transactions(
        &self,
        user_id: Uuid,
        window: Duration,
        cap: usize,
    ) -> StoreResult<Vec<Transaction>> {
        let cutoff = chrono::Utc::now() - window;
        let transactions = self.transactions.read().await;
        let mut recent: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.user_id == user_id && tx.created_at > cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(cap);
        Ok(recent)
    }

    async fn get_transaction(&self, id: Uuid) -> StoreResult<Transaction> {
        let transactions = self.transactions.read().await;
        transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", id)))
    }

    async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&tx.id) {
            return Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                tx.id
            )));
        }
        transactions.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn update_transaction_state(
        &self,
        id: Uuid,
        update: StateUpdate,
    ) -> StoreResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", id)))?;

        if tx.status != update.expected {
            return Err(StoreError::Conflict(format!(
                "transaction {} is {} not {}",
                id, tx.status, update.expected
            )));
        }

        tx.status = update.new_state;
        if tx.risk_level.is_none() {
            tx.risk_level = update.risk_level;
        }
        if update.flagged_by.is_some() {
            tx.flagged_by = update.flagged_by;
        }
        if update.flag_reason.is_some() {
            tx.flag_reason = update.flag_reason;
        }
        if update.reviewed_by.is_some() {
            tx.reviewed_by = update.reviewed_by;
        }
        if update.review_notes.is_some() {
            tx.review_notes = update.review_notes;
        }
        tx.updated_at = update.updated_at;

        Ok(tx.clone())
    }

    async fn insert_decision(&self, record: &DecisionRecord) -> StoreResult<()> {
        let mut decisions = self.decisions.write().await;
        if decisions.contains_key(&record.transaction_id) {
            return Err(StoreError::Conflict(format!(
                "decision for transaction {} already exists",
                record.transaction_id
            )));
        }
        decisions.insert(record.transaction_id, record.clone());
        Ok(())
    }

    async fn get_decision(&self, transaction_id: Uuid) -> StoreResult<DecisionRecord> {
        let decisions = self.decisions.read().await;
        decisions
            .get(&transaction_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("decision for {}", transaction_id)))
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut matched: Vec<Transaction> = transactions
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn recent_decisions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<DecisionRecord>> {
        let transactions = self.transactions.read().await;
        let decisions = self.decisions.read().await;
        let mut recent: Vec<DecisionRecord> = decisions
            .values()
            .filter(|record| {
                transactions
                    .get(&record.transaction_id)
                    .map(|tx| tx.user_id == user_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }
}
