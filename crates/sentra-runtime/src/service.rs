//! Lifecycle controller
//!
//! The synchronous decision path for a transaction:
//! validate -> persist PENDING -> read profile and recent history ->
//! score (CPU only) -> record decision -> compare-and-set the final state ->
//! best-effort profile update.
//!
//! Suspension points are exactly the store calls; cancellation is polled at
//! each of them and ignored once the decision record is written.

use crate::cancel::CancelToken;
use crate::locks::UserLocks;
use chrono::{Duration as TimeDelta, Utc};
use sentra_core::config::EngineConfig;
use sentra_core::error::{CoreError, Result};
use sentra_core::types::{
    DecisionRecord, Transaction, TransactionFilter, TransactionRequest, TransactionState,
    UserProfile, UserRiskSummary,
};
use sentra_core::validation::validate_request;
use sentra_scoring::{
    fuse, profile as profile_math, score_anomaly, score_fraud, BehaviorSnapshot, FeatureView,
    MarketView,
};
use sentra_store::{RetryPolicy, StateUpdate, Store, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Decisions consulted for the user risk summary
const RECENT_DECISION_LIMIT: usize = 10;

/// Result of an accepted ingest
///
/// `decision` is `None` only when the ingest was cancelled after the PENDING
/// row was persisted but before scoring completed.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub transaction: Transaction,
    pub decision: Option<DecisionRecord>,
}

/// Transaction lifecycle controller
pub struct LifecycleService<S: ?Sized> {
    store: Arc<S>,
    config: Arc<EngineConfig>,
    retry: RetryPolicy,
    locks: UserLocks,
    market: MarketView,
}

impl<S: Store + ?Sized> LifecycleService<S> {
    pub fn new(store: Arc<S>, config: Arc<EngineConfig>) -> Self {
        let locks = UserLocks::new(config.serialize_per_user);
        Self {
            store,
            config,
            retry: RetryPolicy::default(),
            locks,
            market: MarketView::default(),
        }
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Provide sector-performance reference data
    pub fn with_market_view(mut self, market: MarketView) -> Self {
        self.market = market;
        self
    }

    /// Ingest a transaction: validate, score, decide, and persist
    pub async fn ingest(
        &self,
        request: TransactionRequest,
        cancel: &CancelToken,
    ) -> Result<IngestOutcome> {
        validate_request(&request)?;

        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);
        let user_id = request.user_id;

        // Acceptance order per user is defined by lock acquisition
        let _guard = self.locks.acquire(user_id).await;
        let now = Utc::now();
        let tx = Transaction::from_request(Uuid::new_v4(), request, now);

        self.store_op(deadline, "insert transaction", || {
            self.store.insert_transaction(&tx)
        })
        .await?;

        if cancel.is_cancelled() {
            return self.cancel_pending(tx).await;
        }

        let profile = match self
            .store_op(deadline, "read profile", || self.store.get_profile(user_id))
            .await
        {
            Ok(profile) => Some(profile),
            Err(CoreError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };

        if cancel.is_cancelled() {
            return self.cancel_pending(tx).await;
        }

        let window = TimeDelta::days(self.config.history.long_days);
        let cap = self.config.store.recent_cap;
        let history = self
            .store_op(deadline, "read recent history", || {
                self.store.get_recent_transactions(user_id, window, cap)
            })
            .await?;

        if cancel.is_cancelled() {
            return self.cancel_pending(tx).await;
        }

        // CPU-only scoring; no suspension from here to the decision insert
        let prior: Vec<Transaction> = history.iter().filter(|t| t.id != tx.id).cloned().collect();
        let behavior = BehaviorSnapshot::build(
            user_id,
            &prior,
            TimeDelta::hours(self.config.history.short_hours),
            now,
        );
        let features = FeatureView::assemble(
            &tx,
            profile.as_ref(),
            &prior,
            &behavior,
            self.config.profile.geo_tolerance_deg,
            TimeDelta::hours(self.config.fraud.velocity_window_hours),
            now,
        );
        let fraud = score_fraud(&features, &tx.location.country, &self.config.fraud);
        let anomaly = score_anomaly(
            &tx,
            &features,
            &behavior,
            &self.market,
            &self.config.anomaly_weights,
        );
        let verdict = fuse(
            fraud.score,
            anomaly.score,
            &self.config.fuse_weights,
            &self.config.thresholds,
        );

        let mut indicators = fraud.indicators.clone();
        indicators.extend(anomaly.indicators.iter().cloned());

        let decision = DecisionRecord {
            transaction_id: tx.id,
            fraud_score: fraud.score,
            anomaly_score: anomaly.score,
            risk_score: verdict.score,
            risk_level: verdict.level,
            indicators,
            action: verdict.action,
            created_at: Utc::now(),
        };

        // Last cancellation point; after the decision insert the request
        // runs to completion
        if cancel.is_cancelled() {
            return self.cancel_pending(tx).await;
        }

        self.store_op(deadline, "insert decision", || {
            self.store.insert_decision(&decision)
        })
        .await?;

        let update = StateUpdate::transition(
            TransactionState::Pending,
            verdict.action.target_state(),
            Utc::now(),
        )
        .with_risk_level(verdict.level);
        let transaction = self
            .store_op(deadline, "apply decision state", || {
                self.store.update_transaction_state(tx.id, update.clone())
            })
            .await?;

        info!(
            transaction_id = %tx.id,
            user_id = %user_id,
            risk_level = %verdict.level,
            action = %verdict.action,
            score = verdict.score,
            "transaction scored"
        );

        self.update_profile_best_effort(&transaction, profile, fraud.score, features.count_24h, now)
            .await;

        Ok(IngestOutcome {
            transaction,
            decision: Some(decision),
        })
    }

    /// Flag a transaction for manual review
    pub async fn flag(
        &self,
        id: Uuid,
        reason: String,
        flagged_by: String,
        cancel: &CancelToken,
    ) -> Result<Transaction> {
        ensure_not_cancelled(cancel, "flag")?;
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);

        self.transition_with_retry(id, deadline, cancel, TransactionState::Flagged, |tx| {
            StateUpdate::transition(tx.status, TransactionState::Flagged, Utc::now())
                .with_flag(reason.clone(), flagged_by.clone())
        })
        .await
    }

    /// Resolve a flagged or pending transaction
    pub async fn review(
        &self,
        id: Uuid,
        target: TransactionState,
        notes: String,
        reviewed_by: String,
        cancel: &CancelToken,
    ) -> Result<Transaction> {
        if !matches!(
            target,
            TransactionState::Approved | TransactionState::Rejected | TransactionState::Cancelled
        ) {
            return Err(CoreError::InvalidInput(format!(
                "review cannot set status {}",
                target
            )));
        }
        ensure_not_cancelled(cancel, "review")?;
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);

        self.transition_with_retry(id, deadline, cancel, target, |tx| {
            StateUpdate::transition(tx.status, target, Utc::now())
                .with_review(notes.clone(), reviewed_by.clone())
        })
        .await
    }

    /// Read a transaction
    pub async fn get(&self, id: Uuid) -> Result<Transaction> {
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);
        self.store_op(deadline, "read transaction", || self.store.get_transaction(id))
            .await
    }

    /// Read the decision record for a transaction
    pub async fn get_decision(&self, id: Uuid) -> Result<DecisionRecord> {
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);
        self.store_op(deadline, "read decision", || self.store.get_decision(id))
            .await
    }

    /// Filtered transaction listing
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<Transaction>> {
        ensure_not_cancelled(cancel, "list")?;
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);
        self.store_op(deadline, "list transactions", || {
            self.store.list_transactions(filter, limit, offset)
        })
        .await
    }

    /// Aggregated risk view for a user
    pub async fn risk_profile(&self, user_id: Uuid) -> Result<UserRiskSummary> {
        let deadline = Instant::now() + Duration::from_millis(self.config.store.total_timeout_ms);

        let profile = self
            .store_op(deadline, "read profile", || self.store.get_profile(user_id))
            .await?;
        let decisions = self
            .store_op(deadline, "read recent decisions", || {
                self.store.recent_decisions(user_id, RECENT_DECISION_LIMIT)
            })
            .await?;

        let (average_fraud_score, average_anomaly_score) = if decisions.is_empty() {
            (0.0, 0.0)
        } else {
            let n = decisions.len() as f64;
            (
                decisions.iter().map(|d| d.fraud_score).sum::<f64>() / n,
                decisions.iter().map(|d| d.anomaly_score).sum::<f64>() / n,
            )
        };

        // Deduplicate indicators, keeping first-seen order (newest decisions
        // first)
        let mut recent_indicators: Vec<String> = Vec::new();
        for record in &decisions {
            for indicator in &record.indicators {
                if !recent_indicators.contains(indicator) {
                    recent_indicators.push(indicator.clone());
                }
            }
        }

        Ok(UserRiskSummary {
            user_id,
            risk_score: profile.risk_score,
            average_fraud_score,
            average_anomaly_score,
            recent_indicators,
            last_updated: profile.last_seen,
        })
    }

    /// Best-effort PENDING -> CANCELLED after a cancelled ingest
    async fn cancel_pending(&self, tx: Transaction) -> Result<IngestOutcome> {
        let update = StateUpdate::transition(
            TransactionState::Pending,
            TransactionState::Cancelled,
            Utc::now(),
        );
        let budget = Duration::from_millis(self.config.store.op_timeout_ms);
        let transaction =
            match tokio::time::timeout(budget, self.store.update_transaction_state(tx.id, update))
                .await
            {
                Ok(Ok(updated)) => updated,
                Ok(Err(err)) => {
                    warn!(transaction_id = %tx.id, "failed to cancel pending transaction: {}", err);
                    tx
                }
                Err(_) => {
                    warn!(transaction_id = %tx.id, "timed out cancelling pending transaction");
                    tx
                }
            };

        info!(transaction_id = %transaction.id, "ingest cancelled before scoring");
        Ok(IngestOutcome {
            transaction,
            decision: None,
        })
    }

    /// Merge the scored transaction into the profile; failures are logged
    /// and swallowed, the decision record is the system of record
    async fn update_profile_best_effort(
        &self,
        tx: &Transaction,
        profile: Option<UserProfile>,
        fraud_score: f64,
        count_24h: usize,
        now: chrono::DateTime<Utc>,
    ) {
        let mut profile = profile.unwrap_or_else(|| UserProfile::new(tx.user_id, now));
        profile_math::absorb(
            &mut profile,
            tx,
            fraud_score,
            count_24h,
            &self.config.profile,
            now,
        );

        let budget = Duration::from_millis(self.config.store.op_timeout_ms);
        let result = tokio::time::timeout(
            budget,
            self.retry.run(|| self.store.upsert_profile(&profile)),
        )
        .await;
        match result {
            Ok(Ok(())) => debug!(user_id = %tx.user_id, "profile updated"),
            Ok(Err(err)) => {
                warn!(user_id = %tx.user_id, "profile update failed, continuing: {}", err)
            }
            Err(_) => warn!(user_id = %tx.user_id, "profile update timed out, continuing"),
        }
    }

    /// Guarded state transition with a single retry after a lost CAS race
    async fn transition_with_retry<F>(
        &self,
        id: Uuid,
        deadline: Instant,
        cancel: &CancelToken,
        target: TransactionState,
        build: F,
    ) -> Result<Transaction>
    where
        F: Fn(&Transaction) -> StateUpdate,
    {
        let mut tx = self
            .store_op(deadline, "read transaction", || self.store.get_transaction(id))
            .await?;

        for attempt in 0..2 {
            if !tx.status.can_transition_to(target) {
                return Err(CoreError::InvalidTransition {
                    from: tx.status,
                    to: target,
                });
            }
            ensure_not_cancelled(cancel, "state transition")?;

            let update = build(&tx);
            match self
                .store_op(deadline, "update transaction state", || {
                    self.store.update_transaction_state(id, update.clone())
                })
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(CoreError::Conflict(_)) if attempt == 0 => {
                    // Lost the race; re-read the current state and try once
                    // more if still permitted
                    tx = self
                        .store_op(deadline, "re-read transaction", || {
                            self.store.get_transaction(id)
                        })
                        .await?;
                }
                Err(err) => return Err(err),
            }
        }

        Err(CoreError::Conflict(format!(
            "transaction {} kept changing concurrently",
            id
        )))
    }

    /// Run a store operation under the retry policy and deadlines
    async fn store_op<T, F, Fut>(&self, deadline: Instant, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let now = Instant::now();
        if now >= deadline {
            return Err(CoreError::Timeout(format!(
                "request deadline exceeded before {}",
                label
            )));
        }
        let budget =
            (deadline - now).min(Duration::from_millis(self.config.store.op_timeout_ms));

        match tokio::time::timeout(budget, self.retry.run(&mut op)).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::Timeout(format!("{} exceeded its deadline", label))),
        }
    }
}

fn ensure_not_cancelled(cancel: &CancelToken, what: &str) -> Result<()> {
    if cancel.is_cancelled() {
        Err(CoreError::Cancelled(format!("{} request cancelled", what)))
    } else {
        Ok(())
    }
}
