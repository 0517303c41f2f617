//! End-to-end lifecycle tests against the in-memory store

use chrono::{Duration, Utc};
use sentra_core::config::EngineConfig;
use sentra_core::error::CoreError;
use sentra_core::types::{
    Action, GeoLocation, RiskLevel, Transaction, TransactionFilter, TransactionKind,
    TransactionRequest, TransactionState, UserProfile,
};
use sentra_runtime::{CancelToken, LifecycleService};
use sentra_store::{MemoryStore, StateUpdate, Store, StoreError, StoreResult};
use std::sync::Arc;
use uuid::Uuid;

fn make_request(user_id: Uuid, kind: TransactionKind, amount: f64) -> TransactionRequest {
    TransactionRequest {
        user_id,
        kind,
        amount,
        currency: "USD".to_string(),
        source_account: None,
        destination_account: None,
        description: None,
        ip_address: "203.0.113.7".to_string(),
        device_id: "D1".to_string(),
        location: GeoLocation {
            latitude: 40.71,
            longitude: -74.0,
            country: "US".to_string(),
            city: None,
        },
        metadata: None,
    }
}

fn service(store: Arc<MemoryStore>) -> LifecycleService<MemoryStore> {
    LifecycleService::new(store, Arc::new(EngineConfig::default()))
}

async fn seed_transaction(
    store: &MemoryStore,
    user_id: Uuid,
    kind: TransactionKind,
    amount: f64,
    age: Duration,
) -> Transaction {
    let request = make_request(user_id, kind, amount);
    let mut tx = Transaction::from_request(Uuid::new_v4(), request, Utc::now() - age);
    tx.status = TransactionState::Approved;
    tx.risk_level = Some(RiskLevel::Low);
    store.insert_transaction(&tx).await.unwrap();
    tx
}

// Scenario: clean low-risk deposit from a new user
#[tokio::test]
async fn test_clean_deposit_is_approved_low_risk() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let outcome = svc
        .ingest(
            make_request(user_id, TransactionKind::Deposit, 100.0),
            &CancelToken::new(),
        )
        .await
        .unwrap();

    let decision = outcome.decision.expect("decision recorded");
    assert!(decision.fraud_score <= 0.15);
    assert!(decision.anomaly_score <= 0.30);
    assert_eq!(decision.risk_level, RiskLevel::Low);
    assert_eq!(decision.action, Action::Approve);
    assert_eq!(outcome.transaction.status, TransactionState::Approved);
    assert_eq!(outcome.transaction.risk_level, Some(RiskLevel::Low));

    // the learning loop created a profile
    let profile = store.get_profile(user_id).await.unwrap();
    assert_eq!(profile.avg_amount, Some(100.0));
    assert!(profile.usual_ips.contains(&"203.0.113.7".to_string()));
}

// Scenario: velocity trip on the sixth transaction in 24h
#[tokio::test]
async fn test_velocity_trip_emits_multiple_recent() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    for i in 0..5 {
        seed_transaction(
            &store,
            user_id,
            TransactionKind::Deposit,
            50.0,
            Duration::hours(i + 1),
        )
        .await;
    }

    let outcome = svc
        .ingest(
            make_request(user_id, TransactionKind::Deposit, 50.0),
            &CancelToken::new(),
        )
        .await
        .unwrap();

    let decision = outcome.decision.unwrap();
    assert!(decision.fraud_score >= 0.20);
    assert!(decision
        .indicators
        .contains(&"MULTIPLE_RECENT".to_string()));
}

// Scenario: high-value foreign transaction from an unknown device and IP
#[tokio::test]
async fn test_high_value_foreign_is_flagged() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    // established profile with a different usual origin
    let mut profile = UserProfile::new(user_id, Utc::now() - Duration::days(30));
    profile.usual_ips.observe("198.51.100.1".to_string(), 20);
    profile.usual_devices.observe("D-KNOWN".to_string(), 20);
    store.upsert_profile(&profile).await.unwrap();

    let mut request = make_request(user_id, TransactionKind::Transfer, 25_000.0);
    request.location.country = "FR".to_string();
    request.ip_address = "192.0.2.99".to_string();
    request.device_id = "D-NEW".to_string();

    let outcome = svc.ingest(request, &CancelToken::new()).await.unwrap();

    let decision = outcome.decision.unwrap();
    // 0.3 + 0.1 + 0.15 + 0.10
    assert!(decision.fraud_score >= 0.65);
    assert!(decision.indicators.contains(&"HIGH_AMOUNT".to_string()));
    assert!(decision
        .indicators
        .contains(&"FOREIGN_LOCATION".to_string()));
    assert!(matches!(decision.action, Action::Review | Action::Reject));
    assert!(matches!(
        outcome.transaction.status,
        TransactionState::Flagged | TransactionState::Rejected
    ));
}

// Scenario: two concurrent ingests for one user both complete
#[tokio::test]
async fn test_concurrent_ingest_same_user() {
    let store = Arc::new(MemoryStore::new());
    let svc = Arc::new(service(store.clone()));
    let user_id = Uuid::new_v4();

    let a = {
        let svc = svc.clone();
        tokio::spawn(async move {
            svc.ingest(
                make_request(user_id, TransactionKind::Deposit, 100.0),
                &CancelToken::new(),
            )
            .await
        })
    };
    let b = {
        let svc = svc.clone();
        tokio::spawn(async move {
            svc.ingest(
                make_request(user_id, TransactionKind::Deposit, 100.0),
                &CancelToken::new(),
            )
            .await
        })
    };

    let outcome_a = a.await.unwrap().unwrap();
    let outcome_b = b.await.unwrap().unwrap();
    assert!(outcome_a.decision.is_some());
    assert!(outcome_b.decision.is_some());

    // profile reflects both observations
    let profile = store.get_profile(user_id).await.unwrap();
    assert_eq!(profile.avg_amount, Some(100.0));
    assert_eq!(profile.frequency, 2.0);

    // per-user serialization keeps acceptance and creation order aligned
    let first = store.get_transaction(outcome_a.transaction.id).await.unwrap();
    let second = store.get_transaction(outcome_b.transaction.id).await.unwrap();
    assert_ne!(first.created_at, second.created_at);
}

// Scenario: review a flagged transaction, then repeat the terminal move
#[tokio::test]
async fn test_review_then_invalid_transition() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let mut request = make_request(user_id, TransactionKind::Transfer, 25_000.0);
    request.location.country = "FR".to_string();
    let outcome = svc.ingest(request, &CancelToken::new()).await.unwrap();
    assert_eq!(outcome.transaction.status, TransactionState::Flagged);

    let reviewed = svc
        .review(
            outcome.transaction.id,
            TransactionState::Approved,
            "manual ok".to_string(),
            "R1".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(reviewed.status, TransactionState::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("R1"));
    // reviewers never rewrite the risk level
    assert_eq!(reviewed.risk_level, outcome.transaction.risk_level);

    let err = svc
        .review(
            outcome.transaction.id,
            TransactionState::Approved,
            "again".to_string(),
            "R1".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
}

// Scenario: cancellation before the decision insert
#[tokio::test]
async fn test_cancelled_ingest_leaves_no_decision() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = svc
        .ingest(make_request(user_id, TransactionKind::Deposit, 100.0), &cancel)
        .await
        .unwrap();

    assert_eq!(outcome.transaction.status, TransactionState::Cancelled);
    assert!(outcome.decision.is_none());
    assert!(outcome.transaction.risk_level.is_none());
    assert!(matches!(
        store.get_decision(outcome.transaction.id).await.unwrap_err(),
        StoreError::NotFound(_)
    ));
    // profile untouched
    assert!(matches!(
        store.get_profile(user_id).await.unwrap_err(),
        StoreError::NotFound(_)
    ));
}

// Property: every accepted ingest yields exactly one transaction and one
// decision with the same id
#[tokio::test]
async fn test_one_transaction_one_decision_per_ingest() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let mut ids = Vec::new();
    for _ in 0..4 {
        let outcome = svc
            .ingest(
                make_request(user_id, TransactionKind::Payment, 75.0),
                &CancelToken::new(),
            )
            .await
            .unwrap();
        ids.push(outcome.transaction.id);
    }

    let listed = store
        .list_transactions(
            &TransactionFilter {
                user_id: Some(user_id),
                ..Default::default()
            },
            100,
            0,
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 4);

    for id in ids {
        let decision = store.get_decision(id).await.unwrap();
        assert_eq!(decision.transaction_id, id);
    }
}

// Property: crossing the HIGH_AMOUNT threshold never lowers the fused score
#[tokio::test]
async fn test_amount_monotonicity_through_threshold() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());

    let below = svc
        .ingest(
            make_request(Uuid::new_v4(), TransactionKind::Deposit, 9_999.0),
            &CancelToken::new(),
        )
        .await
        .unwrap()
        .decision
        .unwrap();
    let above = svc
        .ingest(
            make_request(Uuid::new_v4(), TransactionKind::Deposit, 10_001.0),
            &CancelToken::new(),
        )
        .await
        .unwrap()
        .decision
        .unwrap();

    assert!(above.risk_score >= below.risk_score);
}

// Property: usual-sets stay bounded at capacity
#[tokio::test]
async fn test_usual_sets_stay_bounded() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    for i in 0..25 {
        let mut request = make_request(user_id, TransactionKind::Deposit, 100.0);
        request.ip_address = format!("203.0.113.{}", i + 1);
        svc.ingest(request, &CancelToken::new()).await.unwrap();
    }

    let profile = store.get_profile(user_id).await.unwrap();
    assert_eq!(profile.usual_ips.len(), 20);
}

#[tokio::test]
async fn test_flag_then_resolve() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let outcome = svc
        .ingest(
            make_request(user_id, TransactionKind::Deposit, 100.0),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    // clean deposit lands APPROVED, which is terminal
    let err = svc
        .flag(
            outcome.transaction.id,
            "suspicious after the fact".to_string(),
            "analyst-7".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    // a pending transaction can be flagged and then rejected
    let tx = Transaction::from_request(
        Uuid::new_v4(),
        make_request(user_id, TransactionKind::Withdrawal, 100.0),
        Utc::now(),
    );
    store.insert_transaction(&tx).await.unwrap();

    let flagged = svc
        .flag(
            tx.id,
            "manual hold".to_string(),
            "analyst-7".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(flagged.status, TransactionState::Flagged);
    assert_eq!(flagged.flag_reason.as_deref(), Some("manual hold"));

    let rejected = svc
        .review(
            tx.id,
            TransactionState::Rejected,
            "confirmed".to_string(),
            "analyst-8".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, TransactionState::Rejected);
}

#[tokio::test]
async fn test_review_rejects_bad_target() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());

    let err = svc
        .review(
            Uuid::new_v4(),
            TransactionState::Pending,
            "".to_string(),
            "R1".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_invalid_request_is_rejected_before_persistence() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    let request = make_request(user_id, TransactionKind::Deposit, -5.0);
    let err = svc.ingest(request, &CancelToken::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    let listed = store
        .list_transactions(&TransactionFilter::default(), 10, 0)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_risk_profile_aggregates_recent_decisions() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    svc.ingest(
        make_request(user_id, TransactionKind::Deposit, 100.0),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let mut foreign = make_request(user_id, TransactionKind::Transfer, 25_000.0);
    foreign.location.country = "FR".to_string();
    foreign.ip_address = "192.0.2.99".to_string();
    foreign.device_id = "D-NEW".to_string();
    svc.ingest(foreign, &CancelToken::new()).await.unwrap();

    let summary = svc.risk_profile(user_id).await.unwrap();
    assert_eq!(summary.user_id, user_id);
    assert!(summary.risk_score > 0.0);
    assert!(summary.average_fraud_score > 0.0);
    assert!(summary
        .recent_indicators
        .contains(&"HIGH_AMOUNT".to_string()));
    // deduplicated
    let mut seen = summary.recent_indicators.clone();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), summary.recent_indicators.len());
}

#[tokio::test]
async fn test_risk_profile_unknown_user_not_found() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let err = svc.risk_profile(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_list_respects_filter() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let user_id = Uuid::new_v4();

    svc.ingest(
        make_request(user_id, TransactionKind::Deposit, 100.0),
        &CancelToken::new(),
    )
    .await
    .unwrap();
    svc.ingest(
        make_request(user_id, TransactionKind::Withdrawal, 40.0),
        &CancelToken::new(),
    )
    .await
    .unwrap();

    let deposits = svc
        .list(
            &TransactionFilter {
                user_id: Some(user_id),
                kind: Some(TransactionKind::Deposit),
                ..Default::default()
            },
            50,
            0,
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].kind, TransactionKind::Deposit);
}

#[tokio::test]
async fn test_cancelled_list_surfaces_cancelled() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone());
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = svc
        .list(&TransactionFilter::default(), 10, 0, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Cancelled(_)));
}

/// Store wrapper that injects one CAS conflict, then delegates
struct ConflictOnceStore {
    inner: MemoryStore,
    tripped: std::sync::atomic::AtomicBool,
}

#[async_trait::async_trait]
impl Store for ConflictOnceStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<UserProfile> {
        self.inner.get_profile(user_id).await
    }
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.inner.upsert_profile(profile).await
    }
    async fn get_recent_transactions(
        &self,
        user_id: Uuid,
        window: Duration,
        cap: usize,
    ) -> StoreResult<Vec<Transaction>> {
        self.inner.get_recent_transactions(user_id, window, cap).await
    }
    async fn get_transaction(&self, id: Uuid) -> StoreResult<Transaction> {
        self.inner.get_transaction(id).await
    }
    async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.inner.insert_transaction(tx).await
    }
    async fn update_transaction_state(
        &self,
        id: Uuid,
        update: StateUpdate,
    ) -> StoreResult<Transaction> {
        if !self.tripped.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Conflict("injected race".to_string()));
        }
        self.inner.update_transaction_state(id, update).await
    }
    async fn insert_decision(&self, record: &sentra_core::types::DecisionRecord) -> StoreResult<()> {
        self.inner.insert_decision(record).await
    }
    async fn get_decision(
        &self,
        transaction_id: Uuid,
    ) -> StoreResult<sentra_core::types::DecisionRecord> {
        self.inner.get_decision(transaction_id).await
    }
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Transaction>> {
        self.inner.list_transactions(filter, limit, offset).await
    }
    async fn recent_decisions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<sentra_core::types::DecisionRecord>> {
        self.inner.recent_decisions(user_id, limit).await
    }
}

#[tokio::test]
async fn test_flag_retries_once_after_conflict() {
    let store = Arc::new(ConflictOnceStore {
        inner: MemoryStore::new(),
        tripped: std::sync::atomic::AtomicBool::new(false),
    });
    let svc = LifecycleService::new(store.clone(), Arc::new(EngineConfig::default()));
    let user_id = Uuid::new_v4();

    let tx = Transaction::from_request(
        Uuid::new_v4(),
        make_request(user_id, TransactionKind::Deposit, 100.0),
        Utc::now(),
    );
    store.inner.insert_transaction(&tx).await.unwrap();

    let flagged = svc
        .flag(
            tx.id,
            "hold".to_string(),
            "analyst".to_string(),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(flagged.status, TransactionState::Flagged);
}

/// Store wrapper that delays every read past the per-op deadline
struct SlowStore {
    inner: MemoryStore,
    delay: std::time::Duration,
}

#[async_trait::async_trait]
impl Store for SlowStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<UserProfile> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_profile(user_id).await
    }
    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.inner.upsert_profile(profile).await
    }
    async fn get_recent_transactions(
        &self,
        user_id: Uuid,
        window: Duration,
        cap: usize,
    ) -> StoreResult<Vec<Transaction>> {
        self.inner.get_recent_transactions(user_id, window, cap).await
    }
    async fn get_transaction(&self, id: Uuid) -> StoreResult<Transaction> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_transaction(id).await
    }
    async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.inner.insert_transaction(tx).await
    }
    async fn update_transaction_state(
        &self,
        id: Uuid,
        update: StateUpdate,
    ) -> StoreResult<Transaction> {
        self.inner.update_transaction_state(id, update).await
    }
    async fn insert_decision(&self, record: &sentra_core::types::DecisionRecord) -> StoreResult<()> {
        self.inner.insert_decision(record).await
    }
    async fn get_decision(
        &self,
        transaction_id: Uuid,
    ) -> StoreResult<sentra_core::types::DecisionRecord> {
        self.inner.get_decision(transaction_id).await
    }
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Transaction>> {
        self.inner.list_transactions(filter, limit, offset).await
    }
    async fn recent_decisions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<sentra_core::types::DecisionRecord>> {
        self.inner.recent_decisions(user_id, limit).await
    }
}

#[tokio::test]
async fn test_slow_store_surfaces_timeout() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: std::time::Duration::from_millis(200),
    });
    let mut config = EngineConfig::default();
    config.store.op_timeout_ms = 20;
    config.store.total_timeout_ms = 100;
    let svc = LifecycleService::new(store, Arc::new(config));

    let err = svc.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout(_)));
}
