//! PostgreSQL store backend
//!
//! Tables:
//! - profiles: one row per user, usual-sets as JSONB
//! - transactions: one row per transaction, location/metadata as JSONB
//! - decisions: one immutable row per scored transaction
//!
//! State updates are compare-and-set on the current status column; the
//! losing writer of a concurrent transition observes zero affected rows and
//! reports `Conflict`.

use crate::error::{StoreError, StoreResult};
use crate::traits::{StateUpdate, Store};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sentra_core::types::{
    Action, DecisionRecord, GeoLocation, RiskLevel, Transaction, TransactionFilter,
    TransactionKind, TransactionState, UserProfile, UsualSet,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to the database
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: &PgRow) -> StoreResult<Transaction> {
        let kind: String = row.try_get("type")?;
        let status: String = row.try_get("status")?;
        let risk_level: Option<String> = row.try_get("risk_level")?;
        let location: serde_json::Value = row.try_get("location")?;

        Ok(Transaction {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind: TransactionKind::from_str(&kind)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            source_account: row.try_get("source_account")?,
            destination_account: row.try_get("destination_account")?,
            description: row.try_get("description")?,
            ip_address: row.try_get("ip_address")?,
            device_id: row.try_get("device_id")?,
            location: serde_json::from_value::<GeoLocation>(location)?,
            metadata: row.try_get("metadata")?,
            status: TransactionState::from_str(&status)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            risk_level: risk_level
                .map(|level| RiskLevel::from_str(&level))
                .transpose()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            flagged_by: row.try_get("flagged_by")?,
            flag_reason: row.try_get("flag_reason")?,
            reviewed_by: row.try_get("reviewed_by")?,
            review_notes: row.try_get("review_notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_decision(row: &PgRow) -> StoreResult<DecisionRecord> {
        let risk_level: String = row.try_get("risk_level")?;
        let action: String = row.try_get("action")?;
        let indicators: serde_json::Value = row.try_get("indicators")?;

        Ok(DecisionRecord {
            transaction_id: row.try_get("transaction_id")?,
            fraud_score: row.try_get("fraud_score")?,
            anomaly_score: row.try_get("anomaly_score")?,
            risk_score: row.try_get("risk_score")?,
            risk_level: RiskLevel::from_str(&risk_level)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            indicators: serde_json::from_value(indicators)?,
            action: Action::from_str(&action)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_profile(row: &PgRow) -> StoreResult<UserProfile> {
        let usual_ips: serde_json::Value = row.try_get("usual_ips")?;
        let usual_devices: serde_json::Value = row.try_get("usual_devices")?;
        let usual_locations: serde_json::Value = row.try_get("usual_locations")?;

        Ok(UserProfile {
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            last_seen: row.try_get("last_seen")?,
            usual_ips: serde_json::from_value::<UsualSet<String>>(usual_ips)?,
            usual_devices: serde_json::from_value::<UsualSet<String>>(usual_devices)?,
            usual_locations: serde_json::from_value(usual_locations)?,
            avg_amount: row.try_get("avg_amount")?,
            frequency: row.try_get("frequency")?,
            risk_score: row.try_get("risk_score")?,
        })
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<UserProfile> {
        let row = sqlx::query(
            r#"
            SELECT user_id, created_at, last_seen, usual_ips, usual_devices,
                   usual_locations, avg_amount, frequency, risk_score
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_profile(&row),
            None => Err(StoreError::NotFound(format!("profile for user {}", user_id))),
        }
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, created_at, last_seen, usual_ips, usual_devices,
                usual_locations, avg_amount, frequency, risk_score
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                last_seen = EXCLUDED.last_seen,
                usual_ips = EXCLUDED.usual_ips,
                usual_devices = EXCLUDED.usual_devices,
                usual_locations = EXCLUDED.usual_locations,
                avg_amount = EXCLUDED.avg_amount,
                frequency = EXCLUDED.frequency,
                risk_score = EXCLUDED.risk_score
            "#,
        )
        .bind(profile.user_id)
        .bind(profile.created_at)
        .bind(profile.last_seen)
        .bind(serde_json::to_value(&profile.usual_ips)?)
        .bind(serde_json::to_value(&profile.usual_devices)?)
        .bind(serde_json::to_value(&profile.usual_locations)?)
        .bind(profile.avg_amount)
        .bind(profile.frequency)
        .bind(profile.risk_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_recent_transactions(
        &self,
        user_id: Uuid,
        window: Duration,
        cap: usize,
    ) -> StoreResult<Vec<Transaction>> {
        let cutoff: DateTime<Utc> = Utc::now() - window;
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND created_at > $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn get_transaction(&self, id: Uuid) -> StoreResult<Transaction> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_transaction(&row),
            None => Err(StoreError::NotFound(format!("transaction {}", id))),
        }
    }

    async fn insert_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, type, status, amount, currency,
                source_account, destination_account, description,
                ip_address, device_id, location, metadata, risk_level,
                flagged_by, flag_reason, reviewed_by, review_notes,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                      $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(tx.id)
        .bind(tx.user_id)
        .bind(tx.kind.to_string())
        .bind(tx.status.to_string())
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(tx.source_account.as_deref())
        .bind(tx.destination_account.as_deref())
        .bind(tx.description.as_deref())
        .bind(&tx.ip_address)
        .bind(&tx.device_id)
        .bind(serde_json::to_value(&tx.location)?)
        .bind(tx.metadata.as_ref())
        .bind(tx.risk_level.map(|level| level.to_string()))
        .bind(tx.flagged_by.as_deref())
        .bind(tx.flag_reason.as_deref())
        .bind(tx.reviewed_by.as_deref())
        .bind(tx.review_notes.as_deref())
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("transaction {} already exists", tx.id))
            }
            _ => StoreError::from(err),
        })?;

        Ok(())
    }

    async fn update_transaction_state(
        &self,
        id: Uuid,
        update: StateUpdate,
    ) -> StoreResult<Transaction> {
        let mut db_tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                status = $3,
                risk_level = COALESCE(risk_level, $4),
                flagged_by = COALESCE($5, flagged_by),
                flag_reason = COALESCE($6, flag_reason),
                reviewed_by = COALESCE($7, reviewed_by),
                review_notes = COALESCE($8, review_notes),
                updated_at = $9
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(update.expected.to_string())
        .bind(update.new_state.to_string())
        .bind(update.risk_level.map(|level| level.to_string()))
        .bind(update.flagged_by.as_deref())
        .bind(update.flag_reason.as_deref())
        .bind(update.reviewed_by.as_deref())
        .bind(update.review_notes.as_deref())
        .bind(update.updated_at)
        .execute(&mut *db_tx)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost CAS race
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM transactions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *db_tx)
                    .await?;
            db_tx.rollback().await?;
            return match current {
                Some(status) => Err(StoreError::Conflict(format!(
                    "transaction {} is {} not {}",
                    id, status, update.expected
                ))),
                None => Err(StoreError::NotFound(format!("transaction {}", id))),
            };
        }

        let row = sqlx::query("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *db_tx)
            .await?;
        db_tx.commit().await?;

        Self::row_to_transaction(&row)
    }

    async fn insert_decision(&self, record: &DecisionRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions (
                transaction_id, fraud_score, anomaly_score, risk_score,
                risk_level, indicators, action, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.transaction_id)
        .bind(record.fraud_score)
        .bind(record.anomaly_score)
        .bind(record.risk_score)
        .bind(record.risk_level.to_string())
        .bind(serde_json::to_value(&record.indicators)?)
        .bind(record.action.to_string())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(format!(
                "decision for transaction {} already exists",
                record.transaction_id
            )),
            _ => StoreError::from(err),
        })?;

        Ok(())
    }

    async fn get_decision(&self, transaction_id: Uuid) -> StoreResult<DecisionRecord> {
        let row = sqlx::query("SELECT * FROM decisions WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_decision(&row),
            None => Err(StoreError::NotFound(format!(
                "decision for {}",
                transaction_id
            ))),
        }
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT * FROM transactions WHERE 1=1");

        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(kind) = filter.kind {
            builder.push(" AND type = ").push_bind(kind.to_string());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(risk_level) = filter.risk_level {
            builder
                .push(" AND risk_level = ")
                .push_bind(risk_level.to_string());
        }
        if let Some(from) = filter.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
        if let Some(min) = filter.min_amount {
            builder.push(" AND amount >= ").push_bind(min);
        }
        if let Some(max) = filter.max_amount {
            builder.push(" AND amount <= ").push_bind(max);
        }
        if let Some(ref currency) = filter.currency {
            builder.push(" AND currency = ").push_bind(currency.clone());
        }
        if filter.flagged_only == Some(true) {
            builder
                .push(" AND status = ")
                .push_bind(TransactionState::Flagged.to_string());
        }

        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn recent_decisions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<DecisionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT d.* FROM decisions d
            JOIN transactions t ON t.id = d.transaction_id
            WHERE t.user_id = $1
            ORDER BY d.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_decision).collect()
    }
}
