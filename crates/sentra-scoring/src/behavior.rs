//! Behavioral statistics derived from transaction history
//!
//! A `BehaviorSnapshot` is rebuilt from the recent-history window on every
//! ingest; it is never independently authoritative.

use chrono::{DateTime, Duration, Timelike, Utc};
use sentra_core::types::{Transaction, TransactionKind};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Amount statistics for one transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pattern {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Sector-performance reference data
///
/// Neutral (empty) by default; when absent the market-contrary anomaly
/// component degrades to its no-data bucket.
#[derive(Debug, Clone, Default)]
pub struct MarketView {
    /// Relative performance per sector, e.g. -0.08 for a strongly
    /// declining sector
    pub sector_performance: HashMap<String, f64>,
}

/// Per-user behavioral statistics over the recent window
#[derive(Debug, Clone)]
pub struct BehaviorSnapshot {
    pub user_id: Uuid,
    pub history_len: usize,
    /// Amount statistics per transaction kind
    pub patterns: HashMap<TransactionKind, Pattern>,
    /// Share of investment history per asset type
    pub asset_preferences: HashMap<String, f64>,
    /// Share of investment history per sector
    pub sector_preferences: HashMap<String, f64>,
    /// Transactions per hour of day
    pub hour_counts: [usize; 24],
    /// Withdrawals in the trailing 24h
    pub withdrawals_24h: usize,
}

impl BehaviorSnapshot {
    /// Build a snapshot from the recent window, newest first
    ///
    /// `short_window` bounds the burst counters (withdrawals), 24h by
    /// default.
    pub fn build(
        user_id: Uuid,
        history: &[Transaction],
        short_window: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_kind: HashMap<TransactionKind, Vec<f64>> = HashMap::new();
        let mut hour_counts = [0usize; 24];
        let mut asset_counts: HashMap<String, usize> = HashMap::new();
        let mut sector_counts: HashMap<String, usize> = HashMap::new();
        let mut investment_count = 0usize;
        let mut withdrawals_24h = 0usize;
        let day_ago = now - short_window;

        for tx in history {
            by_kind.entry(tx.kind).or_default().push(tx.amount);
            hour_counts[tx.created_at.hour() as usize] += 1;

            if tx.kind == TransactionKind::Withdrawal && tx.created_at > day_ago {
                withdrawals_24h += 1;
            }

            if tx.kind == TransactionKind::Investment {
                if let Some(asset_type) = tx.asset_type() {
                    *asset_counts.entry(asset_type.to_string()).or_default() += 1;
                    if let Some(sector) = tx.asset_sector() {
                        *sector_counts.entry(sector.to_string()).or_default() += 1;
                    }
                    investment_count += 1;
                }
            }
        }

        let patterns = by_kind
            .into_iter()
            .map(|(kind, amounts)| (kind, Pattern::from_amounts(&amounts)))
            .collect();

        let mut asset_preferences = HashMap::new();
        let mut sector_preferences = HashMap::new();
        if investment_count > 0 {
            for (asset_type, count) in asset_counts {
                asset_preferences.insert(asset_type, count as f64 / investment_count as f64);
            }
            for (sector, count) in sector_counts {
                sector_preferences.insert(sector, count as f64 / investment_count as f64);
            }
        }

        Self {
            user_id,
            history_len: history.len(),
            patterns,
            asset_preferences,
            sector_preferences,
            hour_counts,
            withdrawals_24h,
        }
    }

    /// Share of historical transactions falling in the given hour of day
    pub fn hour_ratio(&self, hour: usize) -> f64 {
        if self.history_len == 0 {
            return 0.0;
        }
        self.hour_counts[hour % 24] as f64 / self.history_len as f64
    }
}

impl Pattern {
    fn from_amounts(amounts: &[f64]) -> Self {
        let count = amounts.len();
        let mean = amounts.iter().sum::<f64>() / count as f64;
        let variance = amounts
            .iter()
            .map(|amount| (amount - mean) * (amount - mean))
            .sum::<f64>()
            / count as f64;
        let std_dev = variance.sqrt();
        let min = amounts.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            count,
            mean,
            std_dev,
            min,
            max,
        }
    }
}
