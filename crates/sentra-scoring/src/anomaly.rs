//! Statistical anomaly scoring
//!
//! Weighted sum of five component scores, each in [0, 1], measuring
//! deviation of the current transaction from the user's own baseline.
//! Components that lack a baseline fall back to a neutral default and emit
//! no indicator.

use crate::behavior::{BehaviorSnapshot, MarketView};
use crate::features::FeatureView;
use crate::indicators;
use sentra_core::config::AnomalyWeights;
use sentra_core::types::{Transaction, TransactionKind};

/// Anomaly scorer output
#[derive(Debug, Clone)]
pub struct AnomalyAssessment {
    /// Weighted score in [0, 1]
    pub score: f64,
    /// Indicators for components scoring >= 0.5 against a real baseline
    pub indicators: Vec<String>,
}

/// Score a transaction's deviation from the user's behavioral baseline
pub fn score_anomaly(
    tx: &Transaction,
    features: &FeatureView,
    behavior: &BehaviorSnapshot,
    market: &MarketView,
    weights: &AnomalyWeights,
) -> AnomalyAssessment {
    let mut triggered = Vec::new();

    let (amount, amount_grounded) = amount_component(tx, features, behavior);
    if amount >= 0.5 && amount_grounded {
        triggered.push(indicators::UNUSUAL_AMOUNT.to_string());
    }

    let asset = asset_component(tx, behavior);
    if asset >= 0.5 {
        triggered.push(indicators::UNUSUAL_ASSET_CHOICE.to_string());
    }

    let timing = timing_component(features, behavior);
    if timing >= 0.5 {
        triggered.push(indicators::UNUSUAL_TIMING.to_string());
    }

    let market_score = market_component(tx, market);
    if market_score >= 0.5 {
        triggered.push(indicators::MARKET_CONTRARY.to_string());
    }

    let pattern = pattern_break_component(tx, behavior);
    if pattern >= 0.5 {
        triggered.push(indicators::PATTERN_BREAK.to_string());
    }

    let score = (amount * weights.amount
        + asset * weights.asset
        + timing * weights.timing
        + market_score * weights.market
        + pattern * weights.pattern)
        .clamp(0.0, 1.0);

    AnomalyAssessment {
        score,
        indicators: triggered,
    }
}

/// Amount deviation; returns (score, whether a baseline existed)
fn amount_component(
    tx: &Transaction,
    features: &FeatureView,
    behavior: &BehaviorSnapshot,
) -> (f64, bool) {
    if let Some(pattern) = behavior.patterns.get(&tx.kind) {
        if pattern.std_dev > 0.0 {
            let z = (tx.amount - pattern.mean).abs() / pattern.std_dev;
            return ((z / 3.0).min(1.0), true);
        }
    }

    // No usable pattern: compare against the per-kind or overall average
    let avg = behavior
        .patterns
        .get(&tx.kind)
        .map(|pattern| pattern.mean)
        .unwrap_or(features.avg_amount);
    if avg <= 0.0 {
        // No baseline at all
        return (0.5, false);
    }

    let ratio = tx.amount / avg;
    let score = if ratio > 5.0 {
        0.9
    } else if ratio > 2.0 {
        0.6
    } else if ratio < 0.2 {
        0.7
    } else {
        0.3
    };
    (score, true)
}

/// Unfamiliar asset type or sector, for investments only
fn asset_component(tx: &Transaction, behavior: &BehaviorSnapshot) -> f64 {
    if tx.kind != TransactionKind::Investment {
        return 0.0;
    }
    let Some(asset_type) = tx.asset_type() else {
        return 0.0;
    };

    let type_score = 1.0
        - behavior
            .asset_preferences
            .get(asset_type)
            .copied()
            .unwrap_or(0.0);
    let sector_score = 1.0
        - tx.asset_sector()
            .and_then(|sector| behavior.sector_preferences.get(sector))
            .copied()
            .unwrap_or(0.0);

    type_score * 0.6 + sector_score * 0.4
}

/// Transaction at an hour the user rarely transacts in
fn timing_component(features: &FeatureView, behavior: &BehaviorSnapshot) -> f64 {
    if behavior.history_len < 3 {
        return 0.3;
    }
    if features.hour_ratio < 0.05 {
        0.8
    } else if features.hour_ratio < 0.10 {
        0.5
    } else {
        0.2
    }
}

/// Trading against the direction of the sector, for investments and sales
fn market_component(tx: &Transaction, market: &MarketView) -> f64 {
    if tx.kind != TransactionKind::Investment && tx.kind != TransactionKind::Sale {
        return 0.0;
    }

    let performance = tx
        .asset_sector()
        .and_then(|sector| market.sector_performance.get(sector));
    let Some(&performance) = performance else {
        return 0.3;
    };

    match tx.kind {
        // Buying into a declining sector
        TransactionKind::Investment => {
            if performance < -0.05 {
                0.8
            } else if performance < -0.02 {
                0.5
            } else {
                0.2
            }
        }
        // Selling out of a rising sector
        TransactionKind::Sale => {
            if performance > 0.05 {
                0.8
            } else if performance > 0.02 {
                0.5
            } else {
                0.2
            }
        }
        _ => unreachable!(),
    }
}

/// Break from the user's established sequence patterns
fn pattern_break_component(tx: &Transaction, behavior: &BehaviorSnapshot) -> f64 {
    if behavior.history_len < 5 {
        return 0.3;
    }

    let mut score: f64 = 0.2;

    if tx.kind == TransactionKind::Withdrawal {
        if behavior.withdrawals_24h >= 3 {
            score = score.max(0.9);
        } else if behavior.withdrawals_24h >= 2 {
            score = score.max(0.6);
        }
    }

    if let Some(pattern) = behavior.patterns.get(&tx.kind) {
        if pattern.mean > 0.0 {
            if tx.amount >= pattern.mean * 3.0 {
                score = score.max(0.8);
            } else if tx.amount >= pattern.mean * 2.0 {
                score = score.max(0.5);
            }
        }
    }

    score
}
