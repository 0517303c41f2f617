//! Decision fusion
//!
//! Combines the fraud and anomaly scores into the transaction's risk level
//! and action directive. This is the seam where a model-backed scorer would
//! plug in: anything that produces the same pair of scores can feed it.

use sentra_core::config::{FuseWeights, RiskThresholds};
use sentra_core::types::{Action, RiskLevel};

/// Fused scoring verdict
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    /// Overall score in [0, 1]
    pub score: f64,
    pub level: RiskLevel,
    pub action: Action,
}

/// Fuse fraud and anomaly scores into a risk level and action
pub fn fuse(
    fraud_score: f64,
    anomaly_score: f64,
    weights: &FuseWeights,
    thresholds: &RiskThresholds,
) -> Verdict {
    let score = (fraud_score * weights.fraud + anomaly_score * weights.anomaly).clamp(0.0, 1.0);

    let (level, action) = if score < thresholds.low {
        (RiskLevel::Low, Action::Approve)
    } else if score < thresholds.medium {
        (RiskLevel::Medium, Action::Review)
    } else if score < thresholds.high {
        (RiskLevel::High, Action::Review)
    } else {
        (RiskLevel::Critical, Action::Reject)
    };

    Verdict {
        score,
        level,
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuse_default(fraud: f64, anomaly: f64) -> Verdict {
        fuse(
            fraud,
            anomaly,
            &FuseWeights::default(),
            &RiskThresholds::default(),
        )
    }

    #[test]
    fn test_weighted_combination() {
        let verdict = fuse_default(0.5, 0.25);
        assert!((verdict.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_low_approve() {
        let verdict = fuse_default(0.1, 0.2);
        assert_eq!(verdict.level, RiskLevel::Low);
        assert_eq!(verdict.action, Action::Approve);
    }

    #[test]
    fn test_medium_review() {
        let verdict = fuse_default(0.5, 0.3);
        assert_eq!(verdict.level, RiskLevel::Medium);
        assert_eq!(verdict.action, Action::Review);
    }

    #[test]
    fn test_high_review() {
        let verdict = fuse_default(0.9, 0.3);
        assert_eq!(verdict.level, RiskLevel::High);
        assert_eq!(verdict.action, Action::Review);
    }

    #[test]
    fn test_critical_reject() {
        let verdict = fuse_default(1.0, 0.8);
        assert_eq!(verdict.level, RiskLevel::Critical);
        assert_eq!(verdict.action, Action::Reject);
    }

    #[test]
    fn test_boundaries() {
        // exactly at a threshold falls into the bucket above it
        assert_eq!(fuse_default(0.5, 0.0).level, RiskLevel::Medium);
        assert_eq!(fuse_default(1.0, 0.5).level, RiskLevel::Critical);
    }

    #[test]
    fn test_monotone_in_fraud_score() {
        let mut last = 0.0;
        for i in 0..=10 {
            let fraud = i as f64 / 10.0;
            let verdict = fuse_default(fraud, 0.3);
            assert!(verdict.score >= last);
            last = verdict.score;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RiskThresholds {
            low: 0.1,
            medium: 0.2,
            high: 0.3,
        };
        let verdict = fuse(0.5, 0.5, &FuseWeights::default(), &thresholds);
        assert_eq!(verdict.level, RiskLevel::Critical);
        assert_eq!(verdict.action, Action::Reject);
    }
}
