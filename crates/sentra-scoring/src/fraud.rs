//! Rule-weighted fraud scoring
//!
//! Additive risk from static signals, clamped to [0, 1]. Each triggered rule
//! contributes its configured weight and emits a stable indicator tag.

use crate::features::FeatureView;
use crate::indicators;
use sentra_core::config::FraudRules;
use sentra_core::types::RiskLevel;

/// Fraud scorer output
#[derive(Debug, Clone)]
pub struct FraudAssessment {
    /// Rule-weighted score in [0, 1]
    pub score: f64,
    /// The scorer's own level mapping of the score
    pub level: RiskLevel,
    /// Operational guidance attached to the level
    pub guidance: &'static str,
    /// Indicators for the rules that fired, in rule order
    pub indicators: Vec<String>,
}

/// Score a transaction's static fraud signals
pub fn score_fraud(features: &FeatureView, country: &str, rules: &FraudRules) -> FraudAssessment {
    let mut score = 0.0;
    let mut triggered = Vec::new();

    if features.amount > rules.amount_high {
        score += rules.amount_high_weight;
        triggered.push(indicators::HIGH_AMOUNT.to_string());
    }

    if features.count_24h >= rules.velocity_threshold {
        score += rules.velocity_weight;
        triggered.push(indicators::MULTIPLE_RECENT.to_string());
    }

    if !rules.allowed_countries.iter().any(|c| c == country) {
        score += rules.foreign_location_weight;
        triggered.push(indicators::FOREIGN_LOCATION.to_string());
    }

    if features.device_mismatch {
        score += rules.new_device_weight;
        triggered.push(indicators::NEW_DEVICE.to_string());
    }

    if features.ip_mismatch {
        score += rules.new_ip_weight;
        triggered.push(indicators::NEW_IP.to_string());
    }

    let score = score.clamp(0.0, 1.0);
    let (level, guidance) = if score >= rules.level_critical {
        (RiskLevel::Critical, "manual review")
    } else if score >= rules.level_high {
        (RiskLevel::High, "enhanced due diligence")
    } else if score >= rules.level_medium {
        (RiskLevel::Medium, "standard review")
    } else {
        (RiskLevel::Low, "no action")
    };

    FraudAssessment {
        score,
        level,
        guidance,
        indicators: triggered,
    }
}
