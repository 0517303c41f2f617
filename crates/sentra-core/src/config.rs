//! Engine configuration
//!
//! Loaded once at startup into an immutable record and threaded explicitly
//! through the pipeline; changes require a process restart.

use serde::{Deserialize, Serialize};

/// Weights for the five anomaly components; expected to sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyWeights {
    #[serde(default = "default_amount_weight")]
    pub amount: f64,
    #[serde(default = "default_asset_weight")]
    pub asset: f64,
    #[serde(default = "default_timing_weight")]
    pub timing: f64,
    #[serde(default = "default_market_weight")]
    pub market: f64,
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,
}

fn default_amount_weight() -> f64 {
    0.30
}
fn default_asset_weight() -> f64 {
    0.25
}
fn default_timing_weight() -> f64 {
    0.20
}
fn default_market_weight() -> f64 {
    0.15
}
fn default_pattern_weight() -> f64 {
    0.10
}

impl Default for AnomalyWeights {
    fn default() -> Self {
        Self {
            amount: default_amount_weight(),
            asset: default_asset_weight(),
            timing: default_timing_weight(),
            market: default_market_weight(),
            pattern: default_pattern_weight(),
        }
    }
}

/// Fusion weights for combining fraud and anomaly scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuseWeights {
    #[serde(default = "default_fraud_weight")]
    pub fraud: f64,
    #[serde(default = "default_anomaly_weight")]
    pub anomaly: f64,
}

fn default_fraud_weight() -> f64 {
    0.6
}
fn default_anomaly_weight() -> f64 {
    0.4
}

impl Default for FuseWeights {
    fn default() -> Self {
        Self {
            fraud: default_fraud_weight(),
            anomaly: default_anomaly_weight(),
        }
    }
}

/// Fused-score thresholds separating the risk buckets
///
/// score < low => LOW/APPROVE; < medium => MEDIUM/REVIEW;
/// < high => HIGH/REVIEW; >= high => CRITICAL/REJECT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_low_threshold")]
    pub low: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
    #[serde(default = "default_high_threshold")]
    pub high: f64,
}

fn default_low_threshold() -> f64 {
    0.3
}
fn default_medium_threshold() -> f64 {
    0.6
}
fn default_high_threshold() -> f64 {
    0.8
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: default_low_threshold(),
            medium: default_medium_threshold(),
            high: default_high_threshold(),
        }
    }
}

/// Rule weights and limits for the fraud scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRules {
    /// Amount above which HIGH_AMOUNT triggers
    #[serde(default = "default_amount_high")]
    pub amount_high: f64,
    #[serde(default = "default_amount_high_weight")]
    pub amount_high_weight: f64,
    /// Rolling window for velocity counting, in hours
    #[serde(default = "default_velocity_window_hours")]
    pub velocity_window_hours: i64,
    /// Transaction count at which MULTIPLE_RECENT triggers
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: usize,
    #[serde(default = "default_velocity_weight")]
    pub velocity_weight: f64,
    #[serde(default = "default_allowed_countries")]
    pub allowed_countries: Vec<String>,
    #[serde(default = "default_foreign_location_weight")]
    pub foreign_location_weight: f64,
    #[serde(default = "default_new_device_weight")]
    pub new_device_weight: f64,
    #[serde(default = "default_new_ip_weight")]
    pub new_ip_weight: f64,
    /// Fraud-score cutoffs for the scorer's own level mapping
    #[serde(default = "default_fraud_level_medium")]
    pub level_medium: f64,
    #[serde(default = "default_fraud_level_high")]
    pub level_high: f64,
    #[serde(default = "default_fraud_level_critical")]
    pub level_critical: f64,
}

fn default_amount_high() -> f64 {
    10_000.0
}
fn default_amount_high_weight() -> f64 {
    0.3
}
fn default_velocity_window_hours() -> i64 {
    24
}
fn default_velocity_threshold() -> usize {
    5
}
fn default_velocity_weight() -> f64 {
    0.2
}
fn default_allowed_countries() -> Vec<String> {
    vec!["US".to_string()]
}
fn default_foreign_location_weight() -> f64 {
    0.1
}
fn default_new_device_weight() -> f64 {
    0.15
}
fn default_new_ip_weight() -> f64 {
    0.10
}
fn default_fraud_level_medium() -> f64 {
    0.2
}
fn default_fraud_level_high() -> f64 {
    0.4
}
fn default_fraud_level_critical() -> f64 {
    0.6
}

impl Default for FraudRules {
    fn default() -> Self {
        Self {
            amount_high: default_amount_high(),
            amount_high_weight: default_amount_high_weight(),
            velocity_window_hours: default_velocity_window_hours(),
            velocity_threshold: default_velocity_threshold(),
            velocity_weight: default_velocity_weight(),
            allowed_countries: default_allowed_countries(),
            foreign_location_weight: default_foreign_location_weight(),
            new_device_weight: default_new_device_weight(),
            new_ip_weight: default_new_ip_weight(),
            level_medium: default_fraud_level_medium(),
            level_high: default_fraud_level_high(),
            level_critical: default_fraud_level_critical(),
        }
    }
}

/// Profile maintenance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Maximum entries kept in each usual-set
    #[serde(default = "default_usual_set_capacity")]
    pub usual_set_capacity: usize,
    /// Blend factor for the moving averages
    #[serde(default = "default_blend_alpha")]
    pub blend_alpha: f64,
    /// Tolerance, in degrees, for usual-location equality
    #[serde(default = "default_geo_tolerance_deg")]
    pub geo_tolerance_deg: f64,
}

fn default_usual_set_capacity() -> usize {
    20
}
fn default_blend_alpha() -> f64 {
    0.1
}
fn default_geo_tolerance_deg() -> f64 {
    0.1
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            usual_set_capacity: default_usual_set_capacity(),
            blend_alpha: default_blend_alpha(),
            geo_tolerance_deg: default_geo_tolerance_deg(),
        }
    }
}

/// Store deadlines and read bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Per-operation deadline, in milliseconds
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
    /// Whole-request deadline, in milliseconds
    #[serde(default = "default_total_timeout_ms")]
    pub total_timeout_ms: u64,
    /// Hard cap on recent-history reads
    #[serde(default = "default_recent_cap")]
    pub recent_cap: usize,
}

fn default_op_timeout_ms() -> u64 {
    2_000
}
fn default_total_timeout_ms() -> u64 {
    5_000
}
fn default_recent_cap() -> usize {
    500
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            op_timeout_ms: default_op_timeout_ms(),
            total_timeout_ms: default_total_timeout_ms(),
            recent_cap: default_recent_cap(),
        }
    }
}

/// History window defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryWindows {
    /// Short window, in hours (velocity and recent averages)
    #[serde(default = "default_short_hours")]
    pub short_hours: i64,
    /// Long window, in days (pattern statistics)
    #[serde(default = "default_long_days")]
    pub long_days: i64,
}

fn default_short_hours() -> i64 {
    24
}
fn default_long_days() -> i64 {
    7
}

impl Default for HistoryWindows {
    fn default() -> Self {
        Self {
            short_hours: default_short_hours(),
            long_days: default_long_days(),
        }
    }
}

/// Process-wide engine configuration, immutable after startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub anomaly_weights: AnomalyWeights,
    #[serde(default)]
    pub fuse_weights: FuseWeights,
    #[serde(default)]
    pub thresholds: RiskThresholds,
    #[serde(default)]
    pub fraud: FraudRules,
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub history: HistoryWindows,
    /// Serialize ingest per user id (on by default)
    #[serde(default = "default_serialize_per_user")]
    pub serialize_per_user: bool,
}

fn default_serialize_per_user() -> bool {
    true
}
