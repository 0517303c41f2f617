//! Sentra Scoring - pure scoring core
//!
//! Everything in this crate is a deterministic function of its inputs: no
//! I/O, no suspension points. Missing inputs degrade to neutral defaults so
//! the scoring path itself never fails; only the store, validation, and the
//! lifecycle state machine produce errors.

pub mod anomaly;
pub mod behavior;
pub mod features;
pub mod fraud;
pub mod fuse;
pub mod indicators;
pub mod profile;

pub use anomaly::{score_anomaly, AnomalyAssessment};
pub use behavior::{BehaviorSnapshot, MarketView, Pattern};
pub use features::FeatureView;
pub use fraud::{score_fraud, FraudAssessment};
pub use fuse::{fuse, Verdict};
