//! Sentra Core - Core types and definitions for the Sentra AML decisioning engine
//!
//! This crate provides the fundamental types used across the Sentra workspace:
//! - Transaction, profile, and decision data model
//! - Request validation
//! - Error taxonomy
//! - Immutable engine configuration

pub mod config;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use types::{
    Action, DecisionRecord, GeoLocation, GeoPoint, RiskLevel, Transaction, TransactionFilter,
    TransactionKind, TransactionRequest, TransactionState, UserProfile, UserRiskSummary, UsualSet,
};
