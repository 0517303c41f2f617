//! Stable indicator tags carried on decision records

// Fraud rules
pub const HIGH_AMOUNT: &str = "HIGH_AMOUNT";
pub const MULTIPLE_RECENT: &str = "MULTIPLE_RECENT";
pub const FOREIGN_LOCATION: &str = "FOREIGN_LOCATION";
pub const NEW_DEVICE: &str = "NEW_DEVICE";
pub const NEW_IP: &str = "NEW_IP";

// Anomaly components
pub const UNUSUAL_AMOUNT: &str = "UNUSUAL_AMOUNT";
pub const UNUSUAL_ASSET_CHOICE: &str = "UNUSUAL_ASSET_CHOICE";
pub const UNUSUAL_TIMING: &str = "UNUSUAL_TIMING";
pub const MARKET_CONTRARY: &str = "MARKET_CONTRARY";
pub const PATTERN_BREAK: &str = "PATTERN_BREAK";
