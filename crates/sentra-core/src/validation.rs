//! Ingestion request validation
//!
//! Validation failures surface as `InvalidInput` and are never retried.

use crate::error::{CoreError, Result};
use crate::types::TransactionRequest;
use std::net::IpAddr;

/// Validate a transaction request before ingestion
pub fn validate_request(request: &TransactionRequest) -> Result<()> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "amount must be positive, got {}",
            request.amount
        )));
    }

    if !is_currency_code(&request.currency) {
        return Err(CoreError::InvalidInput(format!(
            "currency must be an ISO 4217 triplet, got {:?}",
            request.currency
        )));
    }

    if request.ip_address.parse::<IpAddr>().is_err() {
        return Err(CoreError::InvalidInput(format!(
            "malformed IP address {:?}",
            request.ip_address
        )));
    }

    if request.device_id.trim().is_empty() {
        return Err(CoreError::InvalidInput("device id is required".to_string()));
    }

    let location = &request.location;
    if !(-90.0..=90.0).contains(&location.latitude)
        || !(-180.0..=180.0).contains(&location.longitude)
    {
        return Err(CoreError::InvalidInput(format!(
            "malformed location ({}, {})",
            location.latitude, location.longitude
        )));
    }
    if !is_country_code(&location.country) {
        return Err(CoreError::InvalidInput(format!(
            "country must be an ISO 3166 alpha-2 code, got {:?}",
            location.country
        )));
    }

    Ok(())
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}
