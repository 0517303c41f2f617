//! Per-transaction feature assembly
//!
//! A `FeatureView` is a pure function of the incoming transaction, the
//! user's current profile (if any), and the recent-history window. Empty
//! history yields neutral defaults: deviation 0, mismatch flags off until a
//! baseline exists, z-score absent.

use crate::behavior::BehaviorSnapshot;
use chrono::{DateTime, Duration, Timelike, Utc};
use sentra_core::types::{GeoPoint, Transaction, UserProfile};
use serde::Serialize;

/// Divisor floor for the deviation ratio
const DEVIATION_EPSILON: f64 = 1.0;

/// Fixed numeric feature set consumed by the scorers
#[derive(Debug, Clone, Serialize)]
pub struct FeatureView {
    /// Current transaction amount
    pub amount: f64,
    /// Average amount over the recent window; 0 when history is empty
    pub avg_amount: f64,
    /// (amount - avg) / max(avg, 1.0); 0 when history is empty
    pub deviation: f64,
    /// Transactions for this user in the trailing 24h, excluding the
    /// current one
    pub count_24h: usize,
    /// Country not within the usual-locations baseline
    pub country_mismatch: bool,
    /// Device id unseen in the profile
    pub device_mismatch: bool,
    /// IP address unseen in the profile
    pub ip_mismatch: bool,
    /// Share of historical transactions in the current hour of day
    pub hour_ratio: f64,
    /// Z-score against the per-kind pattern, when one exists
    pub kind_zscore: Option<f64>,
}

impl FeatureView {
    /// Assemble features for a transaction
    ///
    /// `history` is the recent window, newest first; the current transaction
    /// is excluded from all aggregates even if present in the slice.
    /// `velocity_window` is the rolling window behind `count_24h`, 24h by
    /// default.
    pub fn assemble(
        tx: &Transaction,
        profile: Option<&UserProfile>,
        history: &[Transaction],
        behavior: &BehaviorSnapshot,
        geo_tolerance_deg: f64,
        velocity_window: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let prior: Vec<&Transaction> = history.iter().filter(|t| t.id != tx.id).collect();

        let avg_amount = if prior.is_empty() {
            0.0
        } else {
            prior.iter().map(|t| t.amount).sum::<f64>() / prior.len() as f64
        };

        let deviation = if prior.is_empty() {
            0.0
        } else {
            (tx.amount - avg_amount) / avg_amount.max(DEVIATION_EPSILON)
        };

        let window_start = now - velocity_window;
        let count_24h = prior.iter().filter(|t| t.created_at > window_start).count();

        // Mismatch flags need a baseline: an empty usual-set means this is
        // the first observation, which itself defines the baseline.
        let (country_mismatch, device_mismatch, ip_mismatch) = match profile {
            Some(profile) => {
                let point = GeoPoint {
                    lat: tx.location.latitude,
                    lng: tx.location.longitude,
                };
                (
                    !profile.usual_locations.is_empty()
                        && !profile.knows_location(&point, geo_tolerance_deg),
                    !profile.usual_devices.is_empty()
                        && !profile.usual_devices.contains(&tx.device_id),
                    !profile.usual_ips.is_empty() && !profile.usual_ips.contains(&tx.ip_address),
                )
            }
            None => (false, false, false),
        };

        let hour_ratio = behavior.hour_ratio(tx.created_at.hour() as usize);

        let kind_zscore = behavior.patterns.get(&tx.kind).and_then(|pattern| {
            if pattern.std_dev > 0.0 {
                Some((tx.amount - pattern.mean).abs() / pattern.std_dev)
            } else {
                None
            }
        });

        Self {
            amount: tx.amount,
            avg_amount,
            deviation,
            count_24h,
            country_mismatch,
            device_mismatch,
            ip_mismatch,
            hour_ratio,
            kind_zscore,
        }
    }
}
