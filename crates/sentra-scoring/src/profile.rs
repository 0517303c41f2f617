//! Profile update math
//!
//! Merges a scored transaction back into the user's behavioral profile.
//! Pure computation; the runtime persists the result best-effort.

use chrono::{DateTime, Utc};
use sentra_core::config::ProfileSettings;
use sentra_core::types::{GeoPoint, Transaction, UserProfile};

/// Merge a scored transaction into the profile
///
/// `count_24h` is the number of prior transactions in the trailing 24h
/// window, excluding the one being absorbed.
pub fn absorb(
    profile: &mut UserProfile,
    tx: &Transaction,
    fraud_score: f64,
    count_24h: usize,
    settings: &ProfileSettings,
    now: DateTime<Utc>,
) {
    let capacity = settings.usual_set_capacity;
    let alpha = settings.blend_alpha;
    let tolerance = settings.geo_tolerance_deg;

    profile
        .usual_ips
        .observe(tx.ip_address.clone(), capacity);
    profile
        .usual_devices
        .observe(tx.device_id.clone(), capacity);
    profile.usual_locations.observe_by(
        GeoPoint {
            lat: tx.location.latitude,
            lng: tx.location.longitude,
        },
        capacity,
        |a, b| a.close_to(b, tolerance),
    );

    profile.avg_amount = Some(match profile.avg_amount {
        Some(avg) => avg * (1.0 - alpha) + tx.amount * alpha,
        None => tx.amount,
    });

    profile.risk_score =
        (profile.risk_score * (1.0 - alpha) + fraud_score * alpha).clamp(0.0, 1.0);

    profile.frequency = (count_24h + 1) as f64;
    profile.last_seen = now;
}
