//! User behavioral profile
//!
//! One profile per user, created lazily on the first transaction and updated
//! after every scored one. Usual-sets are the mismatch baseline for the
//! fraud scorer: bounded, deduplicated, recency-biased.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approximate geo-location kept in the usual-locations set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Equality within a tolerance, in degrees on both axes
    pub fn close_to(&self, other: &GeoPoint, tolerance_deg: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance_deg
            && (self.lng - other.lng).abs() <= tolerance_deg
    }
}

/// Bounded, deduplicated, recency-ordered set of observed values
///
/// Oldest entries sit at the front; re-observing a value refreshes its
/// recency. When capacity is exceeded the oldest entry is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsualSet<T> {
    items: Vec<T>,
}

impl<T> UsualSet<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Whether any entry satisfies the equivalence predicate
    pub fn contains_by<F>(&self, same: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        self.items.iter().any(same)
    }

    /// Record an observation under a custom equivalence predicate
    ///
    /// Returns true when the value was not previously present.
    pub fn observe_by<F>(&mut self, value: T, capacity: usize, same: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        if let Some(pos) = self.items.iter().position(|item| same(item, &value)) {
            // Refresh recency
            let existing = self.items.remove(pos);
            self.items.push(existing);
            return false;
        }
        self.items.push(value);
        while self.items.len() > capacity {
            self.items.remove(0);
        }
        true
    }
}

impl<T: PartialEq> UsualSet<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    /// Record an observation; returns true when newly added
    pub fn observe(&mut self, value: T, capacity: usize) -> bool {
        self.observe_by(value, capacity, |a, b| a == b)
    }
}

impl<T> From<Vec<T>> for UsualSet<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// User behavioral profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub usual_ips: UsualSet<String>,
    pub usual_devices: UsualSet<String>,
    pub usual_locations: UsualSet<GeoPoint>,
    /// Exponentially-weighted average amount; defined after the first
    /// observation
    pub avg_amount: Option<f64>,
    /// Transactions per rolling 24h window
    pub frequency: f64,
    /// Cumulative risk score, clamped to [0, 1]
    pub risk_score: f64,
}

impl UserProfile {
    /// Fresh profile for a user first seen at `now`
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            created_at: now,
            last_seen: now,
            usual_ips: UsualSet::new(),
            usual_devices: UsualSet::new(),
            usual_locations: UsualSet::new(),
            avg_amount: None,
            frequency: 0.0,
            risk_score: 0.0,
        }
    }

    /// Whether the location is within tolerance of any usual location
    pub fn knows_location(&self, point: &GeoPoint, tolerance_deg: f64) -> bool {
        self.usual_locations
            .contains_by(|known| known.close_to(point, tolerance_deg))
    }
}
