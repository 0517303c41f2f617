//! Per-user advisory locks
//!
//! Serializes the ingest path per user id so that, for a given user,
//! transactions are processed in acceptance order. Different users proceed
//! concurrently. In-process only; a multi-node deployment would move this
//! to the store's row locks.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-user async locks
pub struct UserLocks {
    locks: Mutex<HashMap<Uuid, std::sync::Arc<AsyncMutex<()>>>>,
    enabled: bool,
}

impl UserLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            enabled,
        }
    }

    /// Acquire the lock for a user; `None` when serialization is disabled
    pub async fn acquire(&self, user_id: Uuid) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = {
            let mut locks = self.locks.lock().expect("user lock registry poisoned");
            locks
                .entry(user_id)
                .or_insert_with(|| std::sync::Arc::new(AsyncMutex::new(())))
                .clone()
        };
        Some(lock.lock_owned().await)
    }
}
