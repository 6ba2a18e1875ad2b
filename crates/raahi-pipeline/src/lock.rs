use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Entries are swept once the map grows past this many phones.
const DEFAULT_EVICT_THRESHOLD: usize = 1024;

/// Keyed async mutex serializing turns for the same phone.
///
/// Waiters are served in the order they queued. Turns for different phones
/// never contend beyond the brief map lookup.
#[derive(Debug)]
pub struct TurnLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    evict_threshold: usize,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_EVICT_THRESHOLD)
    }

    pub fn with_threshold(evict_threshold: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            evict_threshold,
        }
    }

    /// Waits for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            if locks.len() >= self.evict_threshold {
                // Only the map holds an idle entry; holders and waiters own a clone.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of phones currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TurnLocks {
    fn default() -> Self {
        Self::new()
    }
}
