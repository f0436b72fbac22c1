//! Per-key async mutexes
//!
//! A key's entry exists only while some task holds or waits for it, so
//! the map stays bounded by the number of in-flight operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct KeyedLocks {
    locks: LockMap,
}

/// Held lock on one key. Dropping it releases the lock and forgets the
/// key when nobody else is queued on it.
pub struct KeyedGuard<'a> {
    locks: &'a LockMap,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        // Built before awaiting so a cancelled wait still cleans up.
        let mut held = KeyedGuard {
            locks: &self.locks,
            key: key.to_string(),
            guard: None,
        };
        let mutex = self.locks.entry(key.to_string()).or_default().clone();
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Lock several keys in sorted order. Duplicates are locked once.
    pub async fn lock_all(&self, keys: &[&str]) -> Vec<KeyedGuard<'_>> {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.lock(key).await);
        }
        guards
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
