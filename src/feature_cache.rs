//! Time-bounded storage for feature records.
//!
//! [`InMemoryFeatureCache`] is the default implementation. It is `Sync` and replaces whole
//! records on write, so concurrent evaluations never observe a partially updated record.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::FeatureRecord;

/// Key-value storage from feature key to [`FeatureRecord`] with per-entry time-to-live.
///
/// Implementations must be safe to call from multiple threads. An unreadable entry should be
/// reported as absent.
pub trait FeatureCache {
    /// Get a record that is present and not expired.
    fn get(&self, key: &str) -> Option<Arc<FeatureRecord>>;

    /// Insert or replace the record stored under `key`, expiring it after `ttl`.
    fn set(&self, key: &str, record: Arc<FeatureRecord>, ttl: Duration);
}

struct CacheEntry {
    record: Arc<FeatureRecord>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-process [`FeatureCache`] with lazy expiration. There is no capacity bound.
#[derive(Default)]
pub struct InMemoryFeatureCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryFeatureCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        InMemoryFeatureCache::default()
    }

    /// Number of stored entries, including expired ones that have not been read since.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub(crate) fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<FeatureRecord>> {
        {
            // A poisoned lock is treated as a cache miss.
            let entries = self.entries.read().ok()?;
            let entry = entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.record.clone());
            }
        }

        let mut entries = self.entries.write().ok()?;
        // Another thread might have refreshed the entry while the lock was released.
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    pub(crate) fn set_at(&self, key: &str, record: Arc<FeatureRecord>, ttl: Duration, now: DateTime<Utc>) {
        if ttl.is_zero() {
            return;
        }

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        // Constructing new value before requesting the lock to minimize lock span.
        let entry = CacheEntry { record, expires_at };

        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_owned(), entry);
            }
            Err(_) => {
                log::warn!(target: "featureswitches", feature_key = key; "feature cache lock is poisoned, dropping write");
            }
        }
    }
}

impl FeatureCache for InMemoryFeatureCache {
    fn get(&self, key: &str) -> Option<Arc<FeatureRecord>> {
        self.get_at(key, Utc::now())
    }

    fn set(&self, key: &str, record: Arc<FeatureRecord>, ttl: Duration) {
        self.set_at(key, record, ttl, Utc::now())
    }
}
