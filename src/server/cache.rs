//! In-memory cache of resolved links.
//!
//! Maps the `fileId` handed to clients onto the resolve result so a later
//! download can proxy the direct URL. Entries expire after a TTL and the map
//! never grows past its capacity.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::ResolveResult;

/// A cached value with expiration time.
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn get(&self) -> Option<T> {
        if self.is_expired() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// Bounded, time-expiring `fileId -> ResolveResult` map.
pub struct FileCache {
    entries: RwLock<HashMap<String, CacheEntry<ResolveResult>>>,
    ttl: Duration,
    capacity: usize,
}

impl FileCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Get a live entry, or None if expired/missing.
    pub fn get(&self, file_id: &str) -> Option<ResolveResult> {
        self.entries
            .read()
            .ok()
            .and_then(|guard| guard.get(file_id).and_then(|e| e.get()))
    }

    /// Store a result, pruning expired entries and evicting the oldest one
    /// when the cache is full.
    pub fn insert(&self, file_id: String, value: ResolveResult) {
        if let Ok(mut guard) = self.entries.write() {
            guard.retain(|_, entry| !entry.is_expired());

            while guard.len() >= self.capacity && !guard.contains_key(&file_id) {
                let oldest = guard
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        tracing::debug!("Evicting cached link {}", key);
                        guard.remove(&key);
                    }
                    None => break,
                }
            }

            guard.insert(file_id, CacheEntry::new(value, self.ttl));
        }
    }

    /// Number of entries currently held (expired ones included until pruned).
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
