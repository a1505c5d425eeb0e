//! Bounded, time-boxed in-memory cache.
//!
//! Entries older than `max_age` read as absent and are dropped on that read.
//! When a new key would push the population past `capacity`, the entry with
//! the oldest insert time is evicted first. Overwriting a key never evicts.
//!
//! Uses `DashMap` so a fetcher can be shared across tasks; there is no
//! request coalescing, so concurrent misses on one key each go upstream.
//! Writers are serialised so the capacity check, eviction and insert act as
//! one step.

use common::config::CacheConfig;
use dashmap::DashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Deterministic key for a memoised query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for location analytics: `"{lat},{lng},{radius}"`.
    pub fn analytics(lat: f64, lng: f64, radius: f64) -> Self {
        Self(format!("{lat},{lng},{radius}"))
    }

    /// Key for a business-type search: `"search_{lat},{lng},{radius},{type}"`.
    pub fn search(lat: f64, lng: f64, radius: f64, business_type: &str) -> Self {
        Self(format!("search_{lat},{lng},{radius},{business_type}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct TimedCache<V> {
    entries: DashMap<CacheKey, CacheEntry<V>>,
    capacity: usize,
    max_age: Duration,
    write_lock: Mutex<()>,
}

impl<V: Clone> TimedCache<V> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            max_age,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.max_age())
    }

    /// Clone of the value if it is no older than `max_age`.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        {
            let entry = self.entries.get(key)?;
            if entry.inserted_at.elapsed() <= self.max_age {
                debug!("Cache hit for {}", key);
                return Some(entry.value.clone());
            }
        }

        debug!("Cache entry for {} expired", key);
        // Re-check under the write lock; another task may have refreshed it.
        self.entries
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() > self.max_age);
        None
    }

    pub fn set(&self, key: CacheKey, value: V) {
        // The guarded data is `()`, so a poisoned lock is still usable.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                debug!("Cache full ({}); evicting {}", self.capacity, key);
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
