use std::collections::HashMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredEntry<T> {
    value: T,
    expires_at: Instant,
}

/// In-memory cache whose entries expire a fixed time after insertion.
///
/// Owned by whoever drives the refresh cycle; there is no global instance and
/// no manual invalidation.
#[derive(Debug)]
pub struct FixedWindowCache<T> {
    entries: HashMap<String, StoredEntry<T>>,
    ttl: Duration,
}

impl<T: Clone + Debug> FixedWindowCache<T> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a value that stays fresh for the cache's TTL.
    pub fn put(&mut self, key: &str, value: T) {
        self.put_at(key, value, Instant::now());
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    pub fn get(&mut self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, now))]
    fn put_at(&mut self, key: &str, value: T, now: Instant) {
        let expires_at = now + self.ttl;
        self.entries
            .insert(key.to_string(), StoredEntry { value, expires_at });
    }

    #[tracing::instrument(name = "query_cache", level = "debug", skip(self, now))]
    fn get_at(&mut self, key: &str, now: Instant) -> Option<T> {
        let Some(entry) = self.entries.get(key) else {
            tracing::debug!("Key not found");
            return None;
        };

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Some(entry.value.clone())
        } else {
            tracing::debug!("Key found but expired");
            self.entries.remove(key);
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
