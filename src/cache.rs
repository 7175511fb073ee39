//! Response cache service
//!
//! Caches are passed explicitly to the components that use them; nothing in
//! the crate keeps a global cache.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Default lifetime of a cached entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default number of entries kept before the least recently used is evicted
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(255);

/// A keyed cache with per-entry expiry
pub trait ResponseCache<V>: Send + Sync {
    /// Look up a live entry
    fn get(&self, key: &str) -> Option<V>;

    /// Store a value for `ttl`
    fn insert(&self, key: &str, value: V, ttl: Duration);

    /// Remove an entry, returning whether one was present
    fn invalidate(&self, key: &str) -> bool;

    /// Remove every entry
    fn clear(&self);
}

struct Entry<V> {
    value: V,
    /// `None` when the ttl reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-process LRU cache with per-entry expiry
pub struct MemoryCache<V> {
    entries: Mutex<LruCache<String, Entry<V>>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<V> MemoryCache<V> {
    /// Create an empty cache holding up to [`DEFAULT_CAPACITY`] entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding up to `capacity` entries
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored entries, expired ones included until they are read or purged
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = self.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }
}

impl<V: Clone + Send> ResponseCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(key, "Cache entry expired");
            entries.pop(key);
        }
        None
    }

    fn insert(&self, key: &str, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        if let Some((evicted, _)) = self.lock().push(key.to_string(), entry) {
            if evicted != key {
                trace!(key = %evicted, "Cache entry evicted");
            }
        }
    }

    fn invalidate(&self, key: &str) -> bool {
        self.lock().pop(key).is_some()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}
