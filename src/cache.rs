//! Per-key TTL cache shared by the permission resolvers.
//!
//! Each entry remembers when it was fetched. A lookup serves the entry while
//! it is younger than the TTL and otherwise calls the supplied fetch function,
//! stores the fresh value and restarts the window for that key.
//!
//! The map lock is never held while a fetch is running, so a slow upstream for
//! one key does not block lookups of other keys. Two callers racing on the same
//! stale key may both fetch; the later store wins.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};

/// Default TTL (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A stored value and the time it was fetched.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub fetched_at_millis: i64,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at_millis: self.fetched_at_millis,
        }
    }
}

/// Snapshot of cache occupancy for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStats {
    /// Number of keys with a stored entry (fresh or stale)
    pub key_count: usize,
    /// Sum of `ItemCount::item_count` over all stored values
    pub total_item_count: usize,
}

/// Values that can report how many items they hold, for `stats()`.
pub trait ItemCount {
    fn item_count(&self) -> usize;
}

impl<T> ItemCount for Vec<T> {
    fn item_count(&self) -> usize {
        self.len()
    }
}

/// Time-expiring memoization keyed by `K`.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create a cache that stamps entries with the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_millis,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis as u64)
    }

    /// Return the cached value for `key`, fetching it when missing or stale.
    ///
    /// A failed fetch stores nothing: any previous entry for `key` stays as it
    /// was, and the error goes back to this caller only.
    pub async fn get<F, Fut, E>(&self, key: &K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce(&K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.fresh(key).await {
            log::debug!("TtlCache: hit for {:?}", key);
            return Ok(value);
        }

        log::debug!("TtlCache: miss or stale for {:?}, fetching", key);
        let value = Arc::new(fetch(key).await?);
        let fetched_at_millis = self.clock.now_millis();

        self.entries.write().await.insert(
            key.clone(),
            CacheEntry {
                value: Arc::clone(&value),
                fetched_at_millis,
            },
        );

        Ok(value)
    }

    /// Look at the stored entry for `key` without checking freshness.
    pub async fn peek(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Drop every entry.
    pub async fn reset(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        log::info!("TtlCache: reset, dropped {} entries", dropped);
    }

    async fn fresh(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let age = self.clock.now_millis() - entry.fetched_at_millis;
        if age < self.ttl_millis {
            Some(Arc::clone(&entry.value))
        } else {
            None
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: ItemCount,
{
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        CacheStats {
            key_count: entries.len(),
            total_item_count: entries.values().map(|e| e.value.item_count()).sum(),
        }
    }
}
