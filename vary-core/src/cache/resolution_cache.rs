//! Resolution cache - memoizes selector outputs
//!
//! Bounded-capacity, least-recently-used, with an absolute per-entry TTL;
//! whichever triggers first removes an entry. Recency is stamped from a
//! global atomic tick so cache hits stay on the read lock.
//!
//! The cache must never make resolution fail: a poisoned lock silently
//! degrades to a bypass (every lookup misses, inserts are dropped) and the
//! resolver computes directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::context::Context;
use crate::variant::Selection;

use super::fingerprint::{fingerprint, subject_prefix, KeyStrategy};
use super::{DEFAULT_MAX_ENTRIES, DEFAULT_RESOLUTION_TTL};

/// Why an entry left the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// TTL elapsed
    Expired,
    /// Displaced as least-recently-used at capacity
    Capacity,
}

/// Observer invoked on eviction, for metrics
///
/// Called synchronously from the inserting caller's thread; observers must
/// return promptly and must not call back into the cache.
pub type EvictionObserver = Arc<dyn Fn(&str, EvictionReason) + Send + Sync>;

/// Configuration for the resolution cache
#[derive(Debug, Clone)]
pub struct ResolutionCacheConfig {
    /// TTL for cached selections
    pub default_ttl: Duration,
    /// Maximum number of entries
    pub max_entries: usize,
    /// Which context fields participate in cache keys
    pub key_strategy: KeyStrategy,
}

impl Default for ResolutionCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_RESOLUTION_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            key_strategy: KeyStrategy::default(),
        }
    }
}

impl ResolutionCacheConfig {
    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set max entries
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the key strategy
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }
}

/// A cached selection
#[derive(Debug)]
struct CachedSelection {
    selection: Selection,
    expires_at: Instant,
    /// Global tick at last access; drives LRU displacement
    last_used: AtomicU64,
}

impl CachedSelection {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Bounded LRU + TTL cache of selections
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CachedSelection>>,
    config: ResolutionCacheConfig,
    /// Monotonic access clock for LRU stamps
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    observer: Option<EvictionObserver>,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

impl ResolutionCache {
    /// Create a cache with default config
    pub fn new() -> Self {
        Self::with_config(ResolutionCacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: ResolutionCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            observer: None,
        }
    }

    /// Attach an eviction observer
    pub fn with_observer(mut self, observer: EvictionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configured key strategy
    pub fn key_strategy(&self) -> KeyStrategy {
        self.config.key_strategy
    }

    /// Look up a cached selection for (subject, generation, context)
    ///
    /// Returns the stored selection with `from_cache = true`. An expired
    /// entry is removed on the spot, counted as an eviction, and reported to
    /// the observer. A poisoned lock degrades to a miss.
    pub fn get(&self, subject_id: &str, generation: u64, ctx: &Context) -> Option<Selection> {
        let key = fingerprint(self.config.key_strategy, subject_id, generation, ctx);

        let found_expired = {
            let Ok(entries) = self.entries.read() else {
                return None;
            };

            match entries.get(&key) {
                Some(entry) if !entry.is_expired() => {
                    let tick = self.clock.fetch_add(1, Ordering::Relaxed);
                    entry.last_used.store(tick, Ordering::Relaxed);
                    self.hits.fetch_add(1, Ordering::Relaxed);

                    let mut selection = entry.selection.clone();
                    selection.from_cache = true;
                    return Some(selection);
                }
                Some(_) => true,
                None => false,
            }
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        if found_expired {
            self.reap_expired_key(&key);
        }
        None
    }

    /// Store a freshly computed selection
    ///
    /// Sweeps expired entries on every insert, then displaces the
    /// least-recently-used entry while still at capacity. A poisoned lock
    /// drops the insert.
    pub fn insert(&self, subject_id: &str, generation: u64, ctx: &Context, selection: &Selection) {
        let key = fingerprint(self.config.key_strategy, subject_id, generation, ctx);
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        self.evict_expired(&mut entries);

        if !entries.contains_key(&key) {
            while entries.len() >= self.config.max_entries {
                if !self.evict_lru(&mut entries) {
                    break;
                }
            }
        }

        let mut stored = selection.clone();
        stored.from_cache = false;

        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            key,
            CachedSelection {
                selection: stored,
                expires_at: Instant::now() + self.config.default_ttl,
                last_used: AtomicU64::new(tick),
            },
        );
    }

    /// Purge every entry derived from a subject
    pub fn invalidate_subject(&self, subject_id: &str) {
        let prefix = subject_prefix(subject_id);
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|k, _| !k.starts_with(&prefix));
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Remove one entry found expired during a lookup
    ///
    /// Takes the write lock after the read lock was released, so the entry is
    /// re-checked: another thread may have reaped or replaced it meanwhile.
    fn reap_expired_key(&self, key: &str) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        if entries.get(key).map_or(false, |e| e.is_expired()) {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            if let Some(observer) = &self.observer {
                observer(key, EvictionReason::Expired);
            }
        }
    }

    fn evict_expired(&self, entries: &mut HashMap<String, CachedSelection>) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone())
            .collect();

        for key in expired {
            entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            if let Some(observer) = &self.observer {
                observer(&key, EvictionReason::Expired);
            }
        }
    }

    fn evict_lru(&self, entries: &mut HashMap<String, CachedSelection>) -> bool {
        let lru_key = entries
            .iter()
            .min_by_key(|(_, v)| v.last_used.load(Ordering::Relaxed))
            .map(|(k, _)| k.clone());

        match lru_key {
            Some(key) => {
                entries.remove(&key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                if let Some(observer) = &self.observer {
                    observer(&key, EvictionReason::Capacity);
                }
                true
            }
            None => false,
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.len();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            entries,
            max_entries: self.config.max_entries,
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Maximum entries allowed
    pub max_entries: usize,
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
    /// Total evictions (capacity + TTL)
    pub evictions: u64,
}
