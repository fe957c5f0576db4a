//! Memoization layer for resolution decisions
//!
//! Provides:
//! - Versioned cache-key construction (fingerprints)
//! - A bounded LRU + TTL cache of selections with statistics tracking
//!
//! Caching here is a performance optimization, never a correctness
//! requirement: any cache malfunction bypasses the cache and the resolver
//! computes directly.

mod fingerprint;
mod resolution_cache;

pub use fingerprint::{fingerprint, subject_prefix, KeyStrategy, COARSE_FIELDS, FINGERPRINT_VERSION};
pub use resolution_cache::{
    CacheStats, EvictionObserver, EvictionReason, ResolutionCache, ResolutionCacheConfig,
};

use std::time::Duration;

/// Default TTL for cached selections (5 minutes)
pub const DEFAULT_RESOLUTION_TTL: Duration = Duration::from_secs(300);

/// Default capacity of the resolution cache
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
