//! Resolver - the engine facade
//!
//! Owns the [`Registry`] and the [`ResolutionCache`] and wires the control
//! flow together: register variants → resolve(subject, context) → cache
//! check → selector on miss → memoize and return.
//!
//! The resolver is an explicit value with a controlled lifetime: construct it
//! once at process start and share it by reference. Every method takes
//! `&self`, so it is safe to call from many threads simultaneously.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStats, EvictionObserver, ResolutionCache, ResolutionCacheConfig};
use crate::context::Context;
use crate::error::{Result, VaryError};
use crate::registry::Registry;
use crate::selector::select;
use crate::variant::{RegistryEntry, Selection, Variant, VariantManifest};

/// Engine-level counters for observability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Resolution cache hits
    pub hits: u64,
    /// Resolution cache misses
    pub misses: u64,
    /// Cache evictions (capacity + TTL)
    pub evictions: u64,
    /// Registered subjects
    pub registered_subjects: usize,
    /// Current cache entry count
    pub cache_size: usize,
}

/// The variant resolution engine
#[derive(Debug)]
pub struct Resolver {
    registry: Registry,
    cache: ResolutionCache,
}

impl Resolver {
    /// Create a resolver with default cache configuration
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            cache: ResolutionCache::new(),
        }
    }

    /// Replace the cache configuration
    ///
    /// Call before registering subjects; it installs a fresh, empty cache.
    pub fn with_cache_config(mut self, config: ResolutionCacheConfig) -> Self {
        self.cache = ResolutionCache::with_config(config);
        self
    }

    /// Replace the cache configuration and attach an eviction observer
    pub fn with_cache_observer(
        mut self,
        config: ResolutionCacheConfig,
        observer: EvictionObserver,
    ) -> Self {
        self.cache = ResolutionCache::with_config(config).with_observer(observer);
        self
    }

    /// Register a subject's variant set, replacing any existing registration
    ///
    /// Validates that `default_variant` names one of `variants` (when the set
    /// is non-empty) before mutating any state. A resolve issued after this
    /// returns never sees a selection computed under the old registration:
    /// the install bumps the subject's generation, so cache lookups move to
    /// fresh keys (an in-flight resolve that computed under the old entry
    /// inserts under the old generation's key, which nothing reads anymore),
    /// and the purge reclaims the superseded entries.
    pub fn register_subject(
        &self,
        subject_id: &str,
        variants: Vec<Variant>,
        default_variant: &str,
    ) -> Result<()> {
        let entry = RegistryEntry::new(subject_id, variants, default_variant)?;
        self.registry.register(entry)?;
        self.cache.invalidate_subject(subject_id);
        Ok(())
    }

    /// Register every subject defined in a JSON manifest
    ///
    /// Returns the registered subject ids. Fails on the first invalid
    /// subject; subjects registered before the failure stay registered.
    pub fn load_manifest(&self, json: &str) -> Result<Vec<String>> {
        let manifest = VariantManifest::from_json(json)?;
        let mut registered = Vec::with_capacity(manifest.subjects.len());

        for subject in manifest.subjects {
            let entry = subject.into_entry()?;
            let subject_id = entry.subject_id().to_string();
            self.registry.register(entry)?;
            self.cache.invalidate_subject(&subject_id);
            registered.push(subject_id);
        }

        Ok(registered)
    }

    /// Resolve a subject against a context
    ///
    /// Cache hit: returns the memoized selection with `from_cache = true`.
    /// Miss: runs the selector over the registered variants, memoizes, and
    /// returns with `from_cache = false`. An unknown subject is a
    /// [`VaryError::SubjectNotFound`], distinct from the normal
    /// fell-through-to-default result.
    pub fn resolve(&self, subject_id: &str, ctx: &Context) -> Result<Selection> {
        let registration = self
            .registry
            .get(subject_id)
            .ok_or_else(|| VaryError::SubjectNotFound {
                subject_id: subject_id.to_string(),
            })?;

        // The generation read with the entry keys every cache operation of
        // this call, so a selection computed here can never surface through
        // a lookup made under a later registration.
        let generation = registration.generation();
        if let Some(hit) = self.cache.get(subject_id, generation, ctx) {
            return Ok(hit);
        }

        let selection = select(registration.entry(), ctx)?;
        self.cache.insert(subject_id, generation, ctx, &selection);
        Ok(selection)
    }

    /// Remove a subject; returns whether a registration existed
    ///
    /// The subject's cache entries are purged before this returns.
    pub fn unregister(&self, subject_id: &str) -> bool {
        let existed = self.registry.unregister(subject_id);
        self.cache.invalidate_subject(subject_id);
        existed
    }

    /// Manually purge a subject's cache entries
    ///
    /// Hook for collaborators that mutate variant payloads in place without
    /// a full re-registration.
    pub fn invalidate_cache(&self, subject_id: &str) {
        self.cache.invalidate_subject(subject_id);
    }

    /// Engine counters
    pub fn metrics(&self) -> Metrics {
        let stats = self.cache.stats();
        Metrics {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            registered_subjects: self.registry.len(),
            cache_size: stats.entries,
        }
    }

    /// Detailed cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The underlying registry (read access)
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
