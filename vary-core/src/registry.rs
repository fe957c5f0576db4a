//! Subject registry - owns subject → variant-set mappings
//!
//! The registry is an explicit value with a controlled lifetime: construct it
//! once (usually inside [`Resolver`](crate::Resolver)), share it by
//! reference. There is no hidden global.
//!
//! Registration is rare relative to lookup, so the map sits behind a
//! reader/writer lock and entries are shared as `Arc`s: a `get` clones a
//! pointer, not the variant set. Entries are replaced wholesale, so readers
//! observe either the old entry or the fully-installed new one, never a mix.
//!
//! Every install is stamped with a registry-wide monotonic generation. A
//! [`Registration`] carries the generation alongside the entry, so a caller
//! that computed something from the entry can later tell whether the
//! registration it read is still the current one. Cache keys include the
//! generation: a selection computed under a superseded registration lands
//! under a key no current-generation lookup reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{Result, VaryError};
use crate::variant::RegistryEntry;

/// A subject's current entry plus the generation it was installed under
#[derive(Debug, Clone)]
pub struct Registration {
    generation: u64,
    entry: Arc<RegistryEntry>,
}

impl Registration {
    /// The install generation; strictly increases across register calls
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The registered entry
    pub fn entry(&self) -> &Arc<RegistryEntry> {
        &self.entry
    }
}

/// Thread-safe subject → variant-set registry
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Registration>>,
    generations: AtomicU64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an entry, replacing any existing entry for the same subject
    ///
    /// The install gets a fresh generation, even when re-registering a
    /// subject that was unregistered in between.
    pub fn register(&self, entry: RegistryEntry) -> Result<()> {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.entries.write().map_err(|_| VaryError::RegistryLocked)?;
        entries.insert(
            entry.subject_id().to_string(),
            Registration {
                generation,
                entry: Arc::new(entry),
            },
        );
        Ok(())
    }

    /// Remove a subject's entry; returns whether one existed
    pub fn unregister(&self, subject_id: &str) -> bool {
        match self.entries.write() {
            Ok(mut entries) => entries.remove(subject_id).is_some(),
            Err(_) => false,
        }
    }

    /// Pure read of a subject's current registration
    pub fn get(&self, subject_id: &str) -> Option<Registration> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(subject_id).cloned())
    }

    /// Check whether a subject is registered
    pub fn contains(&self, subject_id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(subject_id))
            .unwrap_or(false)
    }

    /// List registered subject ids (unordered)
    pub fn subject_ids(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered subjects
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
