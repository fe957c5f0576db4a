//! # Vary Core - context-driven variant resolution
//!
//! Vary picks the single best-matching variant of a named subject for a
//! runtime context, and memoizes that decision:
//!
//! - **Context**: an immutable bag of typed attributes describing who is
//!   asking, in what situation
//! - **Trigger**: a declarative condition over a context, contributing a
//!   specificity score
//! - **Registry**: owns subject → variant-set mappings with a validated
//!   default variant per subject
//! - **Selector**: evaluates all triggers and returns the highest-scoring
//!   match, falling back to the default variant
//! - **ResolutionCache**: bounded LRU + TTL memoization keyed by a versioned
//!   context fingerprint, purged eagerly on registry mutation
//!
//! ## Example
//!
//! ```rust
//! use vary_core::{Context, Resolver, Trigger, Variant};
//! use serde_json::json;
//!
//! let resolver = Resolver::new();
//!
//! resolver.register_subject(
//!     "card",
//!     vec![
//!         Variant::new(
//!             "minimal",
//!             Trigger::builder().range("width", None, Some(200.0)).build(),
//!             json!({"layout": "icon-only"}),
//!         ),
//!         Variant::new(
//!             "standard",
//!             Trigger::builder().range("width", Some(200.0), Some(400.0)).build(),
//!             json!({"layout": "full"}),
//!         ),
//!     ],
//!     "minimal",
//! ).unwrap();
//!
//! let ctx = Context::builder().attr("width", 300.0).build();
//! let selection = resolver.resolve("card", &ctx).unwrap();
//! assert_eq!(selection.variant_name, "standard");
//!
//! // Same context again: served from the cache
//! let again = resolver.resolve("card", &ctx).unwrap();
//! assert!(again.from_cache);
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod selector;
pub mod trigger;
pub mod variant;

// Re-export main types
pub use cache::{
    CacheStats, EvictionObserver, EvictionReason, KeyStrategy, ResolutionCache,
    ResolutionCacheConfig, FINGERPRINT_VERSION,
};
pub use context::{AttrValue, Breakpoint, Context, ContextBuilder};
pub use error::{ErrorCategory, Result, VaryError};
pub use registry::{Registration, Registry};
pub use resolver::{Metrics, Resolver};
pub use selector::select;
pub use trigger::{Constraint, Trigger, TriggerBuilder};
pub use variant::{
    RegistryEntry, Selection, SubjectManifest, Variant, VariantManifest, MANIFEST_VERSION,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_workflow() {
        let resolver = Resolver::new();

        resolver
            .register_subject(
                "toolbar",
                vec![
                    Variant::new(
                        "touch",
                        Trigger::builder().flag("touch", true).build(),
                        json!({"hit_target": 44}),
                    ),
                    Variant::new(
                        "dense",
                        Trigger::builder()
                            .flag("touch", false)
                            .equals("purpose", "editing")
                            .build(),
                        json!({"hit_target": 24}),
                    ),
                    Variant::unconditional("plain", json!({"hit_target": 32})),
                ],
                "plain",
            )
            .unwrap();

        // Most specific match wins
        let editing = Context::builder()
            .attr("touch", false)
            .attr("purpose", "editing")
            .build();
        assert_eq!(resolver.resolve("toolbar", &editing).unwrap().variant_name, "dense");

        // Single-constraint match
        let tablet = Context::builder().attr("touch", true).build();
        assert_eq!(resolver.resolve("toolbar", &tablet).unwrap().variant_name, "touch");

        // Unconditional variant catches everything else
        let bare = Context::new();
        assert_eq!(resolver.resolve("toolbar", &bare).unwrap().variant_name, "plain");

        // Second identical resolve is memoized
        assert!(resolver.resolve("toolbar", &editing).unwrap().from_cache);

        let metrics = resolver.metrics();
        assert_eq!(metrics.registered_subjects, 1);
        assert!(metrics.hits >= 1);
    }
}
