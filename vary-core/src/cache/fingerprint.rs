//! Cache fingerprints - versioned key construction
//!
//! The fingerprint summarizes the parts of a context that are relevant to a
//! resolution decision. Which parts count is an explicit, versioned contract
//! chosen by [`KeyStrategy`], not incidental string concatenation:
//!
//! - [`KeyStrategy::Full`] digests the whole canonical-serialized context.
//!   Always correct; a context differing in any attribute gets its own entry,
//!   which costs hit rate.
//! - [`KeyStrategy::Coarse`] digests only purpose, intent, the derived width
//!   breakpoint, and role. Higher hit rate, but stale results are possible
//!   when a trigger constrains a field outside that subset - only use it when
//!   every trigger for the cached subjects stays inside [`COARSE_FIELDS`].
//!
//! Keys are shaped `v1:{subject}:{generation}:{digest}`, where the
//! generation is the subject's registration generation at the time the entry
//! was read. A selection computed under a superseded registration is inserted
//! under the old generation's key, which no lookup against the current
//! registration ever reads; purging a subject remains a key-prefix operation
//! and removes every generation at once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::context::Context;

/// Fingerprint format version; bump when the key contract changes
pub const FINGERPRINT_VERSION: &str = "v1";

/// The context fields the coarse strategy considers relevant
///
/// `width` enters the key as its derived breakpoint bucket, not its raw
/// value, so widths inside one bucket share an entry.
pub const COARSE_FIELDS: [&str; 4] = ["purpose", "intent", "width", "role"];

/// How much of the context participates in the cache key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Digest of the entire canonical-serialized context
    #[default]
    Full,
    /// Digest of purpose, intent, derived breakpoint, and role only
    Coarse,
}

/// Build the cache key for a (subject, registration generation, context)
/// triple
pub fn fingerprint(
    strategy: KeyStrategy,
    subject_id: &str,
    generation: u64,
    ctx: &Context,
) -> String {
    let digest = match strategy {
        KeyStrategy::Full => {
            // BTreeMap ordering makes this serialization canonical.
            let canonical = serde_json::to_string(ctx).unwrap_or_default();
            hash_input("full", &canonical)
        }
        KeyStrategy::Coarse => {
            let mut joined = String::new();
            joined.push_str(ctx.text("purpose").unwrap_or("-"));
            joined.push('\x1f');
            joined.push_str(ctx.text("intent").unwrap_or("-"));
            joined.push('\x1f');
            joined.push_str(
                ctx.breakpoint("width")
                    .map(|b| b.as_str())
                    .unwrap_or("-"),
            );
            joined.push('\x1f');
            joined.push_str(ctx.text("role").unwrap_or("-"));
            hash_input("coarse", &joined)
        }
    };

    format!(
        "{}:{}:{}:{}",
        FINGERPRINT_VERSION, subject_id, generation, digest
    )
}

/// Key prefix shared by every entry of a subject, for purge-by-subject
pub fn subject_prefix(subject_id: &str) -> String {
    format!("{}:{}:", FINGERPRINT_VERSION, subject_id)
}

fn hash_input(tag: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(b"\n");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(width: f64, purpose: &str) -> Context {
        Context::builder()
            .attr("width", width)
            .attr("purpose", purpose)
            .attr("role", "viewer")
            .build()
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint(KeyStrategy::Full, "card", 1, &ctx(300.0, "preview"));
        let b = fingerprint(KeyStrategy::Full, "card", 1, &ctx(300.0, "preview"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_carries_version_and_subject_prefix() {
        let key = fingerprint(KeyStrategy::Full, "card", 1, &ctx(300.0, "preview"));
        assert!(key.starts_with(&subject_prefix("card")));
        assert!(key.starts_with("v1:card:"));
    }

    #[test]
    fn test_full_strategy_separates_any_attribute_change() {
        let base = fingerprint(KeyStrategy::Full, "card", 1, &ctx(300.0, "preview"));
        let other_width = fingerprint(KeyStrategy::Full, "card", 1, &ctx(301.0, "preview"));
        assert_ne!(base, other_width);
    }

    #[test]
    fn test_generations_never_share_keys() {
        // Same subject and context, different registration generations:
        // distinct keys, both still under the subject's purge prefix
        let context = ctx(300.0, "preview");
        let old = fingerprint(KeyStrategy::Full, "card", 1, &context);
        let new = fingerprint(KeyStrategy::Full, "card", 2, &context);
        assert_ne!(old, new);
        assert!(old.starts_with(&subject_prefix("card")));
        assert!(new.starts_with(&subject_prefix("card")));
    }

    #[test]
    fn test_coarse_strategy_shares_entries_within_a_bucket() {
        // 300 and 310 are both Compact; coarse keys collapse them
        let a = fingerprint(KeyStrategy::Coarse, "card", 1, &ctx(300.0, "preview"));
        let b = fingerprint(KeyStrategy::Coarse, "card", 1, &ctx(310.0, "preview"));
        assert_eq!(a, b);

        // crossing a breakpoint threshold separates them
        let c = fingerprint(KeyStrategy::Coarse, "card", 1, &ctx(500.0, "preview"));
        assert_ne!(a, c);

        // so does a coarse field change
        let d = fingerprint(KeyStrategy::Coarse, "card", 1, &ctx(300.0, "editing"));
        assert_ne!(a, d);
    }

    #[test]
    fn test_subjects_never_share_keys() {
        let context = ctx(300.0, "preview");
        let card = fingerprint(KeyStrategy::Full, "card", 1, &context);
        let panel = fingerprint(KeyStrategy::Full, "panel", 1, &context);
        assert_ne!(card, panel);
    }

    #[test]
    fn test_absent_coarse_fields_use_placeholder() {
        let empty = Context::new();
        let a = fingerprint(KeyStrategy::Coarse, "card", 1, &empty);
        let b = fingerprint(KeyStrategy::Coarse, "card", 1, &empty);
        assert_eq!(a, b);
    }
}
