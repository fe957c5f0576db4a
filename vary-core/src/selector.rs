//! Selector - picks the best-matching variant for a context
//!
//! Single pass over the subject's variants in registration order, tracking
//! the maximum-scoring match. Replacement happens only on a strict score
//! improvement, which makes the tie-break deterministic: equal scores keep
//! the earliest-registered variant. When nothing matches, the subject's
//! designated default variant is returned with `matched_trigger = None`.

use crate::context::Context;
use crate::error::{Result, VaryError};
use crate::trigger::weights;
use crate::variant::{RegistryEntry, Selection, Variant};

/// Select the highest-scoring matching variant
///
/// A variant with no trigger matches unconditionally at the default-tier
/// score, so it can win only when no constrained trigger matches. An empty
/// variant set yields [`VaryError::SubjectEmpty`].
pub fn select(entry: &RegistryEntry, ctx: &Context) -> Result<Selection> {
    if entry.variants().is_empty() {
        return Err(VaryError::SubjectEmpty {
            subject_id: entry.subject_id().to_string(),
        });
    }

    let mut best: Option<(&Variant, u32)> = None;

    for variant in entry.variants() {
        let (matched, score) = match &variant.trigger {
            Some(trigger) => (trigger.matches(ctx), trigger.score()),
            None => (true, weights::DEFAULT_TIER),
        };

        if !matched {
            continue;
        }

        // Strict improvement only: ties keep the earliest-registered variant.
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((variant, score)),
        }
    }

    if let Some((variant, score)) = best {
        return Ok(Selection {
            variant_name: variant.name.clone(),
            payload: variant.payload.clone(),
            matched_trigger: variant.trigger.clone(),
            score,
            from_cache: false,
        });
    }

    // Fell through: designated default, marked by a nil trigger.
    let default = entry.get(entry.default_variant()).ok_or_else(|| {
        VaryError::DefaultVariantMissing {
            subject_id: entry.subject_id().to_string(),
            variant: entry.default_variant().to_string(),
        }
    })?;

    Ok(Selection {
        variant_name: default.name.clone(),
        payload: default.payload.clone(),
        matched_trigger: None,
        score: weights::DEFAULT_TIER,
        from_cache: false,
    })
}
