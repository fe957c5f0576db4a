//! Variant model - the payloads a subject can resolve to
//!
//! A [`Variant`] is a named opaque payload plus an optional [`Trigger`].
//! Variants are grouped per subject into a [`RegistryEntry`], which preserves
//! registration order (the tie-break in selection) and validates its default
//! variant up front, instead of trusting property presence at lookup time.
//!
//! Subjects can also be authored declaratively as JSON and loaded through
//! [`VariantManifest`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VaryError};
use crate::trigger::Trigger;

/// Manifest format version
pub const MANIFEST_VERSION: &str = "1.0";

/// One possible resolved configuration for a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name, unique within its subject
    pub name: String,

    /// Condition under which this variant applies; `None` = default tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,

    /// Opaque payload handed back to the caller on selection
    #[serde(default)]
    pub payload: Value,
}

impl Variant {
    /// Create a variant with a trigger
    pub fn new(name: impl Into<String>, trigger: Trigger, payload: Value) -> Self {
        Self {
            name: name.into(),
            trigger: Some(trigger),
            payload,
        }
    }

    /// Create an unconditional variant (default tier)
    pub fn unconditional(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            trigger: None,
            payload,
        }
    }
}

/// A subject's registered variant set
///
/// Construction validates the two registration invariants: variant names are
/// unique, and `default_variant` names an existing variant whenever the set
/// is non-empty. Variant order is registration order and is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    subject_id: String,
    variants: Vec<Variant>,
    default_variant: String,
}

impl RegistryEntry {
    /// Build a validated entry
    pub fn new(
        subject_id: impl Into<String>,
        variants: Vec<Variant>,
        default_variant: impl Into<String>,
    ) -> Result<Self> {
        let subject_id = subject_id.into();
        let default_variant = default_variant.into();

        for (i, v) in variants.iter().enumerate() {
            if variants[..i].iter().any(|other| other.name == v.name) {
                return Err(VaryError::DuplicateVariant {
                    subject_id,
                    variant: v.name.clone(),
                });
            }
        }

        // Empty sets are permitted; the subject then resolves to nothing
        // until variants are registered.
        if !variants.is_empty() && !variants.iter().any(|v| v.name == default_variant) {
            return Err(VaryError::DefaultVariantMissing {
                subject_id,
                variant: default_variant,
            });
        }

        Ok(Self {
            subject_id,
            variants,
            default_variant,
        })
    }

    /// Subject this entry belongs to
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Variants in registration order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Look up a variant by name
    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Name of the designated default variant
    pub fn default_variant(&self) -> &str {
        &self.default_variant
    }
}

/// The outcome of resolving a subject against a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Name of the selected variant
    pub variant_name: String,

    /// The selected variant's payload
    pub payload: Value,

    /// The trigger that matched; `None` when selection fell through to the
    /// subject's default variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_trigger: Option<Trigger>,

    /// Specificity score of the winning trigger (default tier when none)
    pub score: u32,

    /// Whether this selection was served from the resolution cache
    pub from_cache: bool,
}

impl Selection {
    /// True when no trigger matched and the default variant was used
    pub fn fell_through(&self) -> bool {
        self.matched_trigger.is_none()
    }
}

/// Declarative definition of one subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectManifest {
    /// Subject identifier
    pub subject_id: String,

    /// Name of the default variant
    pub default_variant: String,

    /// Variants in declaration order
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl SubjectManifest {
    /// Convert into a validated registry entry
    pub fn into_entry(self) -> Result<RegistryEntry> {
        RegistryEntry::new(self.subject_id, self.variants, self.default_variant)
    }
}

/// A manifest file defining several subjects at once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantManifest {
    /// Manifest format version
    pub manifest_version: String,

    /// Subject definitions
    #[serde(default)]
    pub subjects: Vec<SubjectManifest>,
}

impl VariantManifest {
    /// Parse a manifest from JSON, checking the format version
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: VariantManifest = serde_json::from_str(json)?;
        if manifest.manifest_version != MANIFEST_VERSION {
            return Err(VaryError::InvalidManifest {
                reason: format!(
                    "unsupported manifest_version '{}', expected '{}'",
                    manifest.manifest_version, MANIFEST_VERSION
                ),
            });
        }
        Ok(manifest)
    }
}
