//! Context - the immutable attribute bag a resolution is asked against
//!
//! A [`Context`] describes "who is asking, in what situation": numeric
//! measurements (container width, height), categorical strings (purpose,
//! intent, role, theme), device capability flags, and set-valued fields
//! (permissions).
//!
//! Contexts are immutable once built. Deriving a new situation from an
//! existing one goes through [`Context::extend`], which copies and overrides
//! fields; nothing is ever mutated in place. Attribute storage is ordered
//! (`BTreeMap`), so serialization and fingerprinting are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    /// Numeric measurement (width, height, area)
    Number(f64),
    /// Categorical string (purpose, intent, role, theme, entity type)
    Text(String),
    /// Capability flag (touch, hover, reduced motion)
    Flag(bool),
    /// Multi-valued field (permissions, tags)
    Set(Vec<String>),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Flag(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Set(v)
    }
}

/// Size bucket derived from a numeric field via a fixed threshold table
///
/// The thresholds are defined once here and shared by trigger evaluation and
/// cache fingerprinting, so both always agree on which bucket a width falls
/// into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakpoint {
    /// Below 480
    Compact,
    /// 480 to 959
    Medium,
    /// 960 to 1439
    Expanded,
    /// 1440 and above
    Wide,
}

/// Threshold table: upper bounds (exclusive) for the first three buckets
pub const BREAKPOINT_THRESHOLDS: [f64; 3] = [480.0, 960.0, 1440.0];

impl Breakpoint {
    /// Bucket a numeric value using the shared threshold table
    pub fn from_value(value: f64) -> Self {
        if value < BREAKPOINT_THRESHOLDS[0] {
            Breakpoint::Compact
        } else if value < BREAKPOINT_THRESHOLDS[1] {
            Breakpoint::Medium
        } else if value < BREAKPOINT_THRESHOLDS[2] {
            Breakpoint::Expanded
        } else {
            Breakpoint::Wide
        }
    }

    /// Stable name for fingerprints and rendered output
    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Compact => "compact",
            Breakpoint::Medium => "medium",
            Breakpoint::Expanded => "expanded",
            Breakpoint::Wide => "wide",
        }
    }
}

/// Immutable, ordered bag of named attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    attrs: BTreeMap<String, AttrValue>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Get a raw attribute value
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Get a numeric attribute, `None` if absent or not a number
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.attrs.get(name) {
            Some(AttrValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a categorical attribute, `None` if absent or not text
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(AttrValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Get a flag attribute, `None` if absent or not a flag
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.attrs.get(name) {
            Some(AttrValue::Flag(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a set-valued attribute, `None` if absent or not a set
    pub fn set(&self, name: &str) -> Option<&[String]> {
        match self.attrs.get(name) {
            Some(AttrValue::Set(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Derive the breakpoint bucket of a numeric field
    ///
    /// Returns `None` when the field is absent or non-numeric; callers treat
    /// that as "constraint not satisfied", never as an error.
    pub fn breakpoint(&self, name: &str) -> Option<Breakpoint> {
        self.number(name).map(Breakpoint::from_value)
    }

    /// Start a builder seeded with this context's attributes
    ///
    /// The original context is untouched; the builder produces a new one.
    pub fn extend(&self) -> ContextBuilder {
        ContextBuilder {
            attrs: self.attrs.clone(),
        }
    }

    /// Iterate attributes in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Check if the context has no attributes
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// Builder for contexts
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    attrs: BTreeMap<String, AttrValue>,
}

impl ContextBuilder {
    /// Set an attribute of any supported type
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Remove an attribute inherited from `extend()`
    pub fn without(mut self, name: &str) -> Self {
        self.attrs.remove(name);
        self
    }

    /// Finish building
    pub fn build(self) -> Context {
        Context { attrs: self.attrs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let ctx = Context::builder()
            .attr("width", 320.0)
            .attr("purpose", "preview")
            .attr("touch", true)
            .attr("permissions", vec!["read".to_string(), "write".to_string()])
            .build();

        assert_eq!(ctx.number("width"), Some(320.0));
        assert_eq!(ctx.text("purpose"), Some("preview"));
        assert_eq!(ctx.flag("touch"), Some(true));
        assert_eq!(ctx.set("permissions").map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_missing_and_mistyped_fields_are_none() {
        let ctx = Context::builder().attr("width", 320.0).build();

        assert_eq!(ctx.number("height"), None);
        assert_eq!(ctx.text("width"), None);
        assert_eq!(ctx.flag("width"), None);
        assert_eq!(ctx.breakpoint("height"), None);
    }

    #[test]
    fn test_extend_does_not_mutate_original() {
        let base = Context::builder()
            .attr("purpose", "preview")
            .attr("width", 320.0)
            .build();

        let wider = base.extend().attr("width", 1000.0).build();

        assert_eq!(base.number("width"), Some(320.0));
        assert_eq!(wider.number("width"), Some(1000.0));
        assert_eq!(wider.text("purpose"), Some("preview"));
    }

    #[test]
    fn test_extend_without() {
        let base = Context::builder()
            .attr("purpose", "preview")
            .attr("touch", true)
            .build();

        let trimmed = base.extend().without("touch").build();
        assert_eq!(trimmed.flag("touch"), None);
        assert_eq!(base.flag("touch"), Some(true));
    }

    #[test]
    fn test_breakpoint_thresholds() {
        assert_eq!(Breakpoint::from_value(0.0), Breakpoint::Compact);
        assert_eq!(Breakpoint::from_value(479.9), Breakpoint::Compact);
        assert_eq!(Breakpoint::from_value(480.0), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_value(959.9), Breakpoint::Medium);
        assert_eq!(Breakpoint::from_value(960.0), Breakpoint::Expanded);
        assert_eq!(Breakpoint::from_value(1440.0), Breakpoint::Wide);
    }

    #[test]
    fn test_derived_breakpoint() {
        let ctx = Context::builder().attr("width", 640.0).build();
        assert_eq!(ctx.breakpoint("width"), Some(Breakpoint::Medium));
    }

    #[test]
    fn test_ordered_serialization_is_deterministic() {
        let a = Context::builder()
            .attr("zeta", 1.0)
            .attr("alpha", "x")
            .build();
        let b = Context::builder()
            .attr("alpha", "x")
            .attr("zeta", 1.0)
            .build();

        let ja = serde_json::to_string(&a).unwrap();
        let jb = serde_json::to_string(&b).unwrap();
        assert_eq!(ja, jb);
    }
}
