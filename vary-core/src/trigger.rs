//! Trigger - the declarative condition guarding a variant
//!
//! A [`Trigger`] is a set of named constraints over a [`Context`]. A trigger
//! matches iff every declared constraint is individually satisfied; a
//! dimension with no constraint is "don't care", and an empty trigger matches
//! unconditionally.
//!
//! Matching is pure and total: a missing or mistyped context field fails the
//! corresponding constraint (non-match), it never raises an error.
//!
//! Each trigger also carries a specificity score, the sum of fixed per-kind
//! weights from the shared [`weights`] table. Scores are comparable across
//! subjects because the table is defined exactly once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::{AttrValue, Breakpoint, Context};

/// Fixed per-constraint-kind specificity weights
///
/// Shared by all callers so that scores are comparable across subjects.
/// Fine-grained, highly distinguishing kinds (permission membership,
/// restricted value sets) outweigh coarse ones (size buckets). The weight a
/// constraint contributes is independent of the value it constrains.
pub mod weights {
    /// Set-membership / permission constraint
    pub const CONTAINS: u32 = 40;
    /// Restricted value-set constraint
    pub const ONE_OF: u32 = 25;
    /// Categorical equality (entity type, purpose, theme)
    pub const EQUALS: u32 = 20;
    /// Capability flag equality
    pub const FLAG: u32 = 15;
    /// Inclusive numeric range
    pub const RANGE: u32 = 15;
    /// Derived breakpoint bucket
    pub const BREAKPOINT: u32 = 10;

    /// Score of an empty or absent trigger ("default tier")
    ///
    /// Strictly below every populated weight, so any matching declared
    /// constraint outranks having none.
    pub const DEFAULT_TIER: u32 = 1;
}

/// A single constraint on one context dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric range; absent bound = unbounded on that side
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Categorical equality
    Equals(String),
    /// Boolean flag equality
    Flag(bool),
    /// Context field must equal one of these values (single-valued field)
    /// or intersect them (set-valued field)
    OneOf(Vec<String>),
    /// Set-valued context field must contain this value (e.g., a permission)
    Contains(String),
    /// Numeric field must bucket to this breakpoint
    Breakpoint(Breakpoint),
}

impl Constraint {
    /// Evaluate this constraint against one context field
    ///
    /// Missing or mistyped fields fail the constraint rather than erroring.
    pub fn satisfied_by(&self, ctx: &Context, field: &str) -> bool {
        match self {
            Constraint::Range { min, max } => match ctx.number(field) {
                Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                None => false,
            },
            Constraint::Equals(expected) => ctx.text(field) == Some(expected.as_str()),
            Constraint::Flag(expected) => ctx.flag(field) == Some(*expected),
            Constraint::OneOf(allowed) => match ctx.get(field) {
                Some(AttrValue::Text(v)) => allowed.iter().any(|a| a == v),
                Some(AttrValue::Set(vs)) => vs.iter().any(|v| allowed.iter().any(|a| a == v)),
                _ => false,
            },
            Constraint::Contains(needle) => ctx
                .set(field)
                .map(|vs| vs.iter().any(|v| v == needle))
                .unwrap_or(false),
            Constraint::Breakpoint(expected) => ctx.breakpoint(field) == Some(*expected),
        }
    }

    /// The shared specificity weight of this constraint's kind
    pub fn weight(&self) -> u32 {
        match self {
            Constraint::Contains(_) => weights::CONTAINS,
            Constraint::OneOf(_) => weights::ONE_OF,
            Constraint::Equals(_) => weights::EQUALS,
            Constraint::Flag(_) => weights::FLAG,
            Constraint::Range { .. } => weights::RANGE,
            Constraint::Breakpoint(_) => weights::BREAKPOINT,
        }
    }
}

/// A declarative condition over a context: one constraint per dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    constraints: BTreeMap<String, Constraint>,
}

impl Trigger {
    /// Create an empty (always-matching) trigger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    pub fn builder() -> TriggerBuilder {
        TriggerBuilder::default()
    }

    /// Check whether every declared constraint is satisfied
    ///
    /// An empty trigger always matches.
    pub fn matches(&self, ctx: &Context) -> bool {
        self.constraints
            .iter()
            .all(|(field, c)| c.satisfied_by(ctx, field))
    }

    /// Specificity score: sum of per-kind weights of declared constraints
    ///
    /// An empty trigger scores [`weights::DEFAULT_TIER`].
    pub fn score(&self) -> u32 {
        if self.constraints.is_empty() {
            weights::DEFAULT_TIER
        } else {
            self.constraints.values().map(Constraint::weight).sum()
        }
    }

    /// Iterate declared constraints in field order
    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared constraints
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Check if this trigger has no constraints
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Builder for triggers
#[derive(Debug, Clone, Default)]
pub struct TriggerBuilder {
    constraints: BTreeMap<String, Constraint>,
}

impl TriggerBuilder {
    /// Constrain a numeric field to an inclusive range
    pub fn range(mut self, field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints
            .insert(field.into(), Constraint::Range { min, max });
        self
    }

    /// Constrain a categorical field to an exact value
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints
            .insert(field.into(), Constraint::Equals(value.into()));
        self
    }

    /// Constrain a flag field
    pub fn flag(mut self, field: impl Into<String>, value: bool) -> Self {
        self.constraints.insert(field.into(), Constraint::Flag(value));
        self
    }

    /// Constrain a field to a restricted value set
    pub fn one_of(mut self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.constraints
            .insert(field.into(), Constraint::OneOf(values));
        self
    }

    /// Require a set-valued field to contain a value (e.g., a permission)
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints
            .insert(field.into(), Constraint::Contains(value.into()));
        self
    }

    /// Require a numeric field to bucket to a breakpoint
    pub fn breakpoint(mut self, field: impl Into<String>, bucket: Breakpoint) -> Self {
        self.constraints
            .insert(field.into(), Constraint::Breakpoint(bucket));
        self
    }

    /// Finish building
    pub fn build(self) -> Trigger {
        Trigger {
            constraints: self.constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_editor_ctx() -> Context {
        Context::builder()
            .attr("width", 1000.0)
            .attr("purpose", "editing")
            .attr("touch", false)
            .attr("permissions", vec!["read".to_string(), "write".to_string()])
            .build()
    }

    #[test]
    fn test_empty_trigger_always_matches() {
        let trigger = Trigger::new();
        assert!(trigger.matches(&wide_editor_ctx()));
        assert!(trigger.matches(&Context::new()));
        assert_eq!(trigger.score(), weights::DEFAULT_TIER);
    }

    #[test]
    fn test_range_is_inclusive() {
        let trigger = Trigger::builder()
            .range("width", Some(200.0), Some(1000.0))
            .build();
        assert!(trigger.matches(&wide_editor_ctx()));

        let at_min = Context::builder().attr("width", 200.0).build();
        assert!(trigger.matches(&at_min));

        let below = Context::builder().attr("width", 199.9).build();
        assert!(!trigger.matches(&below));
    }

    #[test]
    fn test_half_open_range() {
        let trigger = Trigger::builder().range("width", Some(960.0), None).build();
        assert!(trigger.matches(&wide_editor_ctx()));
        assert!(!trigger.matches(&Context::builder().attr("width", 500.0).build()));
    }

    #[test]
    fn test_missing_field_fails_constraint_without_error() {
        let trigger = Trigger::builder().equals("theme", "dark").build();
        // No theme in the context: non-match, not a panic
        assert!(!trigger.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_mistyped_field_fails_constraint() {
        // "purpose" is text, constrained as a range
        let trigger = Trigger::builder()
            .range("purpose", Some(0.0), Some(1.0))
            .build();
        assert!(!trigger.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_all_constraints_must_hold() {
        let trigger = Trigger::builder()
            .equals("purpose", "editing")
            .flag("touch", true)
            .build();
        // purpose matches but touch=false
        assert!(!trigger.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_one_of_against_single_valued_field() {
        let trigger = Trigger::builder()
            .one_of(
                "purpose",
                vec!["editing".to_string(), "reviewing".to_string()],
            )
            .build();
        assert!(trigger.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_one_of_intersects_set_valued_field() {
        let trigger = Trigger::builder()
            .one_of("permissions", vec!["admin".to_string(), "write".to_string()])
            .build();
        assert!(trigger.matches(&wide_editor_ctx()));

        let no_overlap = Trigger::builder()
            .one_of("permissions", vec!["admin".to_string()])
            .build();
        assert!(!no_overlap.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_contains_permission() {
        let trigger = Trigger::builder().contains("permissions", "write").build();
        assert!(trigger.matches(&wide_editor_ctx()));

        let missing = Trigger::builder().contains("permissions", "delete").build();
        assert!(!missing.matches(&wide_editor_ctx()));
    }

    #[test]
    fn test_breakpoint_constraint() {
        let trigger = Trigger::builder()
            .breakpoint("width", Breakpoint::Expanded)
            .build();
        assert!(trigger.matches(&wide_editor_ctx()));
        assert!(!trigger.matches(&Context::builder().attr("width", 100.0).build()));
    }

    #[test]
    fn test_score_sums_kind_weights() {
        let trigger = Trigger::builder()
            .equals("purpose", "editing")
            .contains("permissions", "write")
            .build();
        assert_eq!(trigger.score(), weights::EQUALS + weights::CONTAINS);
    }

    #[test]
    fn test_permission_outweighs_coarse_kinds() {
        assert!(weights::CONTAINS > weights::EQUALS);
        assert!(weights::EQUALS > weights::BREAKPOINT);
        assert!(weights::DEFAULT_TIER < weights::BREAKPOINT);
    }

    #[test]
    fn test_adding_a_constraint_never_decreases_score() {
        let base = Trigger::builder().equals("purpose", "editing").build();
        let extended = Trigger::builder()
            .equals("purpose", "editing")
            .flag("touch", false)
            .build();
        assert!(extended.score() > base.score());
    }

    #[test]
    fn test_trigger_json_round_trip() {
        let trigger = Trigger::builder()
            .range("width", Some(200.0), None)
            .equals("purpose", "editing")
            .breakpoint("height", Breakpoint::Compact)
            .build();

        let json = serde_json::to_string(&trigger).unwrap();
        let parsed: Trigger = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, trigger);
    }
}
