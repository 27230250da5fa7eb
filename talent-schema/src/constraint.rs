//! Constraints — the leaves of a rule tree (spec §4.A).
//!
//! Three families share one wire shape (`feature, op, typeSelector,
//! valueType, path, instanceIdFilter, limitFeatureSelection, value`); they
//! differ only in `op` and how `value` is built. The original SDK expresses
//! this with a `Constraint` base class and per-family subclasses
//! (`schema.hpp`); a single struct plus a `ConstraintKind` tag does the same
//! job without a class hierarchy.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Default type selector when the caller doesn't narrow the type (`schema.hpp::DEFAULT_TYPE`).
pub const DEFAULT_TYPE: &str = "default";
/// Matches any feature; used internally by talent/function-talent rule assembly.
pub const ANY_FEATURE: &str = "";
/// Default instance-id filter: matches every instance (`schema.hpp::ALL_INSTANCE_FILTERS`).
pub const ALL_INSTANCE_FILTERS: &str = ".*";

/// `valueType` on the wire: whether `value` is the raw predicate value or
/// an encoded (Nelson selector) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// Raw predicate value (schema fragment or null).
    Raw = 0,
    /// Encoded selector (Nelson family).
    Encoded = 1,
}

impl Serialize for ValueEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// `op` on the wire: which constraint family this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// A JSON-schema predicate against the feature's value.
    Schema = 0,
    /// Triggers on any change to the feature, regardless of value.
    Change = 1,
    /// A Nelson rule selector against a timeseries of the feature.
    Nelson = 2,
}

impl Serialize for ConstraintOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Per-constraint options beyond `feature` and `value`, with the original
/// SDK's defaults (`type_selector = "default"`, `path = ""`,
/// `instance_id_filter = ".*"`, `limit_feature_selection = true`).
#[derive(Debug, Clone)]
pub struct ConstraintOptions {
    /// Restricts the constraint to features of this talent/device type.
    pub type_selector: String,
    /// JSON pointer into the feature's value the predicate applies to.
    pub path: String,
    /// Regex filtering which feature instances this constraint applies to.
    pub instance_id_filter: String,
    /// Whether `feature` narrows the match (vs. `ANY_FEATURE` wildcard use).
    pub limit_feature_selection: bool,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            type_selector: DEFAULT_TYPE.to_string(),
            path: String::new(),
            instance_id_filter: ALL_INSTANCE_FILTERS.to_string(),
            limit_feature_selection: true,
        }
    }
}

/// A single leaf predicate in a rule tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    feature: String,
    op: ConstraintOp,
    #[serde(rename = "typeSelector")]
    type_selector: String,
    value_type: ValueEncoding,
    path: String,
    #[serde(rename = "instanceIdFilter")]
    instance_id_filter: String,
    #[serde(rename = "limitFeatureSelection")]
    limit_feature_selection: bool,
    value: Value,
}

impl Constraint {
    fn new(feature: impl Into<String>, op: ConstraintOp, value: Value, encoding: ValueEncoding, opts: ConstraintOptions) -> Self {
        Self {
            feature: feature.into(),
            op,
            type_selector: opts.type_selector,
            value_type: encoding,
            path: opts.path,
            instance_id_filter: opts.instance_id_filter,
            limit_feature_selection: opts.limit_feature_selection,
            value,
        }
    }

    /// The feature this constraint applies to.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Render this constraint as its wire JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).expect("Constraint serializes to a JSON object")
    }
}

/// A generic SCHEMA-family constraint whose `value` is an arbitrary
/// JSON-schema fragment, built by the caller (used by `FunctionTalent`'s
/// function-signature constraint, spec §4.G, which doesn't fit any of the
/// named predicate constructors below).
pub fn schema(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Schema, value, ValueEncoding::Raw, opts)
}

/// `IsSet(f)`: the feature has ever been set (value is not null).
pub fn is_set(feature: impl Into<String>, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Schema, json!({"not": {"type": "null"}}), ValueEncoding::Raw, opts)
}

/// `Equals(f, v)`.
pub fn equals(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Schema, json!({"const": value}), ValueEncoding::Raw, opts)
}

/// `NotEquals(f, v)`.
pub fn not_equals(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Schema, json!({"not": {"const": value}}), ValueEncoding::Raw, opts)
}

/// `LessThan(f, v)`.
pub fn less_than(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(
        feature,
        ConstraintOp::Schema,
        json!({"type": "number", "exclusiveMaximum": value}),
        ValueEncoding::Raw,
        opts,
    )
}

/// `LessThanOrEqualTo(f, v)`.
pub fn less_than_or_equal_to(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(
        feature,
        ConstraintOp::Schema,
        json!({"type": "number", "maximum": value}),
        ValueEncoding::Raw,
        opts,
    )
}

/// `GreaterThan(f, v)`.
pub fn greater_than(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(
        feature,
        ConstraintOp::Schema,
        json!({"type": "number", "exclusiveMinimum": value}),
        ValueEncoding::Raw,
        opts,
    )
}

/// `GreaterThanOrEqualTo(f, v)`.
///
/// The `"minumum"` key is misspelled on purpose — the platform's own schema
/// validation depends on this exact typo (verified against
/// `original_source/lib/src/schema.cpp:372`). Do not "fix" it.
pub fn greater_than_or_equal_to(feature: impl Into<String>, value: Value, opts: ConstraintOptions) -> Constraint {
    Constraint::new(
        feature,
        ConstraintOp::Schema,
        json!({"type": "number", "minumum": value}),
        ValueEncoding::Raw,
        opts,
    )
}

/// `RegexMatch(f, p)`.
pub fn regex_match(feature: impl Into<String>, pattern: impl Into<String>, opts: ConstraintOptions) -> Constraint {
    Constraint::new(
        feature,
        ConstraintOp::Schema,
        json!({"type": "string", "pattern": pattern.into()}),
        ValueEncoding::Raw,
        opts,
    )
}

/// `Change(f)`: triggers on any update to the feature.
pub fn change(feature: impl Into<String>, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Change, Value::Null, ValueEncoding::Raw, opts)
}

/// The eight Nelson rule selectors (spec §4.A), in the selector-index order
/// the platform expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NelsonSelector {
    /// Out of 1 sigma.
    Out1Se = 0,
    /// Out of 2 sigma.
    Out2Se = 1,
    /// Out of 3 sigma.
    Out3Se = 2,
    /// Systematic bias.
    Bias = 3,
    /// Trend.
    Trend = 4,
    /// Alternating.
    Alter = 5,
    /// Low deviation.
    LowDev = 6,
    /// High deviation.
    HighDev = 7,
}

/// A Nelson-rule constraint against a timeseries of `feature`.
pub fn nelson(feature: impl Into<String>, selector: NelsonSelector, opts: ConstraintOptions) -> Constraint {
    Constraint::new(feature, ConstraintOp::Nelson, json!(selector as u8), ValueEncoding::Encoded, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_than_or_equal_to_preserves_misspelling() {
        let c = greater_than_or_equal_to("temp", json!(10), ConstraintOptions::default());
        let j = c.to_json();
        assert_eq!(j["value"]["minumum"], json!(10));
        assert!(j["value"].get("minimum").is_none());
    }

    #[test]
    fn is_set_constraint_shape() {
        let c = is_set("temp", ConstraintOptions { type_selector: "fridge".into(), ..Default::default() });
        let j = c.to_json();
        assert_eq!(j["feature"], json!("temp"));
        assert_eq!(j["typeSelector"], json!("fridge"));
        assert_eq!(j["op"], json!(0));
        assert_eq!(j["value"], json!({"not": {"type": "null"}}));
    }

    #[test]
    fn change_constraint_has_null_value_and_op_1() {
        let c = change("temp", ConstraintOptions::default());
        let j = c.to_json();
        assert_eq!(j["op"], json!(1));
        assert_eq!(j["value"], Value::Null);
    }

    #[test]
    fn nelson_constraint_encodes_selector_and_op_2() {
        let c = nelson("temp", NelsonSelector::Trend, ConstraintOptions::default());
        let j = c.to_json();
        assert_eq!(j["op"], json!(2));
        assert_eq!(j["valueType"], json!(1));
        assert_eq!(j["value"], json!(4));
    }

    #[test]
    fn defaults_match_original_sdk() {
        let c = is_set("temp", ConstraintOptions::default());
        let j = c.to_json();
        assert_eq!(j["typeSelector"], json!("default"));
        assert_eq!(j["path"], json!(""));
        assert_eq!(j["instanceIdFilter"], json!(".*"));
        assert_eq!(j["limitFeatureSelection"], json!(true));
    }
}
