//! Talent schema assembly and the discovery document (spec §3, §4.A).

use crate::rule::{Combinator, Rule, Rules};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised while assembling or rendering a talent schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// A talent has neither a trigger rule, a callee, nor a provided
    /// function — the discovery document would have nothing to subscribe
    /// to (spec §3 invariant).
    #[error("talent schema has no trigger rule, callee, or provided function")]
    EmptyRuleSet,
}

/// Combine a talent's user-supplied trigger rule `T` with its auto-generated
/// callee rule `C` into the schema's rule tree (spec §4.A assembly rule).
pub fn assemble_rule(trigger: Option<Rule>, callee: Option<Rule>, callee_output_features: &[String]) -> Result<Rule, SchemaError> {
    match (trigger, callee) {
        (None, None) => Err(SchemaError::EmptyRuleSet),
        (Some(t), None) => Ok(Rule::Rules(t.wrap_or())),
        (None, Some(c)) => Ok(c),
        (Some(t), Some(c)) => {
            let mut wrapped_trigger = t.wrap_or();
            wrapped_trigger.exclude_on_many(callee_output_features.iter().cloned());

            let mut callee_rules = c.wrap_or();
            callee_rules.add(Rule::Rules(wrapped_trigger));
            Ok(Rule::Rules(callee_rules))
        }
    }
}

/// Whether a feature's cycle check is disabled for everything, for a named
/// list, or for nothing (`schema.cpp::SkipCycleCheckType`).
#[derive(Debug, Clone)]
pub enum SkipCycleCheck {
    /// Cycle checks are disabled for every feature this talent produces.
    All,
    /// Cycle checks are disabled only for these features.
    Names(Vec<String>),
}

impl Default for SkipCycleCheck {
    fn default() -> Self {
        SkipCycleCheck::Names(Vec::new())
    }
}

impl SkipCycleCheck {
    /// Add a feature to the skip list. No-op if already `All` or already present.
    pub fn skip(&mut self, feature: impl Into<String>) {
        if let SkipCycleCheck::Names(names) = self {
            let feature = feature.into();
            if !names.contains(&feature) {
                names.push(feature);
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SkipCycleCheck::All => json!(true),
            SkipCycleCheck::Names(names) => json!(names),
        }
    }
}

/// Metadata describing an output feature's shape, history, and retention
/// (`schema.cpp::Metadata`). `encoding` is a raw JSON fragment describing
/// the encoder object used for this feature's recorded history — the
/// encoder catalogue (through/minmax/delta/category/null) is provider
/// configuration, not runtime logic, so it is passed through verbatim
/// rather than modeled as its own type hierarchy.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Human-readable description.
    pub description: String,
    /// Number of historical values retained.
    pub history: i64,
    /// Time-to-live for a value, in ms.
    pub ttl: i64,
    /// Unit label.
    pub unit: String,
    /// Encoder configuration fragment.
    pub encoding: Value,
}

impl Metadata {
    fn to_json(&self) -> Value {
        json!({
            "description": self.description,
            "history": self.history,
            "ttl": self.ttl,
            "encoding": self.encoding,
            "unit": self.unit,
        })
    }
}

/// An output feature this talent produces, paired with its metadata.
#[derive(Debug, Clone)]
pub struct OutputFeature {
    /// The bare feature name (not yet talent-qualified).
    pub feature: String,
    /// Its metadata.
    pub metadata: Metadata,
}

/// The discovery document advertising one talent's capabilities (spec §3).
#[derive(Debug, Clone)]
pub struct TalentSchema {
    id: String,
    outputs: Vec<OutputFeature>,
    skip_cycle_check: SkipCycleCheck,
    rules: Rule,
}

impl TalentSchema {
    /// Assemble a schema document. `rules` must already be the result of
    /// [`assemble_rule`] (or a manually-built equivalent) — this type does
    /// not re-derive it.
    pub fn new(id: impl Into<String>, outputs: Vec<OutputFeature>, skip_cycle_check: SkipCycleCheck, rules: Rule) -> Self {
        Self { id: id.into(), outputs, skip_cycle_check, rules }
    }

    /// The talent id this schema advertises.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render the full discovery document: `{"id", "config": {"outputs",
    /// "rules", "scc"}}` (`schema.cpp::Schema::Json`).
    pub fn to_json(&self) -> Value {
        let mut features = serde_json::Map::new();
        for o in &self.outputs {
            features.insert(format!("{}.{}", self.id, o.feature), o.metadata.to_json());
        }

        json!({
            "id": self.id,
            "config": {
                "outputs": features,
                "rules": self.rules.to_json(),
                "scc": self.skip_cycle_check.to_json(),
            }
        })
    }
}

/// Build an `or` rule from one `RegexMatch` arm per callee, matching the
/// talent's own replies on the causal-chain path (spec §4.F `GetRules`):
/// pattern `^\/<self-talent-id>\.[^\/]+\/.*` on path `/$tsuffix`.
pub fn callee_rule(self_talent_id: &str, callee_output_features: &[String]) -> Option<Rule> {
    if callee_output_features.is_empty() {
        return None;
    }

    let mut rules = Rules::new(Combinator::Or);
    let pattern = format!("^\\/{self_talent_id}\\.[^\\/]+\\/.*");
    for feature in callee_output_features {
        rules.add(
            crate::constraint::regex_match(
                feature.clone(),
                pattern.clone(),
                crate::constraint::ConstraintOptions { path: "/$tsuffix".to_string(), ..Default::default() },
            )
            .into(),
        );
    }
    Some(Rule::Rules(rules))
}
