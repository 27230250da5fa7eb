//! Rule trees: `and`/`or` combinators over constraint leaves (spec §3, §4.A).

use crate::constraint::Constraint;
use serde_json::{json, Value};

/// Whether a `Rules` node combines its children with `and` or `or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// All children must match.
    And,
    /// Any child may match.
    Or,
}

impl Combinator {
    fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

/// An internal node of a rule tree: a combinator over child rules, plus the
/// features this node is excluded from matching against (used to prevent a
/// talent re-triggering on its own outputs).
#[derive(Debug, Clone)]
pub struct Rules {
    /// `and` or `or`.
    pub combinator: Combinator,
    /// Child rules.
    pub rules: Vec<Rule>,
    /// Features this node's match is suppressed for.
    pub exclude_on: Vec<String>,
}

impl Rules {
    /// A new, empty combinator node.
    pub fn new(combinator: Combinator) -> Self {
        Self { combinator, rules: Vec::new(), exclude_on: Vec::new() }
    }

    /// Append a child rule.
    pub fn add(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Extend the exclusion list with one feature.
    pub fn exclude_on(&mut self, feature: impl Into<String>) -> &mut Self {
        self.exclude_on.push(feature.into());
        self
    }

    /// Extend the exclusion list with several features.
    pub fn exclude_on_many(&mut self, features: impl IntoIterator<Item = String>) -> &mut Self {
        self.exclude_on.extend(features);
        self
    }

    /// Render this node (and its children) as the wire JSON shape.
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.combinator.as_str(),
            "excludeOn": if self.exclude_on.is_empty() { Value::Null } else { json!(self.exclude_on) },
            "rules": self.rules.iter().map(Rule::to_json).collect::<Vec<_>>(),
        })
    }
}

/// A node in a rule tree: either a leaf constraint or an `and`/`or` combinator.
#[derive(Debug, Clone)]
pub enum Rule {
    /// A leaf predicate.
    Constraint(Constraint),
    /// An internal `and`/`or` node.
    Rules(Rules),
}

impl Rule {
    /// Render this rule (recursively) as its wire JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Rule::Constraint(c) => c.to_json(),
            Rule::Rules(r) => r.to_json(),
        }
    }

    /// Wrap this rule in an `or` combinator unless it's already a combinator
    /// node (spec §4.A: talent schema assembly only wraps bare constraints).
    pub fn wrap_or(self) -> Rules {
        match self {
            Rule::Rules(r) => r,
            leaf @ Rule::Constraint(_) => {
                let mut r = Rules::new(Combinator::Or);
                r.add(leaf);
                r
            }
        }
    }
}

impl From<Constraint> for Rule {
    fn from(c: Constraint) -> Self {
        Rule::Constraint(c)
    }
}

impl From<Rules> for Rule {
    fn from(r: Rules) -> Self {
        Rule::Rules(r)
    }
}
