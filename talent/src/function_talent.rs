//! `FunctionTalent` — a talent that additionally exposes callable
//! functions (spec §4.G).

use crate::talent::Talent;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use talent_context::CallContext;
use talent_core::feature;
use talent_schema::constraint::ConstraintOptions;
use talent_schema::rule::{Combinator, Rule, Rules};
use talent_schema::talent_schema::{Metadata, SchemaError};
use talent_schema::value_schema::{ArraySchema, ObjectSchema, StringSchema, ValueSchema};
use talent_schema::TalentSchema;

/// A function talent's callable handler: receives the call's `args` and a
/// `CallContext` to reply (or gather further calls) through.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    /// Handle one invocation.
    async fn call(&self, args: Value, ctx: &CallContext);
}

/// A talent that extends [`Talent`] with a map of callable functions
/// (spec §4.G). Composition, not inheritance: `FunctionTalent` wraps a
/// base `Talent` and adds the function table plus schema-assembly
/// branching — it isn't an independently reusable protocol boundary the
/// way `Talent` itself is.
pub struct FunctionTalent {
    base: Talent,
    functions: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl FunctionTalent {
    /// Wrap a base talent with no functions registered yet.
    pub fn new(base: Talent) -> Self {
        Self { base, functions: HashMap::new() }
    }

    /// The underlying base talent.
    pub fn base(&self) -> &Talent {
        &self.base
    }

    /// The underlying base talent, mutably.
    pub fn base_mut(&mut self) -> &mut Talent {
        &mut self.base
    }

    /// Register a callable function (spec §4.G `RegisterFunction`):
    /// stores the handler, advertises `<name>-in`/`<name>-out` as output
    /// features, and excludes the full `-in` feature from cycle checking.
    pub fn register_function(&mut self, name: impl Into<String>, handler: Arc<dyn FunctionHandler>) {
        let name = name.into();

        self.base.add_output(
            feature::in_suffixed(&name),
            Metadata { description: format!("input of function {name}"), history: 0, ttl: 0, unit: String::new(), encoding: Value::Null },
        );
        self.base.add_output(
            feature::out_suffixed(&name),
            Metadata { description: format!("output of function {name}"), history: 0, ttl: 0, unit: String::new(), encoding: Value::Null },
        );

        let full_input_feature = feature::in_name(self.base.id().as_str(), &name);
        self.base.skip_full_input_feature(&full_input_feature);

        self.functions.insert(name, handler);
    }

    /// Whether `name` is a registered function.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// The fully-qualified input feature a call to `name` arrives on:
    /// `<talent-id>.<name>-in` (spec §4.H `HandleAsCall` match target).
    pub fn input_feature(&self, name: &str) -> String {
        feature::in_name(self.base.id().as_str(), name)
    }

    /// The fully-qualified output feature a reply from `name` is published
    /// on: `<talent-id>.<name>-out`.
    pub fn output_feature(&self, name: &str) -> String {
        feature::out_name(self.base.id().as_str(), name)
    }

    /// Dispatch an inbound call to the matching function handler, if any.
    /// Returns `false` if `func` names no registered function.
    pub async fn dispatch_call(&self, func: &str, args: Value, ctx: &CallContext) -> bool {
        match self.functions.get(func) {
            Some(handler) => {
                handler.call(args, ctx).await;
                true
            }
            None => false,
        }
    }

    fn function_signature_schema(&self, name: &str) -> Value {
        ValueSchema::Object(ObjectSchema {
            properties: vec![
                ("func".to_string(), ValueSchema::String(StringSchema { const_value: Some(name.to_string()), ..Default::default() })),
                ("args".to_string(), ValueSchema::Array(ArraySchema::default())),
                ("chnl".to_string(), ValueSchema::String(StringSchema::default())),
                ("call".to_string(), ValueSchema::String(StringSchema::default())),
                ("timeoutAtMs".to_string(), ValueSchema::Integer),
            ],
            required: vec!["func".to_string(), "args".to_string(), "chnl".to_string(), "call".to_string(), "timeoutAtMs".to_string()],
            additional_properties: false,
        })
        .to_json()
    }

    fn call_input_rule(&self) -> Rules {
        let mut rules = Rules::new(Combinator::Or);
        for name in self.functions.keys() {
            let constraint = talent_schema::schema(self.input_feature(name), self.function_signature_schema(name), ConstraintOptions::default());
            rules.add(constraint.into());
        }
        rules
    }

    /// Assemble this function talent's discovery schema (spec §4.G
    /// `GetSchema`). Falls back to the base talent's assembly when no
    /// functions are registered.
    pub fn get_schema(&self) -> Result<TalentSchema, SchemaError> {
        if self.functions.is_empty() {
            return self.base.get_schema();
        }

        let call_input = self.call_input_rule();
        let trigger = self.base.on_get_rules();
        let callee = self.base.get_callee_rules();

        if trigger.is_none() && callee.is_none() {
            return Ok(TalentSchema::new(self.base.id().as_str(), self.base.outputs().to_vec(), self.base.skip_cycle_check().clone(), Rule::Rules(call_input)));
        }

        let own_outputs: Vec<String> = self.base.outputs().iter().map(|o| format!("{}.{}", self.base.id(), o.feature)).collect();
        let own_call_inputs: Vec<String> = self.functions.keys().map(|name| self.input_feature(name)).collect();

        let mut root = match callee {
            Some(Rule::Rules(mut c)) => {
                for r in call_input.rules {
                    c.add(r);
                }
                c
            }
            Some(other) => {
                let mut wrapped = other.wrap_or();
                for r in call_input.rules {
                    wrapped.add(r);
                }
                wrapped
            }
            None => call_input,
        };
        root.exclude_on_many(own_outputs);

        if let Some(t) = trigger {
            let mut wrapped_trigger = t.wrap_or();
            wrapped_trigger.exclude_on_many(own_call_inputs);
            root.add(Rule::Rules(wrapped_trigger));
        }

        Ok(TalentSchema::new(self.base.id().as_str(), self.base.outputs().to_vec(), self.base.skip_cycle_check().clone(), Rule::Rules(root)))
    }
}
