//! `Talent` — the base capability (spec §4.F).

use crate::handlers::{ClosureHandlers, TalentHandlers};
use std::sync::Arc;
use talent_codec::PlatformEvent;
use talent_context::{EventContext, UuidFn};
use talent_core::{feature, Callee, ChannelId, Event, TalentId};
use talent_schema::talent_schema::{callee_rule, SchemaError, SkipCycleCheck};
use talent_schema::{assemble_rule, Metadata, OutputFeature, Rule, TalentSchema};

/// An output feature this talent produces, paired with its metadata
/// (re-exported for callers registering outputs).
pub use talent_schema::OutputFeature as Output;

/// The base unit of event-driven behavior (spec §4.F): declares rules,
/// handles events, and may register callees (remote functions it intends
/// to call).
pub struct Talent {
    id: TalentId,
    channel_id: Option<ChannelId>,
    callees: Vec<Callee>,
    outputs: Vec<OutputFeature>,
    skip_cycle_check: SkipCycleCheck,
    handlers: Option<Arc<dyn TalentHandlers>>,
    closures: ClosureHandlers,
}

impl Talent {
    /// A new talent in "callback mode": no handlers yet, attach them with
    /// `on_event`/`on_error`/`on_platform_event`/`rules`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TalentId::new(id.into()),
            channel_id: None,
            callees: Vec::new(),
            outputs: Vec::new(),
            skip_cycle_check: SkipCycleCheck::default(),
            handlers: None,
            closures: ClosureHandlers::default(),
        }
    }

    /// A new talent in "subclass mode": `handlers` is consulted for every
    /// extension point, in preference to any callback-mode closures.
    pub fn with_handlers(id: impl Into<String>, handlers: Arc<dyn TalentHandlers>) -> Self {
        let mut talent = Self::new(id);
        talent.handlers = Some(handlers);
        talent
    }

    /// Register a closure for `OnEvent` (callback mode).
    pub fn on_event(mut self, f: impl Fn(Event, EventContext) -> crate::handlers::BoxFuture + Send + Sync + 'static) -> Self {
        self.closures.on_event = Some(Box::new(f));
        self
    }

    /// Register a closure for `OnPlatformEvent` (callback mode).
    pub fn on_platform_event(mut self, f: impl Fn(PlatformEvent) -> crate::handlers::BoxFuture + Send + Sync + 'static) -> Self {
        self.closures.on_platform_event = Some(Box::new(f));
        self
    }

    /// Register a closure for `OnError` (callback mode).
    pub fn on_error(mut self, f: impl Fn(String) -> crate::handlers::BoxFuture + Send + Sync + 'static) -> Self {
        self.closures.on_error = Some(Box::new(f));
        self
    }

    /// Register the trigger rule tree for this talent (callback mode).
    pub fn rules(mut self, rule: Rule) -> Self {
        self.closures.get_rules = Some(Box::new(move || Some(rule.clone())));
        self
    }

    /// This talent's id.
    pub fn id(&self) -> &TalentId {
        &self.id
    }

    /// This talent's channel id, assigned by [`Talent::initialize`]. `None`
    /// before the client has started this talent.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.channel_id.as_ref()
    }

    /// This talent's registered callees.
    pub fn callees(&self) -> &[Callee] {
        &self.callees
    }

    /// This talent's registered output features.
    pub fn outputs(&self) -> &[OutputFeature] {
        &self.outputs
    }

    /// This talent's cycle-check skip list.
    pub fn skip_cycle_check(&self) -> &SkipCycleCheck {
        &self.skip_cycle_check
    }

    /// Exclude a fully-qualified feature from cycle checking (used by
    /// `FunctionTalent` to exempt a function's full input feature).
    pub(crate) fn skip_full_input_feature(&mut self, feature: impl Into<String>) {
        self.skip_cycle_check.skip(feature);
    }

    /// Assign this talent's channel id: `"<talent-id>.<uuid>"` (spec §4.F).
    /// Called once by the client at startup.
    pub fn initialize(&mut self, uuid_fn: &UuidFn) {
        self.channel_id = Some(ChannelId::new(format!("{}.{}", self.id, uuid_fn())));
    }

    /// Append a callee, recording its output feature for cycle-check
    /// exclusion (spec §4.F `RegisterCallee`).
    pub fn register_callee(&mut self, talent_id: impl Into<String>, func: impl Into<String>, r#type: impl Into<String>) -> Callee {
        let callee = Callee::new(talent_id.into(), func.into(), r#type.into());
        self.skip_cycle_check.skip(self.callee_output_feature(&callee));
        self.callees.push(callee.clone());
        callee
    }

    /// Append an output feature this talent produces.
    pub fn add_output(&mut self, feature: impl Into<String>, metadata: Metadata) {
        self.outputs.push(OutputFeature { feature: feature.into(), metadata });
    }

    fn callee_output_feature(&self, callee: &Callee) -> String {
        feature::out_name_typed(callee.r#type(), callee.talent_id(), callee.func())
    }

    fn callee_output_features(&self) -> Vec<String> {
        self.callees.iter().map(|c| self.callee_output_feature(c)).collect()
    }

    /// Extension point: extra rules beyond the auto-generated callee rule.
    /// Delegates to the subclass-mode handler if set, else the
    /// callback-mode rules closure, else `None` (spec §4.F `OnGetRules`).
    pub fn on_get_rules(&self) -> Option<Rule> {
        if let Some(h) = &self.handlers {
            h.on_get_rules()
        } else {
            self.closures.on_get_rules()
        }
    }

    /// Dispatch an event to this talent's handler (spec §4.F `OnEvent`).
    pub async fn handle_event(&self, event: &Event, ctx: &EventContext) {
        if let Some(h) = &self.handlers {
            h.on_event(event, ctx).await;
        } else {
            self.closures.on_event(event, ctx).await;
        }
    }

    /// Dispatch a platform lifecycle event (spec §4.F `OnPlatformEvent`).
    pub async fn handle_platform_event(&self, evt: &PlatformEvent) {
        if let Some(h) = &self.handlers {
            h.on_platform_event(evt).await;
        } else {
            self.closures.on_platform_event(evt).await;
        }
    }

    /// Dispatch a protocol error (spec §4.F `OnError`).
    pub async fn handle_error(&self, message: &str) {
        if let Some(h) = &self.handlers {
            h.on_error(message).await;
        } else {
            self.closures.on_error(message).await;
        }
    }

    /// The auto-generated callee rule: an `or` of `RegexMatch` constraints
    /// on each callee's output feature (spec §4.F `GetRules`). `None` if
    /// this talent has no callees.
    pub fn get_callee_rules(&self) -> Option<Rule> {
        callee_rule(self.id.as_str(), &self.callee_output_features())
    }

    /// Assemble this talent's discovery schema (spec §4.F `GetSchema`,
    /// §4.A assembly rule).
    pub fn get_schema(&self) -> Result<TalentSchema, SchemaError> {
        let rule = assemble_rule(self.on_get_rules(), self.get_callee_rules(), &self.callee_output_features())?;
        Ok(TalentSchema::new(self.id.as_str(), self.outputs.clone(), self.skip_cycle_check.clone(), rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_callee_tracks_output_feature_for_cycle_check() {
        let mut t = Talent::new("t1");
        t.register_callee("provider", "echo", "default");
        assert_eq!(t.callees().len(), 1);
    }

    #[test]
    fn schema_requires_trigger_callee_or_function() {
        let t = Talent::new("t1");
        assert!(t.get_schema().is_err());
    }

    #[test]
    fn callee_only_schema_is_the_callee_rule() {
        let mut t = Talent::new("t1");
        t.register_callee("provider", "echo", "default");
        let schema = t.get_schema().unwrap();
        let j = schema.to_json();
        assert_eq!(j["config"]["rules"]["type"], serde_json::json!("or"));
    }

    #[tokio::test]
    async fn callback_mode_on_get_rules_round_trips() {
        use talent_schema::constraint::{is_set, ConstraintOptions};
        let rule: Rule = is_set("temp", ConstraintOptions::default()).into();
        let t = Talent::new("t1").rules(rule);
        assert!(t.on_get_rules().is_some());
    }
}
