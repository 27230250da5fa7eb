//! Talent extension points: `TalentHandlers` (subclass mode) and the
//! closure-based adapter `talent::Talent`'s builder methods wrap into it
//! (callback mode) — both usage patterns from `original_source/examples/
//! {callback_mode,subclass_mode}.cpp` (spec §4.F).

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use talent_codec::PlatformEvent;
use talent_context::EventContext;
use talent_core::Event;
use talent_schema::Rule;

/// A boxed, owned future — the shape callback-mode handlers return.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A talent's extension points (spec §4.F): `OnGetRules`, `OnEvent`,
/// `OnPlatformEvent`, `OnError`. Every method has a no-op/`None` default so
/// a subclass only overrides what it needs.
#[async_trait]
pub trait TalentHandlers: Send + Sync {
    /// Extra rules this talent's schema should advertise, beyond the
    /// auto-generated callee rule. `None` if this talent has none of its
    /// own (it may still have a schema via callees/functions).
    fn on_get_rules(&self) -> Option<Rule> {
        None
    }

    /// Handle an event routed to this talent (not a call to a function
    /// talent's own function — the router intercepts those separately).
    async fn on_event(&self, _event: &Event, _ctx: &EventContext) {}

    /// Handle a platform lifecycle event (talent rules set/unset/etc).
    async fn on_platform_event(&self, _evt: &PlatformEvent) {}

    /// Handle a protocol error surfaced by the platform (spec §4.C error codes).
    async fn on_error(&self, _message: &str) {}
}

/// Closure-based handler set built by `Talent`'s `on_event`/`on_error`/
/// `on_platform_event`/`rules` builder methods ("callback mode").
#[derive(Default)]
pub struct ClosureHandlers {
    /// Extra rules closure, if registered.
    pub get_rules: Option<Box<dyn Fn() -> Option<Rule> + Send + Sync>>,
    /// Event callback, if registered.
    pub on_event: Option<Box<dyn Fn(Event, EventContext) -> BoxFuture + Send + Sync>>,
    /// Platform event callback, if registered.
    pub on_platform_event: Option<Box<dyn Fn(PlatformEvent) -> BoxFuture + Send + Sync>>,
    /// Error callback, if registered.
    pub on_error: Option<Box<dyn Fn(String) -> BoxFuture + Send + Sync>>,
}

#[async_trait]
impl TalentHandlers for ClosureHandlers {
    fn on_get_rules(&self) -> Option<Rule> {
        self.get_rules.as_ref().and_then(|f| f())
    }

    async fn on_event(&self, event: &Event, ctx: &EventContext) {
        if let Some(f) = &self.on_event {
            f(event.clone(), ctx.clone()).await;
        }
    }

    async fn on_platform_event(&self, evt: &PlatformEvent) {
        if let Some(f) = &self.on_platform_event {
            f(evt.clone()).await;
        }
    }

    async fn on_error(&self, message: &str) {
        if let Some(f) = &self.on_error {
            f(message.to_string()).await;
        }
    }
}
