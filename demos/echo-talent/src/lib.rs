//! Demo talents: an echo function provider, a consumer that calls it, and
//! an observer that watches the provider's output events.
//!
//! Grounded on `original_source/src/sdk/cpp/examples/echo/` (`echo_provider.cpp`,
//! `echo_consumer.cpp`, `echo_observer.cpp`), wired together over a single
//! in-process [`talent_adapter_local::LocalAdapter`] in the `echo_demo`
//! binary rather than three separate OS processes — no MQTT adapter exists
//! in this workspace (spec §6: out of scope), so a multi-process demo would
//! have nothing to actually carry messages between them. See DESIGN.md.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use talent::{FunctionHandler, FunctionTalent, Talent};
use talent_context::CallContext;
use talent_schema::constraint::{is_set, ConstraintOptions};
use talent_schema::rule::{Combinator, Rules};
use talent_schema::{Metadata, Rule};

const PROVIDER_NAME: &str = "echo_provider";
const CONSUMER_NAME: &str = "echo_consumer";
const OBSERVER_NAME: &str = "echo_observer";

fn string_metadata(description: &str) -> Metadata {
    Metadata { description: description.to_string(), history: 30, ttl: 1_000, unit: "ONE".to_string(), encoding: serde_json::json!({"type": "String"}) }
}

fn number_metadata(description: &str) -> Metadata {
    Metadata { description: description.to_string(), history: 30, ttl: 1_000, unit: "ONE".to_string(), encoding: serde_json::json!({"type": "Number"}) }
}

struct EchoState {
    count: AtomicU64,
}

struct Echo {
    state: Arc<EchoState>,
}

#[async_trait]
impl FunctionHandler for Echo {
    async fn call(&self, args: Value, ctx: &CallContext) {
        let message = args.as_array().and_then(|a| a.first()).and_then(Value::as_str).unwrap_or_default().to_uppercase();
        let count = self.state.count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(message, "received echo call");

        ctx.reply(Value::String(message.clone())).await;
        tracing::info!(message, "replied echo");

        ctx.emit(&format!("{PROVIDER_NAME}.echoCount"), serde_json::json!(count), "default", "").await;
        ctx.emit(&format!("{PROVIDER_NAME}.echoResponseSent"), Value::String(message), "default", "").await;
    }
}

struct GetEchoCount {
    state: Arc<EchoState>,
}

#[async_trait]
impl FunctionHandler for GetEchoCount {
    async fn call(&self, _args: Value, ctx: &CallContext) {
        let count = self.state.count.load(Ordering::SeqCst);
        tracing::info!(count, "received getEchoCount call");
        ctx.reply(serde_json::json!(count)).await;
    }
}

struct SetEchoCount {
    state: Arc<EchoState>,
}

#[async_trait]
impl FunctionHandler for SetEchoCount {
    async fn call(&self, args: Value, ctx: &CallContext) {
        let Some(new_count) = args.as_array().and_then(|a| a.first()).and_then(Value::as_u64) else {
            ctx.reply(Value::Null).await;
            return;
        };
        tracing::info!(new_count, "received setEchoCount call");
        let previous = self.state.count.swap(new_count, Ordering::SeqCst);
        if previous != new_count {
            ctx.emit(&format!("{PROVIDER_NAME}.echoCount"), serde_json::json!(new_count), "default", "").await;
        }
        ctx.reply(Value::Null).await;
    }
}

/// Build the `echo_provider` function talent: `echo`, `getEchoCount`, and
/// `setEchoCount`, plus the `echoCount`/`echoResponseSent` notification
/// outputs (`echo_provider.cpp`'s `EchoProvider`).
pub fn build_echo_provider() -> FunctionTalent {
    let state = Arc::new(EchoState { count: AtomicU64::new(0) });
    let mut ft = FunctionTalent::new(Talent::new(PROVIDER_NAME));
    ft.register_function("echo", Arc::new(Echo { state: state.clone() }));
    ft.register_function("getEchoCount", Arc::new(GetEchoCount { state: state.clone() }));
    ft.register_function("setEchoCount", Arc::new(SetEchoCount { state }));
    ft.base_mut().add_output("echoCount", number_metadata("Count event triggered by calls to 'echo' function."));
    ft.base_mut().add_output("echoResponseSent", string_metadata("Message event triggered by calls to 'echo' function."));
    ft
}

/// Build the `echo_consumer` talent: forwards any message it receives on
/// its own `messageString` output to `echo_provider.echo` and logs the
/// reply (`echo_consumer.cpp`'s `EchoConsumer`).
pub fn build_echo_consumer() -> Talent {
    let mut t = Talent::new(CONSUMER_NAME);
    t.add_output("messageString", string_metadata("Message to be forwarded to echo provider"));
    let echo = t.register_callee(PROVIDER_NAME, "echo", "default");

    let rule: Rule = is_set(format!("{CONSUMER_NAME}.messageString"), ConstraintOptions::default()).into();

    t.rules(rule).on_event(move |event, ctx| {
        let echo = echo.clone();
        Box::pin(async move {
            if event.r#type != "default" {
                tracing::warn!(r#type = event.r#type, "unexpected event type");
                return;
            }
            let Some(message) = event.value.as_str() else {
                tracing::warn!("message event carried a non-string value");
                return;
            };
            tracing::info!(message, "received message");

            let Ok(token) = ctx.call(&echo, serde_json::json!(message), 5_000).await else {
                tracing::warn!("failed to issue echo call");
                return;
            };

            let sink: Box<dyn Fn(Vec<Value>) + Send + Sync> = Box::new(|replies| {
                tracing::info!(reply = ?replies.first(), "received echo");
            });
            ctx.gather(sink, None, &[token]).await;
            tracing::info!(message, "forwarded message");
        })
    })
}

/// Build the `echo_observer` talent: logs every `echoResponseSent`/
/// `echoCount` event the provider emits (`echo_observer.cpp`'s
/// `EchoObserver`).
pub fn build_echo_observer() -> Talent {
    let echo_response_feature = format!("{PROVIDER_NAME}.echoResponseSent");
    let echo_count_feature = format!("{PROVIDER_NAME}.echoCount");

    let mut rules = Rules::new(Combinator::Or);
    rules.add(is_set(echo_response_feature.clone(), ConstraintOptions::default()).into());
    rules.add(is_set(echo_count_feature.clone(), ConstraintOptions::default()).into());

    Talent::new(OBSERVER_NAME).rules(rules.into()).on_event(move |event, _ctx| {
        let echo_response_feature = echo_response_feature.clone();
        let echo_count_feature = echo_count_feature.clone();
        Box::pin(async move {
            if event.feature == echo_response_feature {
                tracing::info!(message = ?event.value, "received echo");
            } else if event.feature == echo_count_feature {
                tracing::info!(count = ?event.value, "received echoCount");
            } else {
                tracing::warn!(feature = event.feature, "unknown event received");
            }
        })
    })
}
