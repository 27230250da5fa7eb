//! Outbound wire encoding: events, calls, and replies (spec §4.C).
//!
//! Each builder renders exactly the JSON shape spec §4.C fixes for that
//! frame kind. None of them parse anything — that's `inbound.rs` — they
//! only ever produce a `Value` ready to hand to a `Publisher`.

use serde_json::{json, Value};
use talent_core::OutgoingCall;

/// Render an outgoing event frame: `{subject, feature, value, type,
/// instance, whenMs}` (`original_source/lib/src/event.cpp::Event::Json`).
pub fn event_frame(subject: &str, feature: &str, value: &Value, r#type: &str, instance: &str, when_ms: i64) -> Value {
    json!({
        "subject": subject,
        "feature": feature,
        "value": value,
        "type": r#type,
        "instance": instance,
        "whenMs": when_ms,
    })
}

/// Render an outgoing call frame (spec §4.C, `call.cpp::OutgoingCall::Json`).
///
/// `feature` is `<callee-talent>.<func>-in`; `value.timeoutAtMs` is the
/// call's absolute deadline, already computed by the caller as
/// `emitted_at_ms + timeout_ms`.
pub fn call_frame(call: &OutgoingCall) -> Value {
    json!({
        "subject": call.subject.as_str(),
        "feature": call.feature(),
        "type": call.callee_type,
        "value": {
            "func": call.func,
            "args": call.args,
            "call": call.call_id.as_str(),
            "chnl": call.channel_id.as_str(),
            "timeoutAtMs": call.timeout_at_ms,
        },
        "whenMs": call.emitted_at_ms,
    })
}

/// Everything needed to render a reply frame without retaining the
/// original call event — the correlator's "prepared reply" record
/// (spec §4.D).
#[derive(Debug, Clone)]
pub struct PreparedReply {
    /// The replying talent's own id.
    pub self_talent_id: String,
    /// The output feature the reply is published on (`<self>.<fn>-out`).
    pub out_feature: String,
    /// The causal-chain subject carried from the originating call.
    pub subject: String,
    /// The caller's channel id, used to route the reply back to them.
    pub caller_channel: String,
    /// The caller's call id, so they can match the reply to their token.
    pub caller_call: String,
    /// The type to publish the reply under.
    pub r#type: String,
    /// The instance to publish the reply under.
    pub instance: String,
    /// Where to publish the reply frame.
    pub return_topic: String,
}

/// Render a reply frame (spec §4.C):
/// `{subject, feature, type, instance, value: {$tsuffix, $vpath, value}, whenMs}`.
pub fn reply_frame(prepared: &PreparedReply, value: &Value, now_ms: i64) -> Value {
    json!({
        "subject": prepared.subject,
        "feature": format!("{}.{}", prepared.self_talent_id, prepared.out_feature),
        "type": prepared.r#type,
        "instance": prepared.instance,
        "value": {
            "$tsuffix": format!("/{}/{}", prepared.caller_channel, prepared.caller_call),
            "$vpath": "value",
            "value": value,
        },
        "whenMs": now_ms,
    })
}
