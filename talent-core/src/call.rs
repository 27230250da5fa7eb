//! `CallToken` and `OutgoingCall` — the data needed to issue and later
//! correlate a remote function call (spec §3, §4.D, §4.E).

use crate::id::{CallId, ChannelId, Subject, TalentId};
use serde_json::Value;

/// A handle to a pending call: `(call-id, timeout)`.
///
/// `timeout` is a **relative** duration in milliseconds, fixed at
/// construction time — not an absolute deadline. The absolute deadline is
/// a property of the `Gatherer` that watches one or more tokens, computed
/// as `now_ms + min(tokens.timeout)` (DESIGN NOTES §9.2, preserved from
/// `original_source/lib/src/call.cpp::Gatherer::Gatherer`).
///
/// A token with `timeout <= 0` is a valid sentinel meaning "already
/// expired" — minted when a callee isn't registered, or when a chained
/// call's clamped deadline has already passed (spec §4.E).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToken {
    call_id: CallId,
    timeout_ms: i64,
}

impl CallToken {
    /// Construct a new call token.
    pub fn new(call_id: CallId, timeout_ms: i64) -> Self {
        Self { call_id, timeout_ms }
    }

    /// The sentinel token returned when a call cannot be issued: empty id,
    /// timeout -1 (spec §4.E: fail fast on an unregistered callee).
    pub fn sentinel() -> Self {
        Self {
            call_id: CallId::new(""),
            timeout_ms: -1,
        }
    }

    /// The expired-immediately token minted for a chained call whose outer
    /// deadline has already passed (spec §4.E).
    pub fn expired(call_id: CallId) -> Self {
        Self { call_id, timeout_ms: 0 }
    }

    /// The call id this token refers to.
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// The relative timeout, in milliseconds, recorded at construction.
    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// Whether this is the sentinel token (empty call id).
    pub fn is_sentinel(&self) -> bool {
        self.call_id.as_str().is_empty()
    }
}

/// Everything needed to emit an outgoing function call (spec §3).
///
/// Args are always normalized to a JSON array before construction — the
/// caller (an `EventContext`/`CallContext`) is responsible for that
/// normalization, matching spec §4.E's `Call` operation.
#[derive(Debug, Clone)]
pub struct OutgoingCall {
    /// The talent id providing the function being called.
    pub callee_talent_id: TalentId,
    /// The function name being called.
    pub func: String,
    /// The type associated with the called function.
    pub callee_type: String,
    /// Arguments, already normalized to a JSON array.
    pub args: Value,
    /// Unique id for this call.
    pub call_id: CallId,
    /// The caller's channel id, used to route the reply back.
    pub channel_id: ChannelId,
    /// The causal-chain subject carried from the triggering event/context.
    pub subject: Subject,
    /// Absolute deadline in ms since epoch: `emitted_at_ms + timeout_ms`.
    pub timeout_at_ms: i64,
    /// When this call was emitted, ms since epoch.
    pub emitted_at_ms: i64,
}

impl OutgoingCall {
    /// The feature name this call is addressed to: `<callee-talent>.<func>-in`.
    pub fn feature(&self) -> String {
        crate::feature::in_name(self.callee_talent_id.as_str(), &self.func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_token_is_recognizable() {
        let t = CallToken::sentinel();
        assert!(t.is_sentinel());
        assert_eq!(t.timeout_ms(), -1);
    }

    #[test]
    fn expired_token_keeps_its_call_id() {
        let t = CallToken::expired(CallId::new("abc"));
        assert!(!t.is_sentinel());
        assert_eq!(t.timeout_ms(), 0);
        assert_eq!(t.call_id().as_str(), "abc");
    }

    #[test]
    fn outgoing_call_feature_name() {
        let call = OutgoingCall {
            callee_talent_id: TalentId::new("provider"),
            func: "echo".into(),
            callee_type: "default".into(),
            args: serde_json::json!(["hi"]),
            call_id: CallId::new("c1"),
            channel_id: ChannelId::new("chnl1"),
            subject: Subject::new("subj"),
            timeout_at_ms: 2000,
            emitted_at_ms: 1000,
        };
        assert_eq!(call.feature(), "provider.echo-in");
    }
}
