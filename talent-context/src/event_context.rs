//! `EventContext` — emit events, issue calls, gather replies (spec §4.E).

use crate::error::ContextError;
use crate::sink::GathererSink;
use serde_json::Value;
use std::sync::Arc;
use talent_codec::event_frame;
use talent_core::{Callee, CallId, CallToken, Clock, ChannelId, OutgoingCall, Subject, TalentId};
use talent_correlator::SinkGatherer;
use talent_gateway::{PublishOptions, Publisher};
use tracing::warn;

/// Mints a fresh call id / channel id. Injected so tests can supply a
/// deterministic generator (spec §9 "UUID generation").
pub type UuidFn = Arc<dyn Fn() -> String + Send + Sync>;

/// The default UUID factory: a random v4 UUID, textual (spec §6).
pub fn random_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Carries everything needed to emit an event, issue a call, and gather
/// replies to a set of calls (spec §4.E).
///
/// Cheaply `Clone`: every field is an `Arc`, a small value type, or a
/// `String` — cloning a context never clones the correlator or gateway
/// it points at, only the handle.
#[derive(Clone)]
pub struct EventContext {
    pub(crate) self_talent_id: TalentId,
    pub(crate) channel_id: ChannelId,
    pub(crate) subject: Subject,
    pub(crate) return_topic: String,
    pub(crate) callees: Arc<[Callee]>,
    pub(crate) correlator: Arc<dyn GathererSink>,
    pub(crate) gateway: Arc<dyn Publisher>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) uuid_fn: UuidFn,
}

impl EventContext {
    /// Construct a new event context. `callees` is a snapshot of the
    /// owning talent's registered callees — per-talent state is read-only
    /// once the client starts (spec §5), so a plain slice is enough.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        self_talent_id: TalentId,
        channel_id: ChannelId,
        subject: Subject,
        return_topic: impl Into<String>,
        callees: Arc<[Callee]>,
        correlator: Arc<dyn GathererSink>,
        gateway: Arc<dyn Publisher>,
        clock: Arc<dyn Clock>,
        uuid_fn: UuidFn,
    ) -> Self {
        Self {
            self_talent_id,
            channel_id,
            subject,
            return_topic: return_topic.into(),
            callees,
            correlator,
            gateway,
            clock,
            uuid_fn,
        }
    }

    /// The subject carried by every event/call issued from this context.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The channel id this context's owning talent was assigned.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Publish an outgoing event to this context's return topic
    /// (spec §4.E `Emit`).
    pub async fn emit(&self, feature: &str, value: Value, r#type: &str, instance: &str) {
        let frame = event_frame(self.subject.as_str(), feature, &value, r#type, instance, self.clock.now_ms());
        if let Err(err) = self.gateway.publish(&self.return_topic, &frame.to_string(), &PublishOptions::new()).await {
            warn!(%err, topic = %self.return_topic, "failed to publish event");
        }
    }

    /// Issue an outbound call to `callee` (spec §4.E `Call`):
    ///
    /// - `timeout_ms <= 0` is an error.
    /// - an unregistered callee fails fast with the sentinel token
    ///   (no wire activity), logged as a warning.
    /// - args are normalized to a JSON array if not already one.
    pub async fn call(&self, callee: &Callee, args: Value, timeout_ms: i64) -> Result<CallToken, ContextError> {
        if timeout_ms <= 0 {
            return Err(ContextError::InvalidArgument(timeout_ms));
        }

        if !self.callees.iter().any(|c| c == callee) {
            warn!(talent_id = callee.talent_id(), func = callee.func(), "call to unregistered callee");
            return Ok(CallToken::sentinel());
        }

        let emitted_at_ms = self.clock.now_ms();
        let call_id = CallId::new((self.uuid_fn)());
        let normalized_args = normalize_args(args);

        let outgoing = OutgoingCall {
            callee_talent_id: TalentId::new(callee.talent_id()),
            func: callee.func().to_string(),
            callee_type: callee.r#type().to_string(),
            args: normalized_args,
            call_id: call_id.clone(),
            channel_id: self.channel_id.clone(),
            subject: self.subject.clone(),
            timeout_at_ms: emitted_at_ms + timeout_ms,
            emitted_at_ms,
        };

        let frame = talent_codec::call_frame(&outgoing);
        if let Err(err) = self.gateway.publish(&self.return_topic, &frame.to_string(), &PublishOptions::new()).await {
            warn!(%err, topic = %self.return_topic, "failed to publish call");
        }

        Ok(CallToken::new(call_id, timeout_ms))
    }

    /// Construct a sink gatherer over `tokens` and hand it to the
    /// correlator (spec §4.E `Gather`).
    pub async fn gather(
        &self,
        sink: Box<dyn Fn(Vec<Value>) + Send + Sync>,
        timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
        tokens: &[CallToken],
    ) {
        let gatherer = SinkGatherer::new(tokens, self.clock.now_ms(), sink, timeout_handler);
        self.correlator.add(Box::new(gatherer)).await;
    }
}

/// Normalize a scalar JSON value to a single-element array; pass arrays
/// through unchanged (spec §3 "Args are always normalized to a JSON array").
pub(crate) fn normalize_args(args: Value) -> Value {
    match args {
        Value::Array(_) => args,
        other => Value::Array(vec![other]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use talent_core::FixedClock;
    use talent_correlator::GathererDyn;

    struct RecordingPublisher {
        count: AtomicUsize,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, _topic: &str, _message: &str, _opts: &PublishOptions) -> Result<(), talent_gateway::GatewayError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoopSink;

    #[async_trait]
    impl GathererSink for NoopSink {
        async fn add(&self, _gatherer: Box<dyn GathererDyn>) {}
    }

    fn context(callees: Vec<Callee>, publisher: Arc<RecordingPublisher>) -> EventContext {
        EventContext::new(
            TalentId::new("caller"),
            ChannelId::new("chnl1"),
            Subject::new("subj"),
            "talent/caller/events",
            callees.into(),
            Arc::new(NoopSink),
            publisher,
            FixedClock::new(1_000),
            Arc::new(|| "fixed-uuid".to_string()),
        )
    }

    #[tokio::test]
    async fn call_to_unregistered_callee_returns_sentinel_without_publishing() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = context(vec![], publisher.clone());
        let callee = Callee::new("provider", "echo", "default");

        let token = ctx.call(&callee, serde_json::json!("hi"), 1_000).await.unwrap();
        assert!(token.is_sentinel());
        assert_eq!(publisher.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_positive_timeout_is_an_error() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = context(vec![Callee::new("provider", "echo", "default")], publisher);
        let callee = Callee::new("provider", "echo", "default");

        let err = ctx.call(&callee, serde_json::json!("hi"), 0).await.unwrap_err();
        assert!(matches!(err, ContextError::InvalidArgument(0)));
    }

    #[tokio::test]
    async fn registered_callee_call_publishes_and_returns_relative_timeout() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = context(vec![Callee::new("provider", "echo", "default")], publisher.clone());
        let callee = Callee::new("provider", "echo", "default");

        let token = ctx.call(&callee, serde_json::json!("hi"), 1_000).await.unwrap();
        assert!(!token.is_sentinel());
        assert_eq!(token.timeout_ms(), 1_000);
        assert_eq!(publisher.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scalar_args_are_normalized_to_an_array() {
        assert_eq!(normalize_args(serde_json::json!("hi")), serde_json::json!(["hi"]));
        assert_eq!(normalize_args(serde_json::json!(["hi"])), serde_json::json!(["hi"]));
    }
}
