//! `CallContext` — an `EventContext` handed to a function handler while
//! servicing an inbound call, adding `Reply`/`GatherAndReply` and a
//! timeout-clamped `Call` (spec §4.E).

use crate::error::ContextError;
use crate::event_context::{normalize_args, EventContext};
use serde_json::Value;
use std::ops::Deref;
use talent_codec::PreparedReply;
use talent_core::{Callee, CallId, CallToken, Event, OutgoingCall, TalentId};
use talent_correlator::ReplyGatherer;

/// An `EventContext` plus the bookkeeping needed to reply to the call that
/// triggered it, and to clamp nested calls to the outer deadline.
#[derive(Clone)]
pub struct CallContext {
    inner: EventContext,
    /// The event that carried this call.
    pub event: Event,
    /// The output feature a reply is published under (`<self>.<fn>-out`).
    pub out_feature: String,
    /// The caller's channel id, so the reply routes back to them.
    pub caller_channel: String,
    /// The caller's call id, so the reply matches their token.
    pub caller_call: String,
    /// This call's absolute deadline, ms since epoch.
    pub timeout_at_ms: i64,
}

impl Deref for CallContext {
    type Target = EventContext;

    fn deref(&self) -> &EventContext {
        &self.inner
    }
}

impl CallContext {
    /// Construct a call context wrapping `inner`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(inner: EventContext, event: Event, out_feature: impl Into<String>, caller_channel: impl Into<String>, caller_call: impl Into<String>, timeout_at_ms: i64) -> Self {
        Self {
            inner,
            event,
            out_feature: out_feature.into(),
            caller_channel: caller_channel.into(),
            caller_call: caller_call.into(),
            timeout_at_ms,
        }
    }

    fn prepared_reply(&self) -> PreparedReply {
        PreparedReply {
            self_talent_id: self.inner.self_talent_id.as_str().to_string(),
            out_feature: self.out_feature.clone(),
            subject: self.inner.subject.as_str().to_string(),
            caller_channel: self.caller_channel.clone(),
            caller_call: self.caller_call.clone(),
            r#type: self.event.r#type.clone(),
            instance: self.event.instance.clone(),
            return_topic: self.inner.return_topic.clone(),
        }
    }

    /// Issue a nested call whose effective timeout is clamped to this
    /// context's outer deadline (spec §4.E, §5 invariant 6):
    /// `effective = min(requested, timeout_at_ms - now)`. If that's
    /// already `<= 0`, returns a zero-timeout token with **no publish** —
    /// the correlator will sweep it on its next pass.
    pub async fn call(&self, callee: &Callee, args: Value, timeout_ms: i64) -> Result<CallToken, ContextError> {
        if timeout_ms <= 0 {
            return Err(ContextError::InvalidArgument(timeout_ms));
        }

        let now_ms = self.inner.clock.now_ms();
        let remaining = self.timeout_at_ms - now_ms;
        let effective_timeout_ms = timeout_ms.min(remaining);

        if effective_timeout_ms <= 0 {
            return Ok(CallToken::expired(CallId::new((self.inner.uuid_fn)())));
        }

        if !self.inner.callees.iter().any(|c| c == callee) {
            tracing::warn!(talent_id = callee.talent_id(), func = callee.func(), "call to unregistered callee");
            return Ok(CallToken::sentinel());
        }

        let call_id = CallId::new((self.inner.uuid_fn)());
        let normalized_args = normalize_args(args);

        let outgoing = OutgoingCall {
            callee_talent_id: TalentId::new(callee.talent_id()),
            func: callee.func().to_string(),
            callee_type: callee.r#type().to_string(),
            args: normalized_args,
            call_id: call_id.clone(),
            channel_id: self.inner.channel_id.clone(),
            subject: self.inner.subject.clone(),
            timeout_at_ms: now_ms + effective_timeout_ms,
            emitted_at_ms: now_ms,
        };

        let frame = talent_codec::call_frame(&outgoing);
        if let Err(err) = self.inner.gateway.publish(&self.inner.return_topic, &frame.to_string(), &talent_gateway::PublishOptions::new()).await {
            tracing::warn!(%err, topic = %self.inner.return_topic, "failed to publish nested call");
        }

        Ok(CallToken::new(call_id, effective_timeout_ms))
    }

    /// Emit a reply wire form for this call (spec §4.E `Reply`, §4.C reply
    /// frame shape).
    pub async fn reply(&self, value: Value) {
        let prepared = self.prepared_reply();
        let frame = talent_codec::reply_frame(&prepared, &value, self.inner.clock.now_ms());
        if let Err(err) = self.inner.gateway.publish(&prepared.return_topic, &frame.to_string(), &talent_gateway::PublishOptions::new()).await {
            tracing::warn!(%err, topic = %prepared.return_topic, "failed to publish reply");
        }
    }

    /// Construct a reply gatherer over `tokens`, whose reducer's return
    /// value becomes the replied value (spec §4.E `GatherAndReply`).
    pub async fn gather_and_reply(
        &self,
        reducer: Box<dyn Fn(Vec<Value>) -> Value + Send + Sync>,
        timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
        tokens: &[CallToken],
    ) {
        let gatherer = ReplyGatherer::new(
            tokens,
            self.inner.clock.now_ms(),
            reducer,
            timeout_handler,
            self.prepared_reply(),
            self.inner.gateway.clone(),
        );
        self.inner.correlator.add(Box::new(gatherer)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::GathererSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use talent_core::{ChannelId, FixedClock, Subject};
    use talent_correlator::GathererDyn;
    use talent_gateway::GatewayError;

    struct RecordingPublisher {
        count: AtomicUsize,
    }

    #[async_trait]
    impl talent_gateway::Publisher for RecordingPublisher {
        async fn publish(&self, _topic: &str, _message: &str, _opts: &talent_gateway::PublishOptions) -> Result<(), GatewayError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoopSink;

    #[async_trait]
    impl GathererSink for NoopSink {
        async fn add(&self, _gatherer: Box<dyn GathererDyn>) {}
    }

    fn call_context(timeout_at_ms: i64, now_ms: i64, publisher: Arc<RecordingPublisher>) -> CallContext {
        let inner = EventContext::new(
            TalentId::new("f"),
            ChannelId::new("chnlF"),
            Subject::new("subj"),
            "talent/f/events",
            vec![Callee::new("inner", "deep", "default")].into(),
            Arc::new(NoopSink),
            publisher,
            FixedClock::new(now_ms),
            Arc::new(|| "nested-uuid".to_string()),
        );
        let event = Event {
            subject: Subject::new("subj"),
            feature: "default.f.slow-in".into(),
            value: serde_json::json!({"func":"slow","args":[]}),
            r#type: "default".into(),
            instance: String::new(),
            return_topic: Some("talent/caller/events".into()),
            when_ms: now_ms,
        };
        CallContext::new(inner, event, "slow-out", "c1", "u1", timeout_at_ms)
    }

    #[tokio::test]
    async fn nested_call_timeout_is_clamped_to_outer_deadline() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = call_context(1_000, 0, publisher);
        let callee = Callee::new("inner", "deep", "default");

        let token = ctx.call(&callee, serde_json::json!([]), 5_000).await.unwrap();
        assert!(token.timeout_ms() <= 1_000);
    }

    #[tokio::test]
    async fn already_expired_outer_deadline_yields_expired_token_with_no_publish() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = call_context(-100, 0, publisher.clone());
        let callee = Callee::new("inner", "deep", "default");

        let token = ctx.call(&callee, serde_json::json!([]), 5_000).await.unwrap();
        assert_eq!(token.timeout_ms(), 0);
        assert_eq!(publisher.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reply_publishes_a_reply_frame_to_the_triggering_return_topic() {
        let publisher = Arc::new(RecordingPublisher { count: AtomicUsize::new(0) });
        let ctx = call_context(10_000, 0, publisher.clone());
        ctx.reply(serde_json::json!("hi")).await;
        assert_eq!(publisher.count.load(Ordering::SeqCst), 1);
    }
}
