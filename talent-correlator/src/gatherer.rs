//! Gatherers: the correlator's state machine for "wait on N calls, then
//! run a continuation" (spec §3, §4.D), grounded on
//! `original_source/lib/include/call.hpp` + `lib/src/call.cpp`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use talent_codec::{reply_frame, PreparedReply};
use talent_core::{CallId, CallToken};
use talent_gateway::{Publisher, PublishOptions};
use tracing::warn;

/// Shared bookkeeping for "which call ids are expected, which have arrived,
/// in what order" — used by both gatherer kinds.
///
/// Reply ordering is insertion order: `collected_order` records the order
/// replies actually arrived in, not the order tokens were passed to the
/// constructor (DESIGN.md Open Question #2).
struct GatherState {
    expected: HashSet<CallId>,
    collected: HashMap<CallId, Value>,
    collected_order: Vec<CallId>,
    deadline_ms: i64,
}

impl GatherState {
    /// Deadline = `now_ms + min(token.timeout_ms)`, computed once here and
    /// never recomputed later (DESIGN NOTES §9 point 2, preserved from
    /// `Gatherer::Gatherer`).
    fn new(tokens: &[CallToken], now_ms: i64) -> Self {
        let min_timeout = tokens.iter().map(CallToken::timeout_ms).min().unwrap_or(0);
        Self {
            expected: tokens.iter().map(|t| t.call_id().clone()).collect(),
            collected: HashMap::new(),
            collected_order: Vec::new(),
            deadline_ms: now_ms + min_timeout,
        }
    }

    fn wants(&self, call_id: &CallId) -> bool {
        self.expected.contains(call_id)
    }

    fn gather(&mut self, call_id: &CallId, value: Value) -> bool {
        if self.wants(call_id) && !self.collected.contains_key(call_id) {
            self.collected.insert(call_id.clone(), value);
            self.collected_order.push(call_id.clone());
        }
        self.collected.len() == self.expected.len()
    }

    fn get_replies(&self) -> Vec<Value> {
        self.collected_order.iter().map(|id| self.collected[id].clone()).collect()
    }
}

/// Object-safe gatherer interface the correlator stores as a trait object
/// (spec §4.D). `Gather`/`Wants` mirror the spec's operations exactly;
/// `ForwardReplies`/`TimeOut` are the two ways a gatherer's continuation
/// can run.
#[async_trait]
pub trait GathererDyn: Send + Sync {
    /// Whether `call_id` is one of this gatherer's expected ids.
    fn wants(&self, call_id: &CallId) -> bool;

    /// This gatherer's absolute deadline, ms since epoch.
    fn deadline_ms(&self) -> i64;

    /// Store `value` under `call_id` if expected. Returns `true` iff every
    /// expected reply has now been gathered.
    fn gather(&mut self, call_id: &CallId, value: Value) -> bool;

    /// The gathered replies, in the canonical (insertion) order.
    fn get_replies(&self) -> Vec<Value>;

    /// Run this gatherer's continuation over `replies` (already the result
    /// of [`GathererDyn::get_replies`]).
    async fn forward_replies(&self, replies: Vec<Value>, now_ms: i64);

    /// Invoke the timeout handler, if one was supplied. No-op otherwise.
    fn time_out(&self);
}

/// A gatherer whose continuation is a plain sink: the user callback
/// receives the reply list and returns nothing further.
pub struct SinkGatherer {
    state: GatherState,
    sink: Box<dyn Fn(Vec<Value>) + Send + Sync>,
    timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SinkGatherer {
    /// Construct a sink gatherer over `tokens`, with `now_ms` used to fix
    /// the deadline once.
    pub fn new(
        tokens: &[CallToken],
        now_ms: i64,
        sink: Box<dyn Fn(Vec<Value>) + Send + Sync>,
        timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Self {
        Self { state: GatherState::new(tokens, now_ms), sink, timeout_handler }
    }
}

#[async_trait]
impl GathererDyn for SinkGatherer {
    fn wants(&self, call_id: &CallId) -> bool {
        self.state.wants(call_id)
    }

    fn deadline_ms(&self) -> i64 {
        self.state.deadline_ms
    }

    fn gather(&mut self, call_id: &CallId, value: Value) -> bool {
        self.state.gather(call_id, value)
    }

    fn get_replies(&self) -> Vec<Value> {
        self.state.get_replies()
    }

    async fn forward_replies(&self, replies: Vec<Value>, _now_ms: i64) {
        (self.sink)(replies);
    }

    fn time_out(&self) {
        if let Some(handler) = &self.timeout_handler {
            handler();
        }
    }
}

/// A gatherer whose continuation reduces the replies to a single value and
/// publishes it as a reply frame, via the [`PreparedReply`] record captured
/// at construction (spec §4.D "prepared-reply record").
pub struct ReplyGatherer {
    state: GatherState,
    reducer: Box<dyn Fn(Vec<Value>) -> Value + Send + Sync>,
    timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
    prepared: PreparedReply,
    publisher: Arc<dyn Publisher>,
}

impl ReplyGatherer {
    /// Construct a reply gatherer over `tokens`, reducing to a reply value
    /// published through `publisher` using `prepared`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tokens: &[CallToken],
        now_ms: i64,
        reducer: Box<dyn Fn(Vec<Value>) -> Value + Send + Sync>,
        timeout_handler: Option<Box<dyn Fn() + Send + Sync>>,
        prepared: PreparedReply,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self { state: GatherState::new(tokens, now_ms), reducer, timeout_handler, prepared, publisher }
    }
}

#[async_trait]
impl GathererDyn for ReplyGatherer {
    fn wants(&self, call_id: &CallId) -> bool {
        self.state.wants(call_id)
    }

    fn deadline_ms(&self) -> i64 {
        self.state.deadline_ms
    }

    fn gather(&mut self, call_id: &CallId, value: Value) -> bool {
        self.state.gather(call_id, value)
    }

    fn get_replies(&self) -> Vec<Value> {
        self.state.get_replies()
    }

    async fn forward_replies(&self, replies: Vec<Value>, now_ms: i64) {
        let value = (self.reducer)(replies);
        let frame = reply_frame(&self.prepared, &value, now_ms);
        if let Err(err) = self.publisher.publish(&self.prepared.return_topic, &frame.to_string(), &PublishOptions::new()).await {
            warn!(%err, topic = %self.prepared.return_topic, "failed to publish gathered reply");
        }
    }

    fn time_out(&self) {
        if let Some(handler) = &self.timeout_handler {
            handler();
        }
    }
}
