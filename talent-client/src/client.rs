//! `Client` and `ClientBuilder` — the router (spec §4.H).
//!
//! Grounded on `original_source/lib/src/client.cpp` (`Client::Start`,
//! `SubscribeInternal`, `HandleEvent`, `HandleAsCall`, `HandleCallReply`,
//! `HandleDiscover`, `HandlePlatformEvent`, `Receive`, `UpdateTime`).
//!
//! One deliberate departure from the original: there, every context handed
//! to a talent's handler is built from the internal `CalleeTalent`'s id,
//! channel id, and callee list, regardless of which talent is actually
//! being dispatched to. Here every talent already carries its own callee
//! list (`Talent::callees`), and `EventContext::call` validates a callee
//! against *that* list — so each talent's context is built from its own
//! id/channel/callees instead of being funneled through one shared
//! internal talent. The "internal callee talent" that remains exists only
//! to give `ClientBuilder::create_callee`/`Client::subscribe` callers a
//! talent to hang ad-hoc callees and subscriptions off of when they don't
//! have one of their own (see DESIGN.md).

use crate::error::ClientError;
use crate::topic::{Route, Topics, DEFAULT_NAMESPACE};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use talent::{BoxFuture, FunctionTalent, Talent};
use talent_codec::{InboundMessage, PlatformEvent};
use talent_context::{random_uuid, CallContext, EventContext, GathererSink, UuidFn};
use talent_core::{Callee, CallId, Clock, Event, SystemClock};
use talent_correlator::{GathererDyn, ReplyCorrelator};
use talent_gateway::{Gateway, OnMsg, PublishOptions, Publisher, SubscribeOptions};
use talent_schema::Rule;
use tokio::sync::Mutex as AsyncMutex;

/// The narrow capability contexts are handed: "add a gatherer to the
/// correlator behind this mutex" (spec §3 ownership).
struct CorrelatorSink {
    correlator: Arc<AsyncMutex<ReplyCorrelator>>,
}

#[async_trait]
impl GathererSink for CorrelatorSink {
    async fn add(&self, gatherer: Box<dyn GathererDyn>) {
        self.correlator.lock().await.add(gatherer);
    }
}

/// Collects talents and configuration, then assembles a running [`Client`]
/// (spec §4.H startup sequence).
pub struct ClientBuilder {
    gateway: Gateway,
    namespace: String,
    clock: Arc<dyn Clock>,
    uuid_fn: UuidFn,
    callee_talent: Talent,
    talents: HashMap<String, Talent>,
    function_talents: HashMap<String, FunctionTalent>,
    on_error: Option<Box<dyn Fn(String) + Send + Sync>>,
    on_platform_event: Option<Box<dyn Fn(PlatformEvent) + Send + Sync>>,
}

impl ClientBuilder {
    /// Start building a client over `gateway` (already resolved via
    /// `Gateway::initialize`/`Gateway::register` — spec §4.H step 1).
    pub fn new(gateway: Gateway) -> Self {
        let uuid_fn: UuidFn = Arc::new(random_uuid);
        let callee_talent = Talent::new((uuid_fn)());
        Self {
            gateway,
            namespace: DEFAULT_NAMESPACE.to_string(),
            clock: Arc::new(SystemClock),
            uuid_fn,
            callee_talent,
            talents: HashMap::new(),
            function_talents: HashMap::new(),
            on_error: None,
            on_platform_event: None,
        }
    }

    /// Override the topic namespace prefix (default `"iotea"`).
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Inject a clock, for deterministic tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Inject a UUID generator, for deterministic tests.
    pub fn uuid_fn(mut self, uuid_fn: UuidFn) -> Self {
        self.uuid_fn = uuid_fn;
        self
    }

    /// Register a plain talent.
    pub fn register_talent(mut self, talent: Talent) -> Self {
        self.talents.insert(talent.id().as_str().to_string(), talent);
        self
    }

    /// Register a function talent.
    pub fn register_function_talent(mut self, talent: FunctionTalent) -> Self {
        self.function_talents.insert(talent.base().id().as_str().to_string(), talent);
        self
    }

    /// Register a callee on the internal callee talent, for callers that
    /// want to issue calls without a full talent of their own
    /// (`original_source/lib/src/client.cpp::Client::CreateCallee`).
    pub fn create_callee(&mut self, talent_id: impl Into<String>, func: impl Into<String>, r#type: impl Into<String>) -> Callee {
        self.callee_talent.register_callee(talent_id, func, r#type)
    }

    /// Register an anonymous talent matching `rules`, invoking `callback`
    /// on every matching event (`Client::Subscribe` in the original).
    pub fn subscribe(self, rules: Rule, callback: impl Fn(Event, EventContext) -> BoxFuture + Send + Sync + 'static) -> Self {
        let talent = Talent::new((self.uuid_fn)()).rules(rules).on_event(callback);
        self.register_talent(talent)
    }

    /// Register a client-level protocol-error handler (spec §7), invoked
    /// in addition to every talent's own `OnError`.
    pub fn on_error(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Register a client-level platform-event handler, invoked in addition
    /// to every talent's own `OnPlatformEvent`.
    pub fn on_platform_event(mut self, f: impl Fn(PlatformEvent) + Send + Sync + 'static) -> Self {
        self.on_platform_event = Some(Box::new(f));
        self
    }

    /// Run the startup sequence (spec §4.H) and return a running client:
    /// assign channel ids, subscribe every talent's topics, launch the
    /// timeout ticker, and start the gateway.
    pub async fn start(mut self) -> Result<Arc<Client>, ClientError> {
        self.callee_talent.initialize(&self.uuid_fn);
        for talent in self.talents.values_mut() {
            talent.initialize(&self.uuid_fn);
        }
        for function_talent in self.function_talents.values_mut() {
            function_talent.base_mut().initialize(&self.uuid_fn);
        }

        let correlator = Arc::new(AsyncMutex::new(ReplyCorrelator::new()));
        let sink: Arc<dyn GathererSink> = Arc::new(CorrelatorSink { correlator: correlator.clone() });

        let client = Arc::new(Client {
            gateway: Arc::new(self.gateway),
            topics: Topics::new(self.namespace),
            talents: self.talents,
            function_talents: self.function_talents,
            callee_talent: self.callee_talent,
            correlator,
            sink,
            clock: self.clock,
            uuid_fn: self.uuid_fn,
            on_error: self.on_error,
            on_platform_event: self.on_platform_event,
            ticker: std::sync::Mutex::new(None),
        });

        let callee_id = client.callee_talent.id().as_str().to_string();
        let callee_channel = client.callee_talent.channel_id().expect("initialized above").as_str().to_string();
        Client::subscribe_internal(client.clone(), callee_id, callee_channel).await?;

        for talent in client.talents.values() {
            let id = talent.id().as_str().to_string();
            let channel = talent.channel_id().expect("initialized above").as_str().to_string();
            Client::subscribe_internal(client.clone(), id, channel).await?;
        }
        for function_talent in client.function_talents.values() {
            let id = function_talent.base().id().as_str().to_string();
            let channel = function_talent.base().channel_id().expect("initialized above").as_str().to_string();
            Client::subscribe_internal(client.clone(), id, channel).await?;
        }

        client.spawn_ticker();
        client.gateway.start().await?;

        Ok(client)
    }
}

/// The running client: owns the gateway, every registered talent, and the
/// reply correlator, and routes every inbound message to the right handler
/// (spec §4.H).
///
/// Per-talent state is read-only once `start()` returns (spec §5), so the
/// only runtime-shared state is the correlator, guarded by its own mutex —
/// there is no separate "client mutex" to take for routing.
pub struct Client {
    gateway: Arc<Gateway>,
    topics: Topics,
    talents: HashMap<String, Talent>,
    function_talents: HashMap<String, FunctionTalent>,
    callee_talent: Talent,
    correlator: Arc<AsyncMutex<ReplyCorrelator>>,
    sink: Arc<dyn GathererSink>,
    clock: Arc<dyn Clock>,
    uuid_fn: UuidFn,
    on_error: Option<Box<dyn Fn(String) + Send + Sync>>,
    on_platform_event: Option<Box<dyn Fn(PlatformEvent) + Send + Sync>>,
    ticker: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Client {
    /// Stop the ticker and every adapter (spec §4.H `Stop`).
    pub async fn stop(&self) -> Result<(), ClientError> {
        if let Some(handle) = self.ticker.lock().expect("ticker mutex poisoned").take() {
            handle.abort();
        }
        self.gateway.stop().await?;
        Ok(())
    }

    /// This client's topic namespace.
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    async fn subscribe_internal(self: Arc<Self>, talent_id: String, channel_id: String) -> Result<(), ClientError> {
        let opts = SubscribeOptions::default();

        let on_msg: OnMsg = {
            let client = self.clone();
            Arc::new(move |topic: &str, message: &str, adapter_id: &str| {
                let client = client.clone();
                let topic = topic.to_string();
                let message = message.to_string();
                let adapter_id = adapter_id.to_string();
                tokio::spawn(async move {
                    client.receive(&topic, &message, &adapter_id).await;
                });
            })
        };

        self.gateway.subscribe_shared(&talent_id, self.topics.discover_topic(), on_msg.clone(), &opts).await?;
        self.gateway.subscribe_shared(&talent_id, self.topics.platform_events_topic(), on_msg.clone(), &opts).await?;
        self.gateway
            .subscribe_shared(&talent_id, &self.topics.talent_events_topic(&talent_id), on_msg.clone(), &opts)
            .await?;
        self.gateway
            .subscribe(&self.topics.talent_reply_subscribe_topic(&talent_id, &channel_id), on_msg, &opts)
            .await?;

        Ok(())
    }

    fn spawn_ticker(&self) {
        let correlator = self.correlator.clone();
        let clock = self.clock.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                let now_ms = clock.now_ms();
                let expired = { correlator.lock().await.extract_expired(now_ms) };
                for gatherer in expired {
                    gatherer.time_out();
                }
            }
        });
        *self.ticker.lock().expect("ticker mutex poisoned") = Some(handle);
    }

    /// Classify `topic` and dispatch `payload` to the matching handler
    /// (spec §4.H routing table). The public entry point an `Adapter`'s
    /// `on_msg` callback is wired to.
    pub async fn receive(self: Arc<Self>, topic: &str, payload: &str, _adapter_id: &str) {
        match self.topics.route(topic) {
            Route::CallReply { call_id } => self.handle_call_reply(&call_id, payload).await,
            Route::Event { talent_id } => self.handle_event(&talent_id, payload).await,
            Route::Discover => self.handle_discover(payload).await,
            Route::PlatformEvent => self.handle_platform_event(payload).await,
            Route::Unknown => tracing::debug!(topic, "received message on an unrecognized topic"),
        }
    }

    fn event_context_for(&self, talent: &Talent, subject: talent_core::Subject, return_topic: Option<String>) -> EventContext {
        EventContext::new(
            talent.id().clone(),
            talent.channel_id().expect("talent initialized before it can receive events").clone(),
            subject,
            return_topic.unwrap_or_else(|| self.topics.ingestion_events_topic()),
            Arc::from(talent.callees().to_vec()),
            self.sink.clone(),
            self.gateway.clone() as Arc<dyn Publisher>,
            self.clock.clone(),
            self.uuid_fn.clone(),
        )
    }

    async fn handle_event(&self, talent_id: &str, payload: &str) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to parse event payload");
                return;
            }
        };

        match talent_codec::parse_inbound(&value) {
            Ok(InboundMessage::Event(event)) => self.dispatch_event(talent_id, event).await,
            Ok(InboundMessage::Error(code)) => self.dispatch_error(code.message()).await,
            Ok(InboundMessage::Discover { .. }) => tracing::debug!("unexpected discover frame on an events topic"),
            Err(err) => tracing::warn!(%err, "failed to classify event payload"),
        }
    }

    async fn dispatch_event(&self, talent_id: &str, event: Event) {
        if let Some(function_talent) = self.function_talents.get(talent_id) {
            if self.handle_as_call(function_talent, &event).await {
                return;
            }
            let ctx = self.event_context_for(function_talent.base(), event.subject.clone(), event.return_topic.clone());
            function_talent.base().handle_event(&event, &ctx).await;
            return;
        }

        if let Some(talent) = self.talents.get(talent_id) {
            let ctx = self.event_context_for(talent, event.subject.clone(), event.return_topic.clone());
            talent.handle_event(&event, &ctx).await;
            return;
        }

        if self.callee_talent.id().as_str() == talent_id {
            let ctx = self.event_context_for(&self.callee_talent, event.subject.clone(), event.return_topic.clone());
            self.callee_talent.handle_event(&event, &ctx).await;
            return;
        }

        tracing::info!(talent_id, "received event for an unregistered talent");
    }

    /// Attempt to treat `event` as a call to one of `function_talent`'s
    /// registered functions, matching by fully-qualified input feature
    /// (`original_source/lib/src/client.cpp::Client::HandleAsCall`).
    /// Returns `false` if the feature names no registered function.
    async fn handle_as_call(&self, function_talent: &FunctionTalent, event: &Event) -> bool {
        let prefix = format!("{}.", function_talent.base().id());
        let Some(name) = event.feature.strip_prefix(prefix.as_str()).and_then(|f| f.strip_suffix("-in")) else {
            return false;
        };
        if !function_talent.has_function(name) {
            return false;
        }

        let chnl = event.value.get("chnl").and_then(Value::as_str).unwrap_or_default().to_string();
        let call_id = event.value.get("call").and_then(Value::as_str).unwrap_or_default().to_string();
        let timeout_at_ms = event.value.get("timeoutAtMs").and_then(Value::as_i64).unwrap_or(0);
        let args = event.value.get("args").cloned().unwrap_or(Value::Null);

        let inner = self.event_context_for(function_talent.base(), event.subject.clone(), event.return_topic.clone());
        let ctx = CallContext::new(inner, event.clone(), function_talent.output_feature(name), chnl, call_id, timeout_at_ms);

        function_talent.dispatch_call(name, args, &ctx).await
    }

    async fn handle_call_reply(&self, call_id: &str, payload: &str) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to parse call reply payload");
                return;
            }
        };

        let event = match talent_codec::parse_inbound(&value) {
            Ok(InboundMessage::Event(event)) => event,
            Ok(_) => {
                tracing::debug!("unexpected non-event frame on a reply topic");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to classify call reply payload");
                return;
            }
        };

        let reply_value = event.value.get("value").cloned().unwrap_or(Value::Null);
        let id = CallId::new(call_id);

        let ready = {
            let mut correlator = self.correlator.lock().await;
            let Some(mut gatherer) = correlator.extract(&id) else {
                tracing::debug!(call_id, "reply arrived for an unknown or already timed-out call");
                return;
            };
            if gatherer.gather(&id, reply_value) {
                Some(gatherer)
            } else {
                correlator.add(gatherer);
                None
            }
        };

        if let Some(gatherer) = ready {
            let replies = gatherer.get_replies();
            gatherer.forward_replies(replies, self.clock.now_ms()).await;
        }
    }

    async fn handle_discover(&self, payload: &str) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to parse discover payload");
                return;
            }
        };

        let return_topic = match talent_codec::parse_inbound(&value) {
            Ok(InboundMessage::Discover { return_topic, .. }) => return_topic,
            Ok(_) => {
                tracing::debug!("unexpected non-discover frame on the discover topic");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to classify discover payload");
                return;
            }
        };

        for talent in self.talents.values() {
            self.publish_schema(talent.get_schema(), &return_topic, talent.id().as_str()).await;
        }
        for function_talent in self.function_talents.values() {
            self.publish_schema(function_talent.get_schema(), &return_topic, function_talent.base().id().as_str()).await;
        }
        if !self.callee_talent.callees().is_empty() {
            self.publish_schema(self.callee_talent.get_schema(), &return_topic, self.callee_talent.id().as_str()).await;
        }
    }

    async fn publish_schema(&self, schema: Result<talent_schema::TalentSchema, talent_schema::SchemaError>, return_topic: &str, talent_id: &str) {
        match schema {
            Ok(schema) => {
                let body = schema.to_json().to_string();
                if let Err(err) = self.gateway.publish(return_topic, &body, &PublishOptions::new()).await {
                    tracing::warn!(%err, talent_id, "failed to publish discovery schema");
                }
            }
            Err(err) => tracing::warn!(%err, talent_id, "talent has no assemblable schema, skipping discovery reply"),
        }
    }

    async fn handle_platform_event(&self, payload: &str) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to parse platform event payload");
                return;
            }
        };

        let evt = match talent_codec::parse_platform_event(&value) {
            Ok(evt) => evt,
            Err(err) => {
                tracing::warn!(%err, "failed to classify platform event payload");
                return;
            }
        };

        for talent in self.talents.values() {
            talent.handle_platform_event(&evt).await;
        }
        for function_talent in self.function_talents.values() {
            function_talent.base().handle_platform_event(&evt).await;
        }
        if let Some(f) = &self.on_platform_event {
            f(evt);
        }
    }

    async fn dispatch_error(&self, message: &str) {
        for talent in self.talents.values() {
            talent.handle_error(message).await;
        }
        for function_talent in self.function_talents.values() {
            function_talent.base().handle_error(message).await;
        }
        self.callee_talent.handle_error(message).await;
        if let Some(f) = &self.on_error {
            f(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use talent::FunctionHandler;
    use talent_core::{FixedClock, Subject};
    use talent_gateway::{GatewayError, SubscribeOptions};
    use talent_schema::constraint::{is_set, ConstraintOptions};

    struct RecordingAdapter {
        published: Arc<StdMutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl talent_gateway::Adapter for RecordingAdapter {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_platform_proto(&self) -> bool {
            true
        }

        async fn start(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn publish(&self, topic: &str, message: &str, _opts: &PublishOptions) -> Result<(), GatewayError> {
            self.published.lock().unwrap().push((topic.to_string(), message.to_string()));
            Ok(())
        }

        async fn subscribe(&self, _topic: &str, _on_msg: OnMsg, _opts: &SubscribeOptions) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn subscribe_shared(&self, _group: &str, _topic: &str, _on_msg: OnMsg, _opts: &SubscribeOptions) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    async fn test_client(talents: Vec<Talent>, function_talents: Vec<FunctionTalent>) -> (Arc<Client>, Arc<StdMutex<Vec<(String, String)>>>) {
        let published = Arc::new(StdMutex::new(Vec::new()));
        let gateway = Gateway::empty();
        gateway.register(Arc::new(RecordingAdapter { published: published.clone() })).await;

        let mut builder = ClientBuilder::new(gateway).clock(FixedClock::new(1_000)).uuid_fn(Arc::new(|| "fixed-uuid".to_string()));
        for t in talents {
            builder = builder.register_talent(t);
        }
        for ft in function_talents {
            builder = builder.register_function_talent(ft);
        }

        (builder.start().await.unwrap(), published)
    }

    #[tokio::test]
    async fn discovery_publishes_every_registered_talents_schema() {
        let rule: Rule = is_set("temp", ConstraintOptions::default()).into();
        let talent = Talent::new("t1").rules(rule);
        let (client, published) = test_client(vec![talent], vec![]).await;

        let frame = serde_json::json!({"msgType": 2, "returnTopic": "discover/return"}).to_string();
        client.handle_discover(&frame).await;

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "discover/return");
        let schema: Value = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(schema["id"], serde_json::json!("t1"));
    }

    struct Echo;

    #[async_trait]
    impl FunctionHandler for Echo {
        async fn call(&self, args: Value, ctx: &CallContext) {
            let value = args.as_array().and_then(|a| a.first()).cloned().unwrap_or(Value::Null);
            ctx.reply(value).await;
        }
    }

    #[tokio::test]
    async fn function_call_round_trip_replies_to_the_caller() {
        let mut ft = FunctionTalent::new(Talent::new("p"));
        ft.register_function("echo", Arc::new(Echo));
        let (client, published) = test_client(vec![], vec![ft]).await;

        let call_frame = serde_json::json!({
            "msgType": 1,
            "subject": "s1",
            "feature": "p.echo-in",
            "type": "default",
            "whenMs": 1_000,
            "returnTopic": "talent/caller/events",
            "value": {
                "func": "echo",
                "args": ["hi"],
                "chnl": "c1",
                "call": "u1",
                "timeoutAtMs": 10_000,
            },
        })
        .to_string();

        client.handle_event("p", &call_frame).await;

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "talent/caller/events");
        let reply: Value = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(reply["feature"], serde_json::json!("p.echo-out"));
        assert_eq!(reply["value"]["$tsuffix"], serde_json::json!("/c1/u1"));
        assert_eq!(reply["value"]["value"], serde_json::json!("hi"));
    }

    #[tokio::test]
    async fn gathered_reply_is_forwarded_once_and_dropped_afterwards() {
        let received = Arc::new(StdMutex::new(Vec::new()));
        let received_for_closure = received.clone();

        let talent = Talent::new("caller").rules(is_set("trigger", ConstraintOptions::default()).into()).on_event(move |_event, ctx| {
            let received = received_for_closure.clone();
            Box::pin(async move {
                let callee = Callee::new("provider", "echo", "default");
                let token = ctx.call(&callee, serde_json::json!("hi"), 5_000).await.unwrap();
                let sink: Box<dyn Fn(Vec<Value>) + Send + Sync> = Box::new(move |replies| {
                    received.lock().unwrap().extend(replies);
                });
                ctx.gather(sink, None, &[token]).await;
            })
        });

        let mut talent = talent;
        let callee = talent.register_callee("provider", "echo", "default");
        let _ = callee;

        let (client, _published) = test_client(vec![talent], vec![]).await;

        let trigger_frame = serde_json::json!({
            "msgType": 1,
            "subject": "s1",
            "feature": "default.trigger",
            "type": "default",
            "whenMs": 1_000,
            "value": 1,
        })
        .to_string();
        client.handle_event("caller", &trigger_frame).await;

        let reply_frame = serde_json::json!({
            "msgType": 1,
            "subject": "s1",
            "feature": "caller.dummy-out",
            "type": "default",
            "whenMs": 1_000,
            "value": {"$tsuffix": "/x/y", "$vpath": "value", "value": "reply-value"},
        })
        .to_string();
        client.handle_call_reply("fixed-uuid", &reply_frame).await;

        assert_eq!(received.lock().unwrap().as_slice(), [serde_json::json!("reply-value")]);
        assert!(client.correlator.lock().await.is_empty());

        client.handle_call_reply("fixed-uuid", &reply_frame).await;
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_gatherer_is_swept_and_its_timeout_handler_runs() {
        let timed_out = Arc::new(AtomicUsize::new(0));
        let timed_out_for_closure = timed_out.clone();

        let talent = Talent::new("caller").rules(is_set("trigger", ConstraintOptions::default()).into()).on_event(move |_event, ctx| {
            let timed_out = timed_out_for_closure.clone();
            Box::pin(async move {
                let callee = Callee::new("provider", "echo", "default");
                let token = ctx.call(&callee, serde_json::json!("hi"), 500).await.unwrap();
                let timeout_handler: Box<dyn Fn() + Send + Sync> = Box::new(move || {
                    timed_out.fetch_add(1, Ordering::SeqCst);
                });
                ctx.gather(Box::new(|_| {}), Some(timeout_handler), &[token]).await;
            })
        });
        let mut talent = talent;
        talent.register_callee("provider", "echo", "default");

        let (client, _published) = test_client(vec![talent], vec![]).await;

        let trigger_frame = serde_json::json!({
            "msgType": 1, "subject": "s1", "feature": "default.trigger", "type": "default", "whenMs": 1_000, "value": 1,
        })
        .to_string();
        client.handle_event("caller", &trigger_frame).await;
        assert_eq!(client.correlator.lock().await.len(), 1);

        let expired = client.correlator.lock().await.extract_expired(1_000 + 500);
        assert_eq!(expired.len(), 1);
        for gatherer in expired {
            gatherer.time_out();
        }
        assert_eq!(timed_out.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn protocol_error_fans_out_to_every_talent_and_the_client_handler() {
        let talent_errors = Arc::new(StdMutex::new(Vec::new()));
        let talent_errors_for_closure = talent_errors.clone();
        let talent = Talent::new("t1").rules(is_set("x", ConstraintOptions::default()).into()).on_error(move |message| {
            let talent_errors = talent_errors_for_closure.clone();
            Box::pin(async move {
                talent_errors.lock().unwrap().push(message);
            })
        });

        let client_errors = Arc::new(StdMutex::new(Vec::new()));
        let client_errors_for_closure = client_errors.clone();
        let published = Arc::new(StdMutex::new(Vec::new()));
        let gateway = Gateway::empty();
        gateway.register(Arc::new(RecordingAdapter { published: published.clone() })).await;

        let client = ClientBuilder::new(gateway)
            .register_talent(talent)
            .on_error(move |message| {
                client_errors_for_closure.lock().unwrap().push(message);
            })
            .start()
            .await
            .unwrap();

        let error_frame = serde_json::json!({"msgType": 4, "code": 4002}).to_string();
        client.handle_event("t1", &error_frame).await;

        assert_eq!(talent_errors.lock().unwrap().as_slice(), ["invalid discovery info"]);
        assert_eq!(client_errors.lock().unwrap().as_slice(), ["invalid discovery info"]);
    }

    #[tokio::test]
    async fn plain_talent_receives_events_addressed_to_it() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_for_closure = seen.clone();
        let talent = Talent::new("t1").rules(is_set("temp", ConstraintOptions::default()).into()).on_event(move |event, _ctx| {
            let seen = seen_for_closure.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(event.feature);
            })
        });

        let (client, _published) = test_client(vec![talent], vec![]).await;

        let event_frame = serde_json::json!({
            "msgType": 1, "subject": "s1", "feature": "default.t1.temp", "type": "default", "whenMs": 1_000, "value": 21.5,
        })
        .to_string();
        client.handle_event("t1", &event_frame).await;

        assert_eq!(seen.lock().unwrap().as_slice(), ["default.t1.temp"]);
    }

    #[tokio::test]
    async fn events_for_an_unregistered_talent_are_dropped_without_panicking() {
        let (client, published) = test_client(vec![], vec![]).await;
        let event_frame = serde_json::json!({
            "msgType": 1, "subject": "s1", "feature": "x", "type": "default", "whenMs": 1_000, "value": 1,
        })
        .to_string();
        client.handle_event("nobody", &event_frame).await;
        assert!(published.lock().unwrap().is_empty());
    }
}
