//! The `Adapter` contract (spec §6) — the external transport collaborator.

use crate::error::GatewayError;
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked by an adapter when it delivers an inbound message:
/// `(topic, message, adapter_name)`. A plain callback, not a channel —
/// the adapter calls it directly from whichever thread delivered the
/// message (spec §5: "callbacks are invoked on whichever thread delivered
/// the triggering message").
pub type OnMsg = Arc<dyn Fn(&str, &str, &str) + Send + Sync>;

/// Options narrowing which adapters a publish/subscribe operation targets
/// (spec §4.B).
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Only forward to adapters marked `is_platform_proto`.
    pub platform_proto_only: bool,
    /// Only forward to the adapter with this exact name; empty matches all.
    pub adapter_id: String,
    /// Whether the broker should retain the message for future subscribers.
    pub retain: bool,
    /// Whether the message should be stashed for delivery to offline
    /// subscribers, if the adapter supports it.
    pub stash: bool,
}

impl PublishOptions {
    /// `PublishOptions` with `stash` defaulted to `true` (spec §6 adapter
    /// contract default) and everything else at its zero value.
    pub fn new() -> Self {
        Self { stash: true, ..Default::default() }
    }
}

/// Options narrowing which adapters a subscribe operation targets.
#[derive(Debug, Clone, Default)]
pub struct SubscribeOptions {
    /// Only forward to adapters marked `is_platform_proto`.
    pub platform_proto_only: bool,
    /// Only forward to the adapter with this exact name; empty matches all.
    pub adapter_id: String,
}

impl PublishOptions {
    /// Whether these options select `adapter` (spec §4.B):
    /// `(!platform_proto_only || adapter.is_platform_proto) &&
    /// (adapter_id == "" || adapter_id == adapter.name)`.
    pub fn selects(&self, adapter: &dyn Adapter) -> bool {
        (!self.platform_proto_only || adapter.is_platform_proto())
            && (self.adapter_id.is_empty() || self.adapter_id == adapter.name())
    }
}

impl SubscribeOptions {
    /// Same selection rule as [`PublishOptions::selects`], for subscribe
    /// operations.
    pub fn selects(&self, adapter: &dyn Adapter) -> bool {
        (!self.platform_proto_only || adapter.is_platform_proto())
            && (self.adapter_id.is_empty() || self.adapter_id == adapter.name())
    }
}

/// A pub/sub transport adapter (spec §6 external interface).
///
/// `#[async_trait]` mirrors the teacher's one-call-at-a-time protocol
/// traits (`layer0::orchestrator::Orchestrator`).
#[async_trait]
pub trait Adapter: Send + Sync {
    /// This adapter's unique name within a gateway.
    fn name(&self) -> &str;

    /// Whether this adapter carries the platform control protocol
    /// (discovery, platform events) — at most one adapter in a gateway
    /// may answer `true` (spec §4.B config validation).
    fn is_platform_proto(&self) -> bool;

    /// Start the adapter's I/O. Called once, in registration order, when
    /// the gateway starts.
    async fn start(&self) -> Result<(), GatewayError>;

    /// Stop the adapter's I/O. Called once, in registration order, when
    /// the gateway stops.
    async fn stop(&self) -> Result<(), GatewayError>;

    /// Publish `message` to `topic`.
    async fn publish(&self, topic: &str, message: &str, opts: &PublishOptions) -> Result<(), GatewayError>;

    /// Subscribe `on_msg` to `topic`, exclusively for this process.
    async fn subscribe(&self, topic: &str, on_msg: OnMsg, opts: &SubscribeOptions) -> Result<(), GatewayError>;

    /// Subscribe `on_msg` to `topic` as part of a shared consumer group
    /// `group` — only one member of the group receives a given message.
    async fn subscribe_shared(&self, group: &str, topic: &str, on_msg: OnMsg, opts: &SubscribeOptions) -> Result<(), GatewayError>;
}
