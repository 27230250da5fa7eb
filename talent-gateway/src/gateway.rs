//! `Gateway` — owns an ordered adapter set and fans pub/sub across it
//! (spec §4.B), grounded on `neuron-orch-local::LocalOrch`'s registry +
//! dispatch shape, generalized from "one matching entry" to "every
//! matching entry, in order".

use crate::adapter::{Adapter, OnMsg, PublishOptions, SubscribeOptions};
use crate::config::{AdapterFactory, GatewayConfig};
use crate::error::GatewayError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// The minimal "publish one frame to a topic" capability that
/// `talent-correlator` and `talent-context` depend on instead of the full
/// `Gateway`/`Adapter` surface (DESIGN.md GLOSSARY: "Publisher").
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `message` to `topic` using these options.
    async fn publish(&self, topic: &str, message: &str, opts: &PublishOptions) -> Result<(), GatewayError>;
}

/// The transport gateway. Inert between construction and [`Gateway::start`]
/// — publishing or subscribing before `start` is undefined per spec §4.B.
pub struct Gateway {
    adapters: RwLock<Vec<Arc<dyn Adapter>>>,
}

impl Gateway {
    /// Validate `config`, resolve each entry against `factory`, and build a
    /// gateway holding the adapters in configuration order. Adapters are
    /// not started yet — call [`Gateway::start`] for that.
    pub fn initialize(config: &GatewayConfig, factory: &AdapterFactory) -> Result<Self, GatewayError> {
        config.validate()?;

        let mut adapters = Vec::with_capacity(config.adapters.len());
        for entry in &config.adapters {
            let adapter = factory.build(&entry.module.name, &entry.config)?;
            adapters.push(adapter);
        }

        Ok(Self { adapters: RwLock::new(adapters) })
    }

    /// An empty gateway with no configured adapters — used by tests and by
    /// callers that register adapters directly via [`Gateway::register`].
    pub fn empty() -> Self {
        Self { adapters: RwLock::new(Vec::new()) }
    }

    /// Append an adapter directly, bypassing config/factory resolution.
    pub async fn register(&self, adapter: Arc<dyn Adapter>) {
        self.adapters.write().await.push(adapter);
    }

    /// Start every adapter, in registration order (spec §4.B).
    pub async fn start(&self) -> Result<(), GatewayError> {
        for adapter in self.adapters.read().await.iter() {
            debug!(adapter = adapter.name(), "starting adapter");
            adapter.start().await.map_err(|_| GatewayError::Adapter {
                adapter: adapter.name().to_string(),
                message: "start failed".to_string(),
            })?;
        }
        Ok(())
    }

    /// Stop every adapter, in registration order.
    pub async fn stop(&self) -> Result<(), GatewayError> {
        for adapter in self.adapters.read().await.iter() {
            debug!(adapter = adapter.name(), "stopping adapter");
            adapter.stop().await?;
        }
        Ok(())
    }

    /// Publish to every adapter selected by `opts` (spec §4.B selection rule).
    pub async fn publish(&self, topic: &str, message: &str, opts: &PublishOptions) -> Result<(), GatewayError> {
        for adapter in self.adapters.read().await.iter() {
            if opts.selects(adapter.as_ref()) {
                adapter.publish(topic, message, opts).await?;
            }
        }
        Ok(())
    }

    /// Subscribe `on_msg` on every adapter selected by `opts`.
    pub async fn subscribe(&self, topic: &str, on_msg: OnMsg, opts: &SubscribeOptions) -> Result<(), GatewayError> {
        for adapter in self.adapters.read().await.iter() {
            if opts.selects(adapter.as_ref()) {
                adapter.subscribe(topic, on_msg.clone(), opts).await?;
            }
        }
        Ok(())
    }

    /// Subscribe `on_msg` as part of shared group `group` on every adapter
    /// selected by `opts`.
    pub async fn subscribe_shared(&self, group: &str, topic: &str, on_msg: OnMsg, opts: &SubscribeOptions) -> Result<(), GatewayError> {
        for adapter in self.adapters.read().await.iter() {
            if opts.selects(adapter.as_ref()) {
                adapter.subscribe_shared(group, topic, on_msg.clone(), opts).await?;
            }
        }
        Ok(())
    }

    /// The number of registered adapters. Mostly useful for tests.
    pub async fn adapter_count(&self) -> usize {
        self.adapters.read().await.len()
    }
}

#[async_trait]
impl Publisher for Gateway {
    async fn publish(&self, topic: &str, message: &str, opts: &PublishOptions) -> Result<(), GatewayError> {
        Gateway::publish(self, topic, message, opts).await
    }
}

/// A `Publisher` that drops every message — used where no transport has
/// been wired yet, or by talents that only ever receive events.
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&self, topic: &str, _message: &str, _opts: &PublishOptions) -> Result<(), GatewayError> {
        warn!(topic, "publish dropped: no publisher configured");
        Ok(())
    }
}
