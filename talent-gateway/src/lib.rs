//! Transport gateway: the pluggable adapter layer fanning publish/subscribe
//! operations across multiple pub/sub backends behind one interface.

#![deny(missing_docs)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod gateway;

pub use adapter::{Adapter, OnMsg, PublishOptions, SubscribeOptions};
pub use config::{AdapterConfigEntry, AdapterCtor, AdapterFactory, AdapterModule, GatewayConfig};
pub use error::GatewayError;
pub use gateway::{Gateway, NullPublisher, Publisher};
