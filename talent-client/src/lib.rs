//! `Client`/`ClientBuilder`: assembles the gateway, every registered
//! talent, and the reply correlator into a runnable system, and routes
//! every inbound message to the right handler (spec §4.H).

#![deny(missing_docs)]

pub mod client;
pub mod error;
pub mod topic;

pub use client::{Client, ClientBuilder};
pub use error::ClientError;
pub use topic::{Route, Topics, DEFAULT_NAMESPACE};
