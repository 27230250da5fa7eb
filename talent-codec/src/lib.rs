//! Inbound frame classification and outbound event/call/reply wire encoding.
//!
//! This crate has no I/O of its own — it only turns `serde_json::Value`
//! frames into typed messages and back. Transport is `talent-gateway`'s job.

#![deny(missing_docs)]

pub mod error;
pub mod inbound;
pub mod outbound;

pub use error::CodecError;
pub use inbound::{parse_inbound, parse_platform_event, InboundMessage, PlatformEvent, PlatformEventKind};
pub use outbound::{call_frame, event_frame, reply_frame, PreparedReply};
