//! `EventContext`/`CallContext`: the handles talents use to emit events,
//! issue calls, gather replies, and (within a call) reply directly.

#![deny(missing_docs)]

pub mod call_context;
pub mod error;
pub mod event_context;
pub mod sink;

pub use call_context::CallContext;
pub use error::ContextError;
pub use event_context::{random_uuid, EventContext, UuidFn};
pub use sink::GathererSink;
