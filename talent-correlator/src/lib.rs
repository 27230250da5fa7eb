//! Call/reply correlation: gatherers, deadlines, and the correlator that
//! owns them until they complete or time out (spec §3, §4.D).

#![deny(missing_docs)]

pub mod correlator;
pub mod gatherer;

pub use correlator::ReplyCorrelator;
pub use gatherer::{GathererDyn, ReplyGatherer, SinkGatherer};
