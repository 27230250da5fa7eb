//! `Talent` and `FunctionTalent`: the base unit of event-driven behavior
//! registered with the runtime (spec §4.F, §4.G).

#![deny(missing_docs)]

pub mod function_talent;
pub mod handlers;
pub mod talent;

pub use function_talent::{FunctionHandler, FunctionTalent};
pub use handlers::{BoxFuture, ClosureHandlers, TalentHandlers};
pub use talent::{Output, Talent};
