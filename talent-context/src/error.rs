//! Errors a context operation can raise (spec §7 "usage errors").

use thiserror::Error;

/// Errors raised by `EventContext`/`CallContext` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContextError {
    /// `Call` was invoked with `timeout_ms <= 0` (spec §4.E).
    #[error("invalid argument: timeout_ms must be > 0, got {0}")]
    InvalidArgument(i64),
}
