//! Errors raised while starting or running a [`crate::Client`] (spec §7:
//! configuration errors are fatal, everything else the router encounters
//! is logged and dropped).

use thiserror::Error;

/// Errors that can abort client startup or shutdown.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The gateway failed to start or stop an adapter.
    #[error("gateway error: {0}")]
    Gateway(#[from] talent_gateway::GatewayError),
}
