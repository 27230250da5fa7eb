//! Gateway configuration and adapter errors (spec §7).

use thiserror::Error;

/// Errors raised while configuring or running the transport gateway.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The `adapters` array is missing, empty, or not an array (spec §4.B).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A configured adapter name has no matching entry in the
    /// `AdapterFactory` registry supplied to `Gateway::new` (the redesigned
    /// "plugin loading" failure mode — see DESIGN.md REDESIGN FLAGS).
    #[error("plugin load failure: no adapter factory registered for `{0}`")]
    PluginLoadFailure(String),

    /// An adapter factory was found by name but its constructor returned
    /// an error building the adapter from its config fragment (the
    /// redesigned analogue of a missing dynamic symbol).
    #[error("plugin symbol not found for `{0}`: {1}")]
    PluginSymNotFound(String, String),

    /// An adapter's `start`/`stop`/`publish`/`subscribe` call failed.
    /// The gateway treats this as the adapter's own business — it only
    /// propagates the message, it never retries.
    #[error("adapter `{adapter}` error: {message}")]
    Adapter {
        /// The failing adapter's name.
        adapter: String,
        /// What went wrong.
        message: String,
    },
}
