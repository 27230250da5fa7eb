//! Protocol-level error code mapping shared by every crate that needs it.
//!
//! Codec, client, and gateway crates each define their own `thiserror`
//! enum for their own fallible operations (per-crate error isolation, the
//! way `layer0` gives each protocol its own error type); this module only
//! holds the cross-cutting vocabulary — the platform's protocol error
//! codes (§4.C) — so it isn't duplicated between the codec and the client.

/// A protocol error code received from the platform (spec §4.C).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolErrorCode {
    /// `4000`: non prefixed output feature found.
    NonPrefixedOutputFeature,
    /// `4001`: feature dependency loop found.
    FeatureDependencyLoop,
    /// `4002`: invalid discovery info.
    InvalidDiscoveryInfo,
    /// `4003`: error resolving given segment in the talent ruleset.
    RulesetSegmentError,
    /// Any other code. The platform is free to introduce new codes;
    /// the SDK degrades to "unknown error" rather than failing to parse.
    Unknown(u32),
}

impl ProtocolErrorCode {
    /// Decode the wire `code` integer into a `ProtocolErrorCode`.
    pub fn from_code(code: u32) -> Self {
        match code {
            4000 => Self::NonPrefixedOutputFeature,
            4001 => Self::FeatureDependencyLoop,
            4002 => Self::InvalidDiscoveryInfo,
            4003 => Self::RulesetSegmentError,
            other => Self::Unknown(other),
        }
    }

    /// The human-readable message for this code, exactly as specified in §4.C.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NonPrefixedOutputFeature => "non prefixed output feature found",
            Self::FeatureDependencyLoop => "feature dependency loop found",
            Self::InvalidDiscoveryInfo => "invalid discovery info",
            Self::RulesetSegmentError => "error resolving given segment in the talent ruleset",
            Self::Unknown(_) => "unknown error",
        }
    }
}
