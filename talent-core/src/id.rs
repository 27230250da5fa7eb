//! Typed id wrappers used across the talent runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed id wrappers prevent mixing up talent ids, channel ids, call ids,
/// and subjects. These are just strings underneath — the protocol doesn't
/// enforce a particular format (UUIDs are a convention, not a requirement,
/// except where §6 fixes the UUID textual format for generated ids).
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed id from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(TalentId, "Unique identifier for a registered talent.");
typed_id!(
    ChannelId,
    "Per-talent routing key assigned at initialization, used to direct call replies back."
);
typed_id!(
    Subject,
    "Opaque string labeling a causal chain of events and calls."
);
typed_id!(CallId, "Unique identifier for an outgoing call.");
