//! Errors raised while classifying or decoding an inbound frame.

use thiserror::Error;

/// A frame could not be classified or decoded (spec §4.C, §7 "parse errors").
///
/// Callers are expected to log and drop the frame — there is no recovery
/// action for a malformed inbound message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The frame is missing a field required for its `msgType`.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// `msgType` was present but not one of the known values (1, 2, 4).
    #[error("unrecognized msgType `{0}`")]
    UnknownMsgType(i64),

    /// A field was present but had the wrong JSON type.
    #[error("field `{field}` has the wrong type")]
    WrongFieldType {
        /// The offending field's name.
        field: &'static str,
    },

    /// The frame wasn't even a JSON object.
    #[error("frame is not a JSON object")]
    NotAnObject,
}
