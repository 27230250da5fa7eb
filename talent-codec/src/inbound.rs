//! Inbound frame classification (spec §4.C).
//!
//! Parsing happens in two phases: peek `msgType` to pick a variant, then
//! pull that variant's fields out of the same JSON object. There's no
//! single `#[derive(Deserialize)]` shape because the three `msgType`s don't
//! share a field set.

use crate::error::CodecError;
use serde_json::Value;
use talent_core::{Event, ProtocolErrorCode, Subject};

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// `msgType: 1` — an event or call addressed to a talent.
    Event(Event),
    /// `msgType: 2` — a discovery probe.
    Discover {
        /// Topic to publish the schema document to.
        return_topic: String,
        /// Platform protocol version, `"0.0.0"` if the platform omitted it.
        version: String,
    },
    /// `msgType: 4` — a protocol error.
    Error(ProtocolErrorCode),
}

fn as_object(value: &Value) -> Result<&serde_json::Map<String, Value>, CodecError> {
    value.as_object().ok_or(CodecError::NotAnObject)
}

fn require_str<'a>(obj: &'a serde_json::Map<String, Value>, field: &'static str) -> Result<&'a str, CodecError> {
    obj.get(field).and_then(Value::as_str).ok_or(CodecError::MissingField(field))
}

fn require_i64(obj: &serde_json::Map<String, Value>, field: &'static str) -> Result<i64, CodecError> {
    obj.get(field).and_then(Value::as_i64).ok_or(CodecError::MissingField(field))
}

/// Classify and decode one inbound frame.
pub fn parse_inbound(value: &Value) -> Result<InboundMessage, CodecError> {
    let obj = as_object(value)?;
    let msg_type = obj.get("msgType").and_then(Value::as_i64).ok_or(CodecError::MissingField("msgType"))?;

    match msg_type {
        1 => {
            let event = Event {
                subject: Subject::new(require_str(obj, "subject")?),
                feature: require_str(obj, "feature")?.to_string(),
                value: obj.get("value").cloned().unwrap_or(Value::Null),
                r#type: require_str(obj, "type")?.to_string(),
                instance: obj.get("instance").and_then(Value::as_str).unwrap_or("").to_string(),
                return_topic: obj.get("returnTopic").and_then(Value::as_str).map(str::to_string),
                when_ms: require_i64(obj, "whenMs")?,
            };
            Ok(InboundMessage::Event(event))
        }
        2 => Ok(InboundMessage::Discover {
            return_topic: require_str(obj, "returnTopic")?.to_string(),
            version: obj.get("version").and_then(Value::as_str).unwrap_or("0.0.0").to_string(),
        }),
        4 => {
            let code = require_i64(obj, "code")? as u32;
            Ok(InboundMessage::Error(ProtocolErrorCode::from_code(code)))
        }
        other => Err(CodecError::UnknownMsgType(other)),
    }
}

/// A platform lifecycle event, delivered on the platform events topic
/// rather than a talent's own events topic (spec §4.C).
#[derive(Debug, Clone)]
pub struct PlatformEvent {
    /// What kind of rules change this is.
    pub kind: PlatformEventKind,
    /// The platform-supplied payload.
    pub data: Value,
    /// When the platform recorded this event, ms since epoch.
    pub timestamp: i64,
}

/// The kind of platform lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEventKind {
    /// `platform.talent.config.set`.
    TalentRulesSet,
    /// `platform.talent.config.unset`.
    TalentRulesUnset,
    /// Any other (or missing) platform event type.
    Undef,
}

/// Parse a platform lifecycle event frame.
pub fn parse_platform_event(value: &Value) -> Result<PlatformEvent, CodecError> {
    let obj = as_object(value)?;
    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("platform.talent.config.set") => PlatformEventKind::TalentRulesSet,
        Some("platform.talent.config.unset") => PlatformEventKind::TalentRulesUnset,
        _ => PlatformEventKind::Undef,
    };

    Ok(PlatformEvent {
        kind,
        data: obj.get("data").cloned().unwrap_or(Value::Null),
        timestamp: require_i64(obj, "timestamp")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_event_frame_with_defaults() {
        let frame = json!({
            "msgType": 1,
            "subject": "s1",
            "feature": "default.t.temp-in",
            "value": 21.5,
            "type": "default",
            "whenMs": 100,
        });
        match parse_inbound(&frame).unwrap() {
            InboundMessage::Event(e) => {
                assert_eq!(e.instance, "");
                assert!(e.return_topic.is_none());
                assert_eq!(e.when_ms, 100);
            }
            _ => panic!("expected an Event"),
        }
    }

    #[test]
    fn parses_discover_frame_with_default_version() {
        let frame = json!({"msgType": 2, "returnTopic": "123/cm/discover"});
        match parse_inbound(&frame).unwrap() {
            InboundMessage::Discover { return_topic, version } => {
                assert_eq!(return_topic, "123/cm/discover");
                assert_eq!(version, "0.0.0");
            }
            _ => panic!("expected a Discover"),
        }
    }

    #[test]
    fn parses_error_frame_with_known_code() {
        let frame = json!({"msgType": 4, "code": 4002});
        match parse_inbound(&frame).unwrap() {
            InboundMessage::Error(code) => assert_eq!(code.message(), "invalid discovery info"),
            _ => panic!("expected an Error"),
        }
    }

    #[test]
    fn unknown_msg_type_is_rejected() {
        let frame = json!({"msgType": 99});
        assert!(matches!(parse_inbound(&frame), Err(CodecError::UnknownMsgType(99))));
    }

    #[test]
    fn missing_msg_type_is_rejected() {
        let frame = json!({"subject": "s1"});
        assert!(matches!(parse_inbound(&frame), Err(CodecError::MissingField("msgType"))));
    }

    #[test]
    fn platform_event_defaults_to_undef() {
        let frame = json!({"type": "something.else", "timestamp": 5});
        let evt = parse_platform_event(&frame).unwrap();
        assert_eq!(evt.kind, PlatformEventKind::Undef);
    }
}
