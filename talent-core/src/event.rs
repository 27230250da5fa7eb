//! `Event` — a single observed platform event delivered to a talent (spec §3).

use crate::id::Subject;
use serde_json::Value;

/// An event observed by a talent, already decoded from the wire envelope.
///
/// `instance` defaults to the empty string when the platform omits it
/// (`original_source/lib/include/event.hpp`); it is not `Option<String>`
/// because downstream code (rule evaluation, context bookkeeping) treats
/// "no instance" and "" identically.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The causal-chain subject this event belongs to.
    pub subject: Subject,
    /// The fully-qualified feature name the value was published on.
    pub feature: String,
    /// The published value.
    pub value: Value,
    /// The type of the talent/device the value concerns.
    pub r#type: String,
    /// The instance qualifier, or `""` if the platform didn't send one.
    pub instance: String,
    /// The topic to publish any reply on, if this event was a call.
    pub return_topic: Option<String>,
    /// When the platform recorded this event, ms since epoch.
    pub when_ms: i64,
}

impl Event {
    /// Whether this event is the input side of a remote call (i.e. carries
    /// a topic to reply on).
    pub fn is_call(&self) -> bool {
        self.return_topic.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_without_return_topic_is_not_a_call() {
        let e = Event {
            subject: Subject::new("s1"),
            feature: "default.t1.temp-in".into(),
            value: serde_json::json!(21.5),
            r#type: "default".into(),
            instance: String::new(),
            return_topic: None,
            when_ms: 100,
        };
        assert!(!e.is_call());
    }

    #[test]
    fn event_with_return_topic_is_a_call() {
        let e = Event {
            subject: Subject::new("s1"),
            feature: "default.provider.echo-in".into(),
            value: serde_json::json!(["hi"]),
            r#type: "default".into(),
            instance: String::new(),
            return_topic: Some("talent/provider/events".into()),
            when_ms: 100,
        };
        assert!(e.is_call());
    }
}
