//! Topic namespace and inbound routing (spec §4.H, §6).
//!
//! Grounded on `original_source/lib/src/client.cpp::Client::Receive`, which
//! routes on a `std::regex` match against the topic string under a single
//! mutex. `regex` is the direct Rust analogue of that `std::regex` use and
//! isn't otherwise new to the teacher's stack: `SecBear-neuron`'s own
//! `neuron-hook-security` crate already depends on it for pattern matching
//! (see DESIGN.md).

use regex::Regex;

/// The default topic namespace prefix (spec §6), used when a client isn't
/// configured with one of its own.
pub const DEFAULT_NAMESPACE: &str = "iotea";

/// Precompiled topic patterns for one namespace.
pub struct Topics {
    ns: String,
    discover_topic: String,
    platform_topic: String,
    event_re: Regex,
    call_reply_re: Regex,
}

/// The result of classifying one inbound topic (spec §4.H routing table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A reply to a pending call: `.../talent/<tid>/events/<chnl>/<call-id>`.
    CallReply {
        /// The call id the reply correlates to.
        call_id: String,
    },
    /// A plain event or call addressed to a talent: `.../talent/<tid>/events`.
    Event {
        /// The target talent's id.
        talent_id: String,
    },
    /// A discovery probe.
    Discover,
    /// A platform lifecycle event.
    PlatformEvent,
    /// A topic matching none of the known patterns.
    Unknown,
}

impl Topics {
    /// Precompile the routing patterns for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        Self {
            discover_topic: format!("{ns}/configManager/talents/discover"),
            platform_topic: format!("{ns}/platform/$events"),
            event_re: Regex::new(r"talent/([^/]+)/events$").expect("static pattern is valid"),
            call_reply_re: Regex::new(r"talent/[^/]+/events/[^/.]+\.[^/]+/(.+)$").expect("static pattern is valid"),
            ns,
        }
    }

    /// This namespace's prefix.
    pub fn namespace(&self) -> &str {
        &self.ns
    }

    /// The topic talents discover each other on.
    pub fn discover_topic(&self) -> &str {
        &self.discover_topic
    }

    /// The topic platform lifecycle events are published on.
    pub fn platform_events_topic(&self) -> &str {
        &self.platform_topic
    }

    /// The topic a context publishes a new (non-reply) event/call to.
    pub fn ingestion_events_topic(&self) -> String {
        format!("{}/ingestion/events", self.ns)
    }

    /// The topic `talent_id` receives plain events and calls on.
    pub fn talent_events_topic(&self, talent_id: &str) -> String {
        format!("{}/talent/{talent_id}/events", self.ns)
    }

    /// The topic `talent_id` receives call replies on, for its `channel_id`.
    pub fn talent_reply_subscribe_topic(&self, talent_id: &str, channel_id: &str) -> String {
        format!("{}/talent/{talent_id}/events/{channel_id}/+", self.ns)
    }

    /// Classify `topic` (spec §4.H: call-reply, then event, then discover,
    /// then platform event, else unknown).
    pub fn route(&self, topic: &str) -> Route {
        if let Some(caps) = self.call_reply_re.captures(topic) {
            return Route::CallReply { call_id: caps[1].to_string() };
        }
        if let Some(caps) = self.event_re.captures(topic) {
            return Route::Event { talent_id: caps[1].to_string() };
        }
        if topic.contains(self.discover_topic.as_str()) {
            return Route::Discover;
        }
        if topic.contains(self.platform_topic.as_str()) {
            return Route::PlatformEvent;
        }
        Route::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("iotea")
    }

    #[test]
    fn routes_a_plain_event_topic() {
        match topics().route("iotea/talent/p/events") {
            Route::Event { talent_id } => assert_eq!(talent_id, "p"),
            other => panic!("expected Event, got {other:?}"),
        }
    }

    #[test]
    fn routes_a_call_reply_topic_before_the_shorter_event_pattern() {
        match topics().route("iotea/talent/p/events/p.chan1/call-1") {
            Route::CallReply { call_id } => assert_eq!(call_id, "call-1"),
            other => panic!("expected CallReply, got {other:?}"),
        }
    }

    #[test]
    fn routes_the_discover_topic() {
        assert_eq!(topics().route("iotea/configManager/talents/discover"), Route::Discover);
    }

    #[test]
    fn routes_the_platform_events_topic() {
        assert_eq!(topics().route("iotea/platform/$events"), Route::PlatformEvent);
    }

    #[test]
    fn unrecognized_topics_are_unknown() {
        assert_eq!(topics().route("iotea/something/else"), Route::Unknown);
    }
}
