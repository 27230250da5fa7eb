//! `LocalAdapter` — an in-process `Adapter` with no network, no broker
//! (spec §6 adapter contract). Grounded on
//! `layer0::test_utils::local_orchestrator::LocalOrchestrator`'s
//! `HashMap`-backed in-process dispatch, generalized from request/response
//! to topic-matched pub/sub with the single-level `+` wildcard the spec's
//! reply-subscription topic (`.../events/<chnl>/+`) needs.

#![deny(missing_docs)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use talent_gateway::{Adapter, GatewayError, OnMsg, PublishOptions, SubscribeOptions};

struct ExclusiveSub {
    pattern: Vec<String>,
    on_msg: OnMsg,
}

struct SharedSub {
    group: String,
    pattern: Vec<String>,
    on_msg: OnMsg,
}

/// Split a topic into its `/`-separated segments, for matching.
fn segments(topic: &str) -> Vec<&str> {
    topic.split('/').collect()
}

/// Whether `pattern` (possibly containing the single-level `+` wildcard)
/// matches `topic`, segment for segment.
fn matches(pattern: &[String], topic: &[&str]) -> bool {
    pattern.len() == topic.len() && pattern.iter().zip(topic.iter()).all(|(p, t)| p == "+" || p == t)
}

/// An in-process pub/sub adapter: `publish` delivers synchronously to every
/// matching subscription registered on this same instance.
pub struct LocalAdapter {
    name: String,
    platform: bool,
    exclusive: Mutex<Vec<ExclusiveSub>>,
    shared: Mutex<Vec<SharedSub>>,
    round_robin: Mutex<HashMap<String, AtomicUsize>>,
}

impl LocalAdapter {
    /// A new local adapter named `name`. `platform` marks it as the single
    /// platform-protocol adapter in a gateway (spec §4.B).
    pub fn new(name: impl Into<String>, platform: bool) -> Self {
        Self {
            name: name.into(),
            platform,
            exclusive: Mutex::new(Vec::new()),
            shared: Mutex::new(Vec::new()),
            round_robin: Mutex::new(HashMap::new()),
        }
    }

    fn dispatch_exclusive(&self, topic: &str, message: &str) {
        let topic_segs = segments(topic);
        for sub in self.exclusive.lock().expect("exclusive subs mutex poisoned").iter() {
            if matches(&sub.pattern, &topic_segs) {
                (sub.on_msg)(topic, message, &self.name);
            }
        }
    }

    /// Within each matching group, only the next subscriber in round-robin
    /// order receives the message — mirrors a shared-subscription broker.
    fn dispatch_shared(&self, topic: &str, message: &str) {
        let topic_segs = segments(topic);
        let shared = self.shared.lock().expect("shared subs mutex poisoned");

        let mut by_group: HashMap<&str, Vec<&SharedSub>> = HashMap::new();
        for sub in shared.iter() {
            if matches(&sub.pattern, &topic_segs) {
                by_group.entry(sub.group.as_str()).or_default().push(sub);
            }
        }

        for (group, candidates) in by_group {
            if candidates.is_empty() {
                continue;
            }
            let mut counters = self.round_robin.lock().expect("round-robin mutex poisoned");
            let counter = counters.entry(group.to_string()).or_insert_with(|| AtomicUsize::new(0));
            let index = counter.fetch_add(1, Ordering::SeqCst) % candidates.len();
            (candidates[index].on_msg)(topic, message, &self.name);
        }
    }
}

#[async_trait]
impl Adapter for LocalAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_platform_proto(&self) -> bool {
        self.platform
    }

    async fn start(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn publish(&self, topic: &str, message: &str, _opts: &PublishOptions) -> Result<(), GatewayError> {
        self.dispatch_exclusive(topic, message);
        self.dispatch_shared(topic, message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, on_msg: OnMsg, _opts: &SubscribeOptions) -> Result<(), GatewayError> {
        let pattern = segments(topic).into_iter().map(str::to_string).collect();
        self.exclusive.lock().expect("exclusive subs mutex poisoned").push(ExclusiveSub { pattern, on_msg });
        Ok(())
    }

    async fn subscribe_shared(&self, group: &str, topic: &str, on_msg: OnMsg, _opts: &SubscribeOptions) -> Result<(), GatewayError> {
        let pattern = segments(topic).into_iter().map(str::to_string).collect();
        self.shared.lock().expect("shared subs mutex poisoned").push(SharedSub { group: group.to_string(), pattern, on_msg });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (OnMsg, Arc<Mutex<Vec<(String, String)>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let for_closure = received.clone();
        let on_msg: OnMsg = Arc::new(move |topic: &str, message: &str, _adapter: &str| {
            for_closure.lock().unwrap().push((topic.to_string(), message.to_string()));
        });
        (on_msg, received)
    }

    #[tokio::test]
    async fn exact_topic_subscription_receives_published_message() {
        let adapter = LocalAdapter::new("local", true);
        let (on_msg, received) = recorder();
        adapter.subscribe("iotea/talent/t1/events", on_msg, &SubscribeOptions::default()).await.unwrap();

        adapter.publish("iotea/talent/t1/events", "hello", &PublishOptions::new()).await.unwrap();

        assert_eq!(received.lock().unwrap().as_slice(), [("iotea/talent/t1/events".to_string(), "hello".to_string())]);
    }

    #[tokio::test]
    async fn plus_wildcard_matches_a_single_segment() {
        let adapter = LocalAdapter::new("local", true);
        let (on_msg, received) = recorder();
        adapter.subscribe("iotea/talent/t1/events/chnl1/+", on_msg, &SubscribeOptions::default()).await.unwrap();

        adapter.publish("iotea/talent/t1/events/chnl1/call-123", "reply", &PublishOptions::new()).await.unwrap();
        adapter.publish("iotea/talent/t1/events/chnl1/extra/segment", "ignored", &PublishOptions::new()).await.unwrap();

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shared_group_delivers_to_exactly_one_member_round_robin() {
        let adapter = LocalAdapter::new("local", true);
        let (on_msg_a, received_a) = recorder();
        let (on_msg_b, received_b) = recorder();
        adapter.subscribe_shared("group", "iotea/configManager/talents/discover", on_msg_a, &SubscribeOptions::default()).await.unwrap();
        adapter.subscribe_shared("group", "iotea/configManager/talents/discover", on_msg_b, &SubscribeOptions::default()).await.unwrap();

        adapter.publish("iotea/configManager/talents/discover", "m1", &PublishOptions::new()).await.unwrap();
        adapter.publish("iotea/configManager/talents/discover", "m2", &PublishOptions::new()).await.unwrap();

        assert_eq!(received_a.lock().unwrap().len() + received_b.lock().unwrap().len(), 2);
        assert_eq!(received_a.lock().unwrap().len(), 1);
        assert_eq!(received_b.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn different_groups_each_receive_independently() {
        let adapter = LocalAdapter::new("local", true);
        let (on_msg_a, received_a) = recorder();
        let (on_msg_b, received_b) = recorder();
        adapter.subscribe_shared("talent-a", "iotea/platform/$events", on_msg_a, &SubscribeOptions::default()).await.unwrap();
        adapter.subscribe_shared("talent-b", "iotea/platform/$events", on_msg_b, &SubscribeOptions::default()).await.unwrap();

        adapter.publish("iotea/platform/$events", "m", &PublishOptions::new()).await.unwrap();

        assert_eq!(received_a.lock().unwrap().len(), 1);
        assert_eq!(received_b.lock().unwrap().len(), 1);
    }
}
