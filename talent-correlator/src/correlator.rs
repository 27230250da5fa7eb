//! `ReplyCorrelator` — the owner of every live gatherer (spec §3, §4.D).
//!
//! Grounded on `original_source/lib/src/call.cpp`'s `ReplyHandler`: a bare,
//! unsynchronized container. The owning `talent-client::Client` wraps
//! access to it in the single mutex the spec's §5 concurrency model
//! requires — this type itself performs no locking, so "the Client
//! exclusively owns the correlator" (spec §3) is an actual borrow-checker
//! fact rather than an internally-synchronized convention.

use crate::gatherer::GathererDyn;
use talent_core::CallId;

/// Owns the unordered collection of active gatherers.
#[derive(Default)]
pub struct ReplyCorrelator {
    gatherers: Vec<Box<dyn GathererDyn>>,
}

impl ReplyCorrelator {
    /// An empty correlator.
    pub fn new() -> Self {
        Self { gatherers: Vec::new() }
    }

    /// Append a gatherer.
    pub fn add(&mut self, gatherer: Box<dyn GathererDyn>) {
        self.gatherers.push(gatherer);
    }

    /// Linear search for the unique gatherer whose expected set contains
    /// `call_id`; remove and return it. `None` if none matches (the reply
    /// arrived after the gatherer was extracted as expired, or was never
    /// requested).
    pub fn extract(&mut self, call_id: &CallId) -> Option<Box<dyn GathererDyn>> {
        let idx = self.gatherers.iter().position(|g| g.wants(call_id))?;
        Some(self.gatherers.remove(idx))
    }

    /// Remove every gatherer whose deadline has passed (`deadline_ms <=
    /// now_ms`), returning them in the order they were discovered.
    pub fn extract_expired(&mut self, now_ms: i64) -> Vec<Box<dyn GathererDyn>> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.gatherers.len() {
            if self.gatherers[i].deadline_ms() <= now_ms {
                expired.push(self.gatherers.remove(i));
            } else {
                i += 1;
            }
        }
        expired
    }

    /// How many gatherers are currently live. Mostly useful for tests.
    pub fn len(&self) -> usize {
        self.gatherers.len()
    }

    /// Whether no gatherers are currently live.
    pub fn is_empty(&self) -> bool {
        self.gatherers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatherer::SinkGatherer;
    use serde_json::json;
    use talent_core::CallToken;

    fn token(id: &str, timeout_ms: i64) -> CallToken {
        CallToken::new(CallId::new(id), timeout_ms)
    }

    #[test]
    fn extract_removes_the_matching_gatherer_exactly_once() {
        let mut correlator = ReplyCorrelator::new();
        let tokens = vec![token("a", 1_000)];
        correlator.add(Box::new(SinkGatherer::new(&tokens, 0, Box::new(|_| {}), None)));

        assert!(correlator.extract(&CallId::new("a")).is_some());
        assert!(correlator.is_empty());
        assert!(correlator.extract(&CallId::new("a")).is_none());
    }

    #[test]
    fn expired_gatherer_is_swept_and_no_longer_extractable() {
        let mut correlator = ReplyCorrelator::new();
        let tokens = vec![token("a", 100)];
        correlator.add(Box::new(SinkGatherer::new(&tokens, 0, Box::new(|_| {}), None)));

        let expired = correlator.extract_expired(101);
        assert_eq!(expired.len(), 1);
        assert!(correlator.extract(&CallId::new("a")).is_none());
    }

    #[test]
    fn gatherer_not_yet_expired_is_not_swept() {
        let mut correlator = ReplyCorrelator::new();
        let tokens = vec![token("a", 100)];
        correlator.add(Box::new(SinkGatherer::new(&tokens, 0, Box::new(|_| {}), None)));

        assert!(correlator.extract_expired(50).is_empty());
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn gather_then_forward_happens_once_all_expected_arrive() {
        let mut correlator = ReplyCorrelator::new();
        let tokens = vec![token("a", 1_000), token("b", 1_000)];
        correlator.add(Box::new(SinkGatherer::new(&tokens, 0, Box::new(|_| {}), None)));

        let mut gatherer = correlator.extract(&CallId::new("a")).unwrap();
        assert!(!gatherer.gather(&CallId::new("a"), json!(1)));
        correlator.add(gatherer);

        let mut gatherer = correlator.extract(&CallId::new("b")).unwrap();
        assert!(gatherer.gather(&CallId::new("b"), json!(2)));
        assert_eq!(gatherer.get_replies(), vec![json!(1), json!(2)]);
    }
}
