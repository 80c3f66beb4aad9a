// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Topic registry with wildcard filters, retained messages and fan-out.

use codec::topic::is_valid_topic_name;
use codec::v3::PublishPacket;
use codec::TopicFilter;
use std::collections::{HashMap, HashSet};

use crate::types::SessionId;

mod topic;

pub use topic::Topic;

/// A message the server must forward to a subscriber session.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub session_id: SessionId,
    pub packet: PublishPacket,
}

/// Registry of topics keyed by canonical name, plus the set of pending
/// wildcard subscriptions re-applied whenever a new topic is created.
///
/// The router is owned by the server task and mutated only there. It
/// stores session ids, never session handles; delivery is returned to
/// the caller as a list of [`Delivery`] values and dispatched outside.
#[derive(Debug, Default)]
pub struct Router {
    topics: HashMap<String, Topic>,

    /// `(session, filter)` pairs where the filter contains wildcards.
    /// Filters are normalized to the `prefix#` form.
    wildcard_subscriptions: HashSet<(SessionId, String)>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `packet` to the subscribers of its topic, excluding the
    /// `publisher` session itself.
    ///
    /// A topic name that fails validation is dropped. A publish that
    /// materializes a new topic applies every matching pending wildcard
    /// subscription first, so those sessions receive this very message.
    /// A retained publish is stored on the topic instead of being
    /// broadcast; an empty retained payload clears the stored message.
    pub fn publish(&mut self, publisher: SessionId, packet: &PublishPacket) -> Vec<Delivery> {
        let topic_name = packet.topic();
        if !is_valid_topic_name(topic_name) {
            log::warn!("router: Dropping publish to invalid topic: {topic_name:?}");
            return Vec::new();
        }

        if !self.topics.contains_key(topic_name) {
            self.create_topic(topic_name);
        }
        let topic = self
            .topics
            .get_mut(topic_name)
            .expect("topic was just created");

        if packet.retain() {
            topic.set_retained(packet);
            return Vec::new();
        }

        topic
            .subscribers()
            .iter()
            .filter(|&&session_id| session_id != publisher)
            .map(|&session_id| Delivery {
                session_id,
                packet: packet.clone(),
            })
            .collect()
    }

    /// Subscribe `session_id` to every topic matching `filter` and
    /// return the retained messages due to it.
    ///
    /// When nothing matches and the filter is itself a valid topic name,
    /// the topic is created. A filter containing wildcards is also
    /// recorded in the pending set so it applies to topics created later.
    pub fn subscribe(&mut self, filter: &str, session_id: SessionId) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        let Ok(parsed) = TopicFilter::parse(filter) else {
            log::warn!("router: Ignoring invalid filter: {filter:?}");
            return deliveries;
        };

        let mut matched = false;
        for topic in self.topics.values_mut() {
            if parsed.is_match(topic.name()) {
                topic.subscribe(session_id);
                matched = true;
                if let Some(retained) = topic.retained() {
                    deliveries.push(Delivery {
                        session_id,
                        packet: retained.clone(),
                    });
                }
            }
        }

        if !matched && is_valid_topic_name(filter) {
            self.create_topic(filter);
            self.topics
                .get_mut(filter)
                .expect("topic was just created")
                .subscribe(session_id);
        }

        if !is_valid_topic_name(filter) {
            self.wildcard_subscriptions
                .insert((session_id, TopicFilter::normalize(filter)));
        }

        deliveries
    }

    /// Remove `session_id` from every topic matching `filter` and drop
    /// its pending entry for `filter`. Idempotent.
    pub fn unsubscribe(&mut self, filter: &str, session_id: SessionId) {
        if let Ok(parsed) = TopicFilter::parse(filter) {
            for topic in self.topics.values_mut() {
                if parsed.is_match(topic.name()) {
                    topic.unsubscribe(session_id);
                }
            }
        }

        self.wildcard_subscriptions
            .remove(&(session_id, TopicFilter::normalize(filter)));
    }

    /// Remove `session_id` from every topic and every pending wildcard
    /// entry. Never fails.
    pub fn clear_session(&mut self, session_id: SessionId) {
        for topic in self.topics.values_mut() {
            topic.unsubscribe(session_id);
        }
        self.wildcard_subscriptions
            .retain(|(subscriber, _filter)| *subscriber != session_id);
    }

    /// Create topic `name` and apply matching pending wildcard
    /// subscriptions to it.
    fn create_topic(&mut self, name: &str) {
        let mut topic = Topic::new(name);
        for (session_id, filter) in &self.wildcard_subscriptions {
            match TopicFilter::parse(filter) {
                Ok(parsed) => {
                    if parsed.is_match(name) {
                        topic.subscribe(*session_id);
                    }
                }
                Err(err) => {
                    log::error!("router: Invalid pending filter {filter:?}, err: {err:?}");
                }
            }
        }
        self.topics.insert(name.to_string(), topic);
    }

    #[cfg(test)]
    fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::QoS;

    fn publish(topic: &str, payload: &[u8]) -> PublishPacket {
        PublishPacket::new(topic, QoS::AtMostOnce, payload).unwrap()
    }

    fn retained_publish(topic: &str, payload: &[u8]) -> PublishPacket {
        let mut packet = publish(topic, payload);
        packet.set_retain(true);
        packet
    }

    #[test]
    fn test_fan_out() {
        let mut router = Router::new();
        assert!(router.subscribe("x", 1).is_empty());
        assert!(router.subscribe("x", 2).is_empty());

        let deliveries = router.publish(99, &publish("x", &[0x42]));
        let mut ids: Vec<SessionId> = deliveries.iter().map(|d| d.session_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
        for delivery in &deliveries {
            assert_eq!(delivery.packet.message(), &[0x42]);
        }
    }

    #[test]
    fn test_publish_to_invalid_topic_is_dropped() {
        use codec::{ByteArray, DecodePacket};

        let mut router = Router::new();
        router.subscribe("#", 1);

        // A wildcard topic name straight off the wire.
        let buf = [0x30, 0x05, 0x00, 0x03, b'a', b'/', b'#'];
        let mut ba = ByteArray::new(&buf);
        let packet = PublishPacket::decode(&mut ba).unwrap();

        assert!(router.publish(99, &packet).is_empty());
        assert!(router.topic("a/#").is_none());
    }

    #[test]
    fn test_publisher_is_excluded_from_fan_out() {
        let mut router = Router::new();
        router.subscribe("x", 1);
        router.subscribe("x", 2);

        let deliveries = router.publish(1, &publish("x", &[0x42]));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 2);
    }

    #[test]
    fn test_retained_is_not_broadcast() {
        let mut router = Router::new();
        router.subscribe("t", 1);

        // Stored, not fanned out.
        assert!(router.publish(99, &retained_publish("t", b"hi")).is_empty());

        // Delivered to a new subscriber.
        let deliveries = router.subscribe("t", 2);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 2);
        assert_eq!(deliveries[0].packet.message(), b"hi");

        // Re-subscribing yields it again, exactly once.
        let deliveries = router.subscribe("t", 2);
        assert_eq!(deliveries.len(), 1);
    }

    #[test]
    fn test_retained_clear() {
        let mut router = Router::new();
        router.publish(99, &retained_publish("t", b"hi"));
        assert!(router.topic("t").unwrap().retained().is_some());

        router.publish(99, &retained_publish("t", b""));
        assert!(router.topic("t").unwrap().retained().is_none());
        assert!(router.subscribe("t", 1).is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut router = Router::new();
        router.subscribe("x", 1);
        router.unsubscribe("x", 1);
        assert!(router.publish(99, &publish("x", b"payload")).is_empty());

        // Idempotent.
        router.unsubscribe("x", 1);
    }

    #[test]
    fn test_wildcard_applies_to_new_topics() {
        let mut router = Router::new();
        router.subscribe("sensors/#", 1);

        // Topic created by this publish; the pending wildcard applies
        // before delivery.
        let deliveries = router.publish(99, &publish("sensors/kitchen", b"21"));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 1);

        // Another fresh topic, same filter.
        let deliveries = router.publish(99, &publish("sensors/attic/temp", b"3"));
        assert_eq!(deliveries.len(), 1);
    }

    #[test]
    fn test_wildcard_matches_existing_topics() {
        let mut router = Router::new();
        router.publish(99, &publish("a/b", b"x"));
        router.publish(99, &publish("a/c", b"x"));

        router.subscribe("a/+", 7);
        let deliveries = router.publish(99, &publish("a/b", b"y"));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 7);

        // `a/+` does not match a deeper topic.
        let deliveries = router.publish(99, &publish("a/b/c", b"z"));
        assert!(deliveries.is_empty());
    }

    #[test]
    fn test_unsubscribe_removes_pending_wildcard() {
        let mut router = Router::new();
        router.subscribe("w/#", 1);
        router.unsubscribe("w/#", 1);

        let deliveries = router.publish(99, &publish("w/new", b"x"));
        assert!(deliveries.is_empty());
    }

    #[test]
    fn test_unsubscribe_keeps_other_sessions() {
        let mut router = Router::new();
        router.subscribe("w/#", 1);
        router.subscribe("w/#", 2);
        router.unsubscribe("w/#", 1);

        let deliveries = router.publish(99, &publish("w/new", b"x"));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 2);
    }

    #[test]
    fn test_clear_session() {
        let mut router = Router::new();
        router.subscribe("a", 1);
        router.subscribe("b/#", 1);
        router.subscribe("a", 2);

        router.clear_session(1);

        let deliveries = router.publish(99, &publish("a", b"x"));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].session_id, 2);
        assert!(router.publish(99, &publish("b/c", b"x")).is_empty());
    }

    #[test]
    fn test_filter_truncated_at_first_hash() {
        let mut router = Router::new();
        router.subscribe("a/#/b", 1);

        let deliveries = router.publish(99, &publish("a/anything/at/all", b"x"));
        assert_eq!(deliveries.len(), 1);

        // Unsubscribe with the same odd spelling removes the pair.
        router.unsubscribe("a/#/b", 1);
        assert!(router.publish(99, &publish("a/more", b"x")).is_empty());
    }
}
