// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use codec::v3::PublishPacket;
use std::collections::HashSet;

use crate::types::SessionId;

/// A named topic node: its current subscribers and the retained message,
/// if any. Subscribers are plain session ids; the server maps ids to
/// live sessions, so a stale id is skipped at dispatch time.
#[derive(Debug, Clone)]
pub struct Topic {
    name: String,
    subscribers: HashSet<SessionId>,
    retained: Option<PublishPacket>,
}

impl Topic {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
            retained: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `session_id` to the subscriber set. Idempotent.
    pub fn subscribe(&mut self, session_id: SessionId) {
        self.subscribers.insert(session_id);
    }

    /// Remove `session_id` from the subscriber set. Idempotent.
    pub fn unsubscribe(&mut self, session_id: SessionId) {
        self.subscribers.remove(&session_id);
    }

    #[must_use]
    pub const fn subscribers(&self) -> &HashSet<SessionId> {
        &self.subscribers
    }

    #[must_use]
    pub const fn retained(&self) -> Option<&PublishPacket> {
        self.retained.as_ref()
    }

    /// Store a retained message. An empty payload clears the retained
    /// slot instead of storing an empty message.
    pub fn set_retained(&mut self, packet: &PublishPacket) {
        if packet.message().is_empty() {
            self.retained = None;
        } else {
            self.retained = Some(packet.clone());
        }
    }
}
