// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use codec::v3::ConnectPacket;
use codec::QoS;

pub type SessionId = u64;

/// Will message declared at connect time, published by the server when
/// the client connection ends abnormally.
#[derive(Debug, Clone)]
pub struct WillMessage {
    pub topic: String,
    pub message: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl WillMessage {
    /// Extract the will fields of a connect packet, if the will flag is set.
    #[must_use]
    pub fn from_connect(packet: &ConnectPacket) -> Option<Self> {
        if !packet.connect_flags().will() {
            return None;
        }
        let topic = packet.will_topic()?;
        Some(Self {
            topic: topic.to_string(),
            message: packet.will_message().to_vec(),
            qos: packet.connect_flags().will_qos(),
            retain: packet.connect_flags().will_retain(),
        })
    }
}

/// Server side record of a connected session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub client_id: String,
    pub clean_session: bool,
    pub will: Option<WillMessage>,
}
