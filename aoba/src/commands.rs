// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use codec::v3::{
    ConnectAckPacket, ConnectPacket, PublishPacket, SubscribeAckPacket, SubscribePacket,
    UnsubscribePacket,
};

use crate::types::SessionId;

/// Commands a session task sends to the server task.
#[derive(Debug, Clone)]
pub enum SessionToServerCmd {
    Connect(SessionId, ConnectPacket),

    Publish(SessionId, PublishPacket),

    Subscribe(SessionId, SubscribePacket),

    Unsubscribe(SessionId, UnsubscribePacket),

    /// Session is gone. `publish_will` is set when the session ended on a
    /// malformed packet or an exceeded grace period.
    Disconnect {
        session_id: SessionId,
        publish_will: bool,
    },
}

/// Commands the server task sends to a session task.
#[derive(Debug, Clone)]
pub enum ServerToSessionCmd {
    /// Outcome of the connect handshake, forwarded to the client.
    ConnectAck(ConnectAckPacket),

    /// Message to deliver to the client.
    Publish(PublishPacket),

    SubscribeAck(SubscribeAckPacket),

    /// Close the client connection without publishing the will.
    Disconnect,
}
