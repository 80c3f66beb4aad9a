// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Per-connection session task: frame assembly, the connect handshake
//! and the connected-state packet dispatch.

use bytes::BytesMut;
use codec::v3::{
    ConnectAckPacket, ConnectPacket, ConnectReturnCode, DisconnectPacket, PingRequestPacket,
    PingResponsePacket, PublishAckPacket, PublishCompletePacket, PublishPacket,
    PublishReceivedPacket, PublishReleasePacket, SubscribePacket, UnsubscribePacket,
    UnsubscribeAckPacket,
};
use codec::{ByteArray, DecodeError, DecodePacket, EncodePacket, FixedHeader, PacketType, QoS};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{timeout, Instant};

use crate::commands::{ServerToSessionCmd, SessionToServerCmd};
use crate::error::{Error, ErrorKind};
use crate::types::SessionId;

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Invalid,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

/// A client connection. Owns the socket; everything that must reach the
/// shared router goes through the command channel to the server task.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    stream: TcpStream,
    buffer: BytesMut,
    status: Status,
    client_id: String,

    /// Keep-alive interval in seconds, 0 when disabled. The grace period
    /// for the next inbound packet is 1.5 times this value.
    keep_alive: u64,
    connect_timeout: Duration,

    /// Time the last complete frame arrived.
    instant: Instant,

    /// Set when the session ends on a malformed packet or an exceeded
    /// grace period; the server then publishes the will message.
    publish_will: bool,

    sender: Sender<SessionToServerCmd>,
    receiver: Receiver<ServerToSessionCmd>,
}

impl Session {
    #[must_use]
    pub fn new(
        id: SessionId,
        stream: TcpStream,
        connect_timeout: Duration,
        sender: Sender<SessionToServerCmd>,
        receiver: Receiver<ServerToSessionCmd>,
    ) -> Self {
        Self {
            id,
            stream,
            buffer: BytesMut::with_capacity(1024),
            status: Status::Invalid,
            client_id: String::new(),
            keep_alive: 0,
            connect_timeout,
            instant: Instant::now(),
            publish_will: false,
            sender,
            receiver,
        }
    }

    pub async fn run_loop(mut self) {
        log::info!("session: New connection, id {}", self.id);
        self.status = Status::Connecting;

        match self.wait_connect().await {
            Ok(true) => {
                self.status = Status::Connected;
                self.reset_instant();
                self.serve().await;
            }
            Ok(false) => {
                log::info!("session: Handshake did not complete, id {}", self.id);
            }
            Err(err) => {
                log::warn!("session: Connect failed, id {}, {err}", self.id);
            }
        }

        self.status = Status::Disconnecting;
        let _ret = self.stream.shutdown().await;
        self.status = Status::Disconnected;
        log::info!(
            "session: Closed, id {}, client id {:?}",
            self.id,
            self.client_id
        );

        if let Err(err) = self
            .sender
            .send(SessionToServerCmd::Disconnect {
                session_id: self.id,
                publish_will: self.publish_will,
            })
            .await
        {
            log::debug!("session: Server is gone, id {}, {err}", self.id);
        }
    }

    /// Reset the keep-alive timer; called when a frame arrives.
    fn reset_instant(&mut self) {
        self.instant = Instant::now();
    }

    /// Remaining time before the grace period for the next inbound frame
    /// runs out, or `None` when keep-alive is disabled.
    fn grace_period(&self) -> Option<Duration> {
        if self.keep_alive == 0 {
            return None;
        }
        let grace = Duration::from_millis(self.keep_alive * 1500);
        Some(grace.saturating_sub(self.instant.elapsed()))
    }

    async fn send<P: EncodePacket>(&mut self, packet: P) -> Result<(), Error> {
        let mut buf = Vec::new();
        packet.encode(&mut buf)?;
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Peel one complete frame off `buffer`, if one is fully buffered.
    ///
    /// # Errors
    ///
    /// Returns error if the remaining-length field still has the
    /// continuation bit set in its fourth byte.
    fn take_frame(buffer: &mut BytesMut) -> Result<Option<Vec<u8>>, Error> {
        if buffer.is_empty() {
            return Ok(None);
        }

        let mut remaining: usize = 0;
        let mut multiplier: usize = 1;
        let mut len_bytes = 0;
        loop {
            let Some(&byte) = buffer.get(1 + len_bytes) else {
                // Length field not complete yet.
                return Ok(None);
            };
            remaining += usize::from(byte & 0x7f) * multiplier;
            multiplier *= 128;
            len_bytes += 1;
            if byte & 0x80 == 0 {
                break;
            }
            if len_bytes == 4 {
                return Err(Error::new(
                    ErrorKind::DecodeError,
                    "Over-long remaining length field",
                ));
            }
        }

        let total = 1 + len_bytes + remaining;
        if buffer.len() < total {
            return Ok(None);
        }
        Ok(Some(buffer.split_to(total).to_vec()))
    }

    /// Read one complete frame from the socket.
    ///
    /// `Ok(None)` means the peer closed the connection at a frame
    /// boundary. The grace deadline only bounds the wait for the first
    /// byte of the next frame; payload reads are unbounded.
    ///
    /// # Errors
    ///
    /// Returns a decode error for a malformed length field or a
    /// mid-frame close, and a grace-period error when the deadline runs
    /// out before the next frame starts.
    async fn read_frame(
        stream: &mut TcpStream,
        buffer: &mut BytesMut,
        grace_period: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, Error> {
        loop {
            if let Some(frame) = Self::take_frame(buffer)? {
                return Ok(Some(frame));
            }

            let n_recv = if buffer.is_empty() {
                match grace_period {
                    Some(period) => match timeout(period, stream.read_buf(buffer)).await {
                        Ok(ret) => ret?,
                        Err(_elapsed) => {
                            return Err(Error::new(
                                ErrorKind::GracePeriodExceeded,
                                "No packet within 1.5 x keep alive",
                            ));
                        }
                    },
                    None => stream.read_buf(buffer).await?,
                }
            } else {
                stream.read_buf(buffer).await?
            };

            if n_recv == 0 {
                if buffer.is_empty() {
                    return Ok(None);
                }
                return Err(Error::new(
                    ErrorKind::DecodeError,
                    "Connection closed mid frame",
                ));
            }
        }
    }

    /// Run the connect handshake. `Ok(true)` means the session is
    /// connected; `Ok(false)` means the connection ended politely (a
    /// reject ack was sent, or the peer vanished) and the socket should
    /// be closed without noise.
    async fn wait_connect(&mut self) -> Result<bool, Error> {
        let connect_timeout = self.connect_timeout;
        let frame =
            match Self::read_frame(&mut self.stream, &mut self.buffer, Some(connect_timeout))
                .await?
            {
                Some(frame) => frame,
                None => return Ok(false),
            };

        let mut ba = ByteArray::new(&frame);
        let fixed_header = FixedHeader::decode(&mut ba)?;
        if fixed_header.packet_type() != PacketType::Connect {
            log::warn!(
                "session: Expected connect packet, got {:?}, id {}",
                fixed_header.packet_type(),
                self.id
            );
            return Ok(false);
        }

        ba.reset_offset();
        let packet = match ConnectPacket::decode(&mut ba) {
            Ok(packet) => packet,
            Err(DecodeError::InvalidProtocolLevel) => {
                let ack = ConnectAckPacket::new(ConnectReturnCode::UnacceptableProtocolVersion);
                self.send(ack).await?;
                return Ok(false);
            }
            Err(DecodeError::InvalidClientId) => {
                let ack = ConnectAckPacket::new(ConnectReturnCode::IdentifierRejected);
                self.send(ack).await?;
                return Ok(false);
            }
            // Covers an invalid protocol name as well: close without an ack.
            Err(err) => return Err(err.into()),
        };

        self.client_id = packet.client_id().to_string();
        self.keep_alive = u64::from(packet.keep_alive());

        self.sender
            .send(SessionToServerCmd::Connect(self.id, packet))
            .await?;

        // The server runs the auth gate and answers with the handshake
        // outcome.
        loop {
            match self.receiver.recv().await {
                Some(ServerToSessionCmd::ConnectAck(ack)) => {
                    let accepted = ack.return_code() == ConnectReturnCode::Accepted;
                    self.send(ack).await?;
                    return Ok(accepted);
                }
                Some(ServerToSessionCmd::Disconnect) | None => return Ok(false),
                Some(cmd) => {
                    log::warn!("session: Unexpected cmd before connect ack: {cmd:?}");
                }
            }
        }
    }

    async fn serve(&mut self) {
        loop {
            if self.status == Status::Disconnected {
                break;
            }

            let grace_period = self.grace_period();
            tokio::select! {
                ret = Self::read_frame(&mut self.stream, &mut self.buffer, grace_period) => {
                    match ret {
                        Ok(Some(frame)) => {
                            self.reset_instant();
                            if let Err(err) = self.handle_client_frame(&frame).await {
                                if err.kind() == ErrorKind::DecodeError {
                                    self.publish_will = true;
                                }
                                log::warn!("session: id {}, {err}", self.id);
                                break;
                            }
                        }
                        Ok(None) => {
                            log::info!("session: Connection closed by peer, id {}", self.id);
                            break;
                        }
                        Err(err) => {
                            if matches!(
                                err.kind(),
                                ErrorKind::DecodeError | ErrorKind::GracePeriodExceeded
                            ) {
                                self.publish_will = true;
                            }
                            log::warn!("session: id {}, {err}", self.id);
                            break;
                        }
                    }
                }
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if let Err(err) = self.handle_server_cmd(cmd).await {
                                log::error!(
                                    "session: Failed to handle server cmd, id {}, {err}",
                                    self.id
                                );
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle_client_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        let mut ba = ByteArray::new(frame);
        let fixed_header = FixedHeader::decode(&mut ba)?;
        // Packet decoders read the whole frame themselves.
        ba.reset_offset();

        match fixed_header.packet_type() {
            PacketType::Publish { .. } => self.on_client_publish(&mut ba).await,
            PacketType::PublishRelease => self.on_client_publish_release(&mut ba).await,
            PacketType::PublishReceived => self.on_client_publish_received(&mut ba).await,
            // Completion of broker-initiated QoS flows is not tracked.
            PacketType::PublishAck => {
                let _packet = PublishAckPacket::decode(&mut ba)?;
                Ok(())
            }
            PacketType::PublishComplete => {
                let _packet = PublishCompletePacket::decode(&mut ba)?;
                Ok(())
            }
            PacketType::Subscribe => self.on_client_subscribe(&mut ba).await,
            PacketType::Unsubscribe => self.on_client_unsubscribe(&mut ba).await,
            PacketType::PingRequest => self.on_client_ping(&mut ba).await,
            PacketType::Disconnect => self.on_client_disconnect(&mut ba).await,
            t => {
                log::warn!("session: Unhandled packet type {t:?}, id {}", self.id);
                Ok(())
            }
        }
    }

    async fn on_client_publish(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let packet = PublishPacket::decode(ba)?;
        let qos = packet.qos();
        let packet_id = packet.packet_id();

        // Route first, then acknowledge.
        self.sender
            .send(SessionToServerCmd::Publish(self.id, packet))
            .await?;

        match qos {
            QoS::AtMostOnce => Ok(()),
            QoS::AtLeastOnce => self.send(PublishAckPacket::new(packet_id)).await,
            QoS::ExactOnce => self.send(PublishReceivedPacket::new(packet_id)).await,
        }
    }

    async fn on_client_publish_release(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let packet = PublishReleasePacket::decode(ba)?;
        self.send(PublishCompletePacket::new(packet.packet_id())).await
    }

    async fn on_client_publish_received(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let packet = PublishReceivedPacket::decode(ba)?;
        self.send(PublishReleasePacket::new(packet.packet_id())).await
    }

    async fn on_client_subscribe(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let packet = SubscribePacket::decode(ba)?;
        // The subscribe ack comes back from the server, after any
        // retained messages.
        self.sender
            .send(SessionToServerCmd::Subscribe(self.id, packet))
            .await
            .map_err(Into::into)
    }

    async fn on_client_unsubscribe(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let packet = UnsubscribePacket::decode(ba)?;
        let packet_id = packet.packet_id();
        self.sender
            .send(SessionToServerCmd::Unsubscribe(self.id, packet))
            .await?;

        self.send(UnsubscribeAckPacket::new(packet_id)).await
    }

    async fn on_client_ping(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let _packet = PingRequestPacket::decode(ba)?;
        self.send(PingResponsePacket::new()).await
    }

    async fn on_client_disconnect(&mut self, ba: &mut ByteArray<'_>) -> Result<(), Error> {
        let _packet = DisconnectPacket::decode(ba)?;
        self.status = Status::Disconnected;
        Ok(())
    }

    async fn handle_server_cmd(&mut self, cmd: ServerToSessionCmd) -> Result<(), Error> {
        match cmd {
            ServerToSessionCmd::Publish(packet) => self.send(packet).await,
            ServerToSessionCmd::SubscribeAck(packet) => self.send(packet).await,
            ServerToSessionCmd::Disconnect => {
                self.status = Status::Disconnected;
                Ok(())
            }
            ServerToSessionCmd::ConnectAck(packet) => {
                log::warn!("session: Dropping late connect ack: {packet:?}");
                Ok(())
            }
        }
    }
}
