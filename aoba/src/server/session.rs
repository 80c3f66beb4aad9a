// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Session cmd handlers.

use codec::v3::{
    ConnectAckPacket, ConnectPacket, ConnectReturnCode, PublishPacket, SubscribeAck,
    SubscribeAckPacket, SubscribePacket, UnsubscribePacket,
};
use codec::QoS;

use super::Server;
use crate::commands::{ServerToSessionCmd, SessionToServerCmd};
use crate::error::Error;
use crate::router::Delivery;
use crate::types::{SessionId, SessionInfo, WillMessage};

impl Server {
    pub(super) async fn handle_session_cmd(&mut self, cmd: SessionToServerCmd) -> Result<(), Error> {
        match cmd {
            SessionToServerCmd::Connect(session_id, packet) => {
                self.on_session_connect(session_id, &packet).await
            }
            SessionToServerCmd::Publish(session_id, packet) => {
                self.on_session_publish(session_id, &packet).await
            }
            SessionToServerCmd::Subscribe(session_id, packet) => {
                self.on_session_subscribe(session_id, &packet).await
            }
            SessionToServerCmd::Unsubscribe(session_id, packet) => {
                self.on_session_unsubscribe(session_id, &packet)
            }
            SessionToServerCmd::Disconnect {
                session_id,
                publish_will,
            } => self.on_session_disconnect(session_id, publish_will).await,
        }
    }

    /// Run the auth gate and record the session. A client id already in
    /// use disconnects its current owner first [MQTT-3.1.4-2].
    async fn on_session_connect(
        &mut self,
        session_id: SessionId,
        packet: &ConnectPacket,
    ) -> Result<(), Error> {
        let mut return_code = ConnectReturnCode::Accepted;
        if self.config.security().enable_auth() {
            if packet.username().is_empty() || packet.password().is_empty() {
                return_code = ConnectReturnCode::NotAuthorized;
            } else {
                let authenticated = self
                    .auth
                    .as_ref()
                    .map_or(false, |auth| {
                        auth.authenticate(packet.username(), packet.password())
                    });
                if !authenticated {
                    return_code = ConnectReturnCode::BadUserNameOrPassword;
                }
            }
        }

        if return_code == ConnectReturnCode::Accepted {
            if let Some(&old_session_id) = self.client_ids.get(packet.client_id()) {
                if old_session_id != session_id {
                    log::info!(
                        "server: Client id {:?} taken over, disconnecting session {old_session_id}",
                        packet.client_id()
                    );
                    if let Err(err) = self.disconnect_session(old_session_id).await {
                        log::error!(
                            "server: Failed to disconnect session {old_session_id}, {err}"
                        );
                    }
                }
            }
            self.client_ids
                .insert(packet.client_id().to_string(), session_id);
            self.sessions.insert(
                session_id,
                SessionInfo {
                    client_id: packet.client_id().to_string(),
                    clean_session: packet.connect_flags().clean_session(),
                    will: WillMessage::from_connect(packet),
                },
            );
        }

        let ack_packet = ConnectAckPacket::new(return_code);
        self.send_to_session(session_id, ServerToSessionCmd::ConnectAck(ack_packet))
            .await
    }

    async fn on_session_publish(
        &mut self,
        session_id: SessionId,
        packet: &PublishPacket,
    ) -> Result<(), Error> {
        let deliveries = self.router.publish(session_id, packet);
        self.dispatch(deliveries).await
    }

    async fn on_session_subscribe(
        &mut self,
        session_id: SessionId,
        packet: &SubscribePacket,
    ) -> Result<(), Error> {
        let mut acks = Vec::with_capacity(packet.topics().len());
        let mut deliveries = Vec::new();
        for topic in packet.topics() {
            deliveries.extend(self.router.subscribe(topic.topic(), session_id));
            // The granted level echoes the request.
            acks.push(SubscribeAck::QoS(topic.qos()));
        }

        // Retained messages go out before the subscribe ack.
        self.dispatch(deliveries).await?;

        let ack_packet = SubscribeAckPacket::with_vec(packet.packet_id(), acks);
        self.send_to_session(session_id, ServerToSessionCmd::SubscribeAck(ack_packet))
            .await
    }

    fn on_session_unsubscribe(
        &mut self,
        session_id: SessionId,
        packet: &UnsubscribePacket,
    ) -> Result<(), Error> {
        for topic in packet.topics() {
            self.router.unsubscribe(topic.as_ref(), session_id);
        }
        Ok(())
    }

    async fn on_session_disconnect(
        &mut self,
        session_id: SessionId,
        publish_will: bool,
    ) -> Result<(), Error> {
        log::info!("server: Session {session_id} disconnected");
        self.session_senders.remove(&session_id);

        let Some(info) = self.sessions.remove(&session_id) else {
            return Ok(());
        };
        if self.client_ids.get(&info.client_id) == Some(&session_id) {
            self.client_ids.remove(&info.client_id);
        }

        if publish_will {
            if let Some(will) = &info.will {
                if let Err(err) = self.publish_will(session_id, will).await {
                    log::error!(
                        "server: Failed to publish will of session {session_id}, {err}"
                    );
                }
            }
        }

        if info.clean_session {
            self.router.clear_session(session_id);
        }
        Ok(())
    }

    /// Synthesize a publish packet from the recorded will fields and
    /// route it like any other message from that session.
    async fn publish_will(
        &mut self,
        session_id: SessionId,
        will: &WillMessage,
    ) -> Result<(), Error> {
        let mut packet = PublishPacket::new(&will.topic, will.qos, &will.message)?;
        packet.set_retain(will.retain);
        if will.qos != QoS::AtMostOnce {
            let packet_id = self.next_packet_id();
            packet.set_packet_id(packet_id);
        }
        let deliveries = self.router.publish(session_id, &packet);
        self.dispatch(deliveries).await
    }

    /// Forward deliveries to their subscriber sessions, stamping a fresh
    /// packet id on each QoS > 0 copy. A stale session id is skipped.
    async fn dispatch(&mut self, deliveries: Vec<Delivery>) -> Result<(), Error> {
        for delivery in deliveries {
            let Delivery {
                session_id,
                mut packet,
            } = delivery;
            if packet.qos() != QoS::AtMostOnce {
                let packet_id = self.next_packet_id();
                packet.set_packet_id(packet_id);
            }
            match self.session_senders.get(&session_id) {
                Some(sender) => {
                    if let Err(err) = sender.send(ServerToSessionCmd::Publish(packet)).await {
                        log::error!(
                            "server: Failed to send publish to session {session_id}, {err}"
                        );
                    }
                }
                None => {
                    log::debug!("server: Dropping delivery for stale session {session_id}");
                }
            }
        }
        Ok(())
    }

    async fn send_to_session(
        &mut self,
        session_id: SessionId,
        cmd: ServerToSessionCmd,
    ) -> Result<(), Error> {
        if let Some(sender) = self.session_senders.get(&session_id) {
            sender.send(cmd).await.map_err(Into::into)
        } else {
            Err(Error::session_error(session_id))
        }
    }

    async fn disconnect_session(&mut self, session_id: SessionId) -> Result<(), Error> {
        self.send_to_session(session_id, ServerToSessionCmd::Disconnect)
            .await
    }
}
