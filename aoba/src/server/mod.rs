// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Accept loop, session registry and router dispatch.

use codec::PacketId;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch;

use crate::auth::Authenticator;
use crate::commands::{ServerToSessionCmd, SessionToServerCmd};
use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::router::Router;
use crate::types::{SessionId, SessionInfo};

mod run;
mod session;

pub use run::run_server;

/// The broker core: owns the TCP listener, the topic router and the
/// registry of live sessions. All router mutation happens on this task;
/// deliveries leave as channel sends and the subscriber's own task
/// performs the socket write.
pub struct Server {
    config: Config,
    auth: Option<Box<dyn Authenticator>>,
    listener: TcpListener,
    router: Router,

    current_session_id: SessionId,

    /// Packet id sequencer for broker-originated publish packets.
    /// Starts at 1 and wraps modulo 65 536; 0 is reserved.
    current_packet_id: u16,

    session_senders: HashMap<SessionId, Sender<ServerToSessionCmd>>,
    sessions: HashMap<SessionId, SessionInfo>,
    client_ids: BTreeMap<String, SessionId>,

    session_sender: Sender<SessionToServerCmd>,
    session_receiver: Option<Receiver<SessionToServerCmd>>,

    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Bind the TCP listener and build the server.
    ///
    /// # Errors
    ///
    /// Returns error if the listener address cannot be bound.
    pub async fn bind(
        config: Config,
        auth: Option<Box<dyn Authenticator>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self, Error> {
        let address = config.listener().address(config.security().enable_auth());
        let listener = TcpListener::bind(&address).await.map_err(|err| {
            Error::from_string(
                ErrorKind::SocketError,
                format!("Failed to bind to {address}: {err}"),
            )
        })?;
        log::info!("server: Listening on {}", listener.local_addr()?);

        let (session_sender, session_receiver) =
            mpsc::channel(config.listener().channel_capacity());

        Ok(Self {
            config,
            auth,
            listener,
            router: Router::new(),
            current_session_id: 0,
            current_packet_id: 0,
            session_senders: HashMap::new(),
            sessions: HashMap::new(),
            client_ids: BTreeMap::new(),
            session_sender,
            session_receiver: Some(session_receiver),
            shutdown_rx,
        })
    }

    /// Get the bound listener address.
    ///
    /// # Errors
    ///
    /// Returns error if the socket is gone.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.listener.local_addr().map_err(Into::into)
    }

    fn next_session_id(&mut self) -> SessionId {
        self.current_session_id += 1;
        self.current_session_id
    }

    fn next_packet_id(&mut self) -> PacketId {
        self.current_packet_id = match self.current_packet_id.wrapping_add(1) {
            0 => 1,
            id => id,
        };
        PacketId::new(self.current_packet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_packet_id_sequencer_wraps() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut config = Config::default();
        config.mut_listener().set_port(0);
        let mut server = Server::bind(config, None, shutdown_rx).await.unwrap();

        assert_eq!(server.next_packet_id(), PacketId::new(1));
        assert_eq!(server.next_packet_id(), PacketId::new(2));

        server.current_packet_id = u16::MAX;
        // 0 is reserved, the sequencer skips it.
        assert_eq!(server.next_packet_id(), PacketId::new(1));
    }
}
