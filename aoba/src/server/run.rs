// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Handles the accept/command select loop and server bootstrap.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::watch;

use super::Server;
use crate::auth::{self, Authenticator, FileAuth};
use crate::commands::ServerToSessionCmd;
use crate::config::Config;
use crate::error::Error;
use crate::session::Session;

/// Build the authenticator, bind the listener and serve until the
/// shutdown channel fires.
///
/// # Errors
///
/// Returns error if the password file cannot be written or the listener
/// address cannot be bound.
pub async fn run_server(config: &Config, shutdown_rx: watch::Receiver<bool>) -> Result<(), Error> {
    let auth: Option<Box<dyn Authenticator>> = if config.security().enable_auth() {
        let file_auth = FileAuth::new(auth::default_passwd_path());
        let users: Vec<(&str, &str)> = config
            .security()
            .users()
            .iter()
            .map(|user| (user.username(), user.password()))
            .collect();
        file_auth.regenerate(&users)?;
        log::info!(
            "server: Authentication is enabled, passwd file {:?}",
            file_auth.path()
        );
        Some(Box::new(file_auth))
    } else {
        None
    };

    let mut server = Server::bind(config.clone(), auth, shutdown_rx).await?;
    server.run_loop().await;
    Ok(())
}

impl Server {
    /// # Panics
    ///
    /// Raises panic if called twice: the command receiver can only be
    /// taken out once.
    pub async fn run_loop(&mut self) {
        let mut session_receiver = self
            .session_receiver
            .take()
            .expect("Invalid session receiver");

        loop {
            tokio::select! {
                ret = self.listener.accept() => match ret {
                    Ok((stream, address)) => self.new_connection(stream, address),
                    Err(err) => log::error!("server: Failed to accept connection: {err}"),
                },

                Some(cmd) = session_receiver.recv() => {
                    if let Err(err) = self.handle_session_cmd(cmd).await {
                        log::error!("server: Failed to handle session cmd: {err}");
                    }
                },

                _ = self.shutdown_rx.changed() => {
                    log::info!("server: Shutting down");
                    self.shutdown_sessions().await;
                    break;
                }
            }
        }
    }

    fn new_connection(&mut self, stream: TcpStream, address: SocketAddr) {
        let (sender, receiver) = mpsc::channel(self.config.listener().channel_capacity());
        let session_id = self.next_session_id();
        self.session_senders.insert(session_id, sender);

        let connect_timeout = Duration::from_secs(self.config.listener().connect_timeout());
        let session = Session::new(
            session_id,
            stream,
            connect_timeout,
            self.session_sender.clone(),
            receiver,
        );
        log::info!("server: New connection from {address}, session id {session_id}");
        tokio::spawn(session.run_loop());
    }

    /// Tell every live session to close. Sessions flush and shut their
    /// writers down; no will messages are published on this path.
    async fn shutdown_sessions(&mut self) {
        for (session_id, sender) in self.session_senders.drain() {
            if sender.send(ServerToSessionCmd::Disconnect).await.is_err() {
                log::debug!("server: Session {session_id} is already gone");
            }
        }
        // Give session tasks a moment to drain their writers.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
