// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::Deserialize;

use crate::constants::{CHANNEL_CAPACITY, DEFAULT_AUTH_PORT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
use crate::error::Error;

/// TCP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Listener {
    /// Binding address, excluding port.
    #[serde(default = "Listener::default_ip")]
    ip: String,

    /// Binding port. When absent, 1883 is used, or 1884 when
    /// authentication is enabled.
    #[serde(default)]
    port: Option<u16>,

    /// Seconds a new connection may take to send its connect packet
    /// before it is dropped.
    #[serde(default = "Listener::default_connect_timeout")]
    connect_timeout: u64,

    /// Capacity of the command channels between server and sessions.
    #[serde(default = "Listener::default_channel_capacity")]
    channel_capacity: usize,
}

impl Listener {
    fn default_ip() -> String {
        "127.0.0.1".to_string()
    }

    const fn default_connect_timeout() -> u64 {
        DEFAULT_CONNECT_TIMEOUT
    }

    const fn default_channel_capacity() -> usize {
        CHANNEL_CAPACITY
    }

    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Get the effective binding port for `auth_enabled`.
    #[must_use]
    pub fn port(&self, auth_enabled: bool) -> u16 {
        self.port.unwrap_or(if auth_enabled {
            DEFAULT_AUTH_PORT
        } else {
            DEFAULT_PORT
        })
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// Get the binding address for `auth_enabled`, `ip:port`.
    #[must_use]
    pub fn address(&self, auth_enabled: bool) -> String {
        format!("{}:{}", self.ip, self.port(auth_enabled))
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> u64 {
        self.connect_timeout
    }

    #[must_use]
    pub const fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Validate listener config.
    ///
    /// # Errors
    ///
    /// Returns error if some options are invalid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ip.is_empty() {
            return Err(Error::new(
                crate::error::ErrorKind::ConfigError,
                "listener.ip must not be empty",
            ));
        }
        if self.connect_timeout == 0 {
            return Err(Error::new(
                crate::error::ErrorKind::ConfigError,
                "listener.connect_timeout must be positive",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(Error::new(
                crate::error::ErrorKind::ConfigError,
                "listener.channel_capacity must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            ip: Self::default_ip(),
            port: None,
            connect_timeout: Self::default_connect_timeout(),
            channel_capacity: Self::default_channel_capacity(),
        }
    }
}
