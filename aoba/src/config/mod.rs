// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::Deserialize;

use crate::error::Error;

mod listener;
mod log;
mod security;

pub use self::log::{Log, LogLevel};
pub use listener::Listener;
pub use security::{Security, User};

/// Server main config.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "Listener::default")]
    listener: Listener,

    #[serde(default = "Security::default")]
    security: Security,

    #[serde(default = "Log::default")]
    log: Log,
}

impl Config {
    /// Parse config from toml text.
    ///
    /// # Errors
    ///
    /// Returns error if `content` is not a valid config document.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    #[must_use]
    pub const fn listener(&self) -> &Listener {
        &self.listener
    }

    #[must_use]
    pub const fn security(&self) -> &Security {
        &self.security
    }

    pub fn mut_security(&mut self) -> &mut Security {
        &mut self.security
    }

    #[must_use]
    pub const fn log(&self) -> &Log {
        &self.log
    }

    pub fn mut_listener(&mut self) -> &mut Listener {
        &mut self.listener
    }

    /// Validate config.
    ///
    /// # Errors
    ///
    /// Returns error if some options in config are invalid.
    pub fn validate(&self) -> Result<(), Error> {
        self.listener.validate()?;
        self.security.validate()?;
        self.log.validate()
    }
}
