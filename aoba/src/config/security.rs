// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::Deserialize;

use crate::error::Error;

/// Authentication settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Security {
    /// When set, clients must present a username and password matching
    /// an entry in the password file.
    #[serde(default)]
    enable_auth: bool,

    /// User list the password file is regenerated from at startup.
    #[serde(default)]
    users: Vec<User>,
}

/// A username/password pair from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    username: String,
    password: String,
}

impl User {
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Security {
    #[must_use]
    pub const fn enable_auth(&self) -> bool {
        self.enable_auth
    }

    pub fn set_enable_auth(&mut self, enable_auth: bool) {
        self.enable_auth = enable_auth;
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Validate security config.
    ///
    /// # Errors
    ///
    /// Returns error if a username contains a colon, which the password
    /// file format cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        for user in &self.users {
            if user.username.is_empty() || user.username.contains(':') {
                return Err(Error::from_string(
                    crate::error::ErrorKind::ConfigError,
                    format!("Invalid username in security.users: {:?}", user.username),
                ));
            }
        }
        Ok(())
    }
}
