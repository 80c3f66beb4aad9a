// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_PASSWD_FILE, PASSWD_FILE_PATH_ENV};

mod file_auth;
mod passwd;

pub use file_auth::FileAuth;
pub use passwd::{Passwd, Salt};

/// Credential store consumed by the server during the connect handshake.
///
/// Implementations never raise across this boundary; any internal
/// failure reads as a refused login.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &[u8]) -> bool;
}

/// Resolve the password file path from the `PASSWD_FILE_PATH` environment
/// variable, defaulting to `~/.mqtt_passwd`. A leading `~/` is expanded
/// with the `HOME` environment variable.
#[must_use]
pub fn default_passwd_path() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_e| ".".to_string());
    match env::var(PASSWD_FILE_PATH_ENV) {
        Ok(path) => {
            if let Some(rest) = path.strip_prefix("~/") {
                PathBuf::from(home).join(rest)
            } else {
                PathBuf::from(path)
            }
        }
        Err(_e) => PathBuf::from(home).join(DEFAULT_PASSWD_FILE),
    }
}
