// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use openssl::hash::{Hasher, MessageDigest};
use rand::Rng;
use std::fmt::Write;

use crate::error::{Error, ErrorKind};

/// Byte length of the random salt.
pub const SALT_LEN: usize = 16;

/// Hex length of a sha256 digest.
pub const HASH_LEN: usize = 64;

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(s, "{byte:02x}");
    }
    s
}

/// Per-process random salt, rendered as 32 hex characters.
///
/// The salt is generated once per broker process and applied uniformly,
/// which is why the password file is regenerated at every startup.
#[derive(Debug, Clone)]
pub struct Salt(String);

impl Salt {
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
        Self(hex_encode(&bytes))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A salted password hash, `sha256(password ∥ salt)` stored as hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passwd {
    passwd_hash: String,
}

impl Passwd {
    /// Hash `passwd` with `salt`.
    ///
    /// # Errors
    ///
    /// Returns error if the digest fails.
    pub fn generate(passwd: &[u8], salt: &Salt) -> Result<Self, Error> {
        let mut h = Hasher::new(MessageDigest::sha256())?;
        h.update(passwd)?;
        h.update(salt.as_str().as_bytes())?;
        let digest = h.finish()?;
        Ok(Self {
            passwd_hash: hex_encode(&digest),
        })
    }

    /// Check `passwd` against this hash.
    #[must_use]
    pub fn match_passwd(&self, passwd: &[u8], salt: &Salt) -> bool {
        Self::generate(passwd, salt).map_or(false, |other| other == *self)
    }

    /// Parse a `username:hash` line from the password file.
    ///
    /// Empty lines and lines starting with `#` yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns error if the line has no separator or the hash part has
    /// an unexpected length.
    pub fn parse(line: &str) -> Result<Option<(&str, Self)>, Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let Some((username, hash)) = line.split_once(':') else {
            return Err(Error::from_string(
                ErrorKind::ParameterError,
                format!("Invalid passwd line: {line:?}"),
            ));
        };
        if hash.len() != HASH_LEN {
            return Err(Error::from_string(
                ErrorKind::ParameterError,
                format!("Invalid passwd hash for user {username:?}"),
            ));
        }
        Ok(Some((
            username,
            Self {
                passwd_hash: hash.to_string(),
            },
        )))
    }

    /// Render as a `username:hash` password file line.
    #[must_use]
    pub fn dump(&self, username: &str) -> String {
        format!("{}:{}", username, self.passwd_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let salt = Salt::generate();
        assert_eq!(salt.as_str().len(), SALT_LEN * 2);

        let passwd = Passwd::generate(b"admin", &salt).unwrap();
        assert!(passwd.match_passwd(b"admin", &salt));
        assert!(!passwd.match_passwd(b"guest", &salt));

        // A different salt yields a different hash.
        let other_salt = Salt::generate();
        let other = Passwd::generate(b"admin", &other_salt).unwrap();
        assert_ne!(passwd, other);
    }

    #[test]
    fn test_parse_dump() {
        let salt = Salt::generate();
        let passwd = Passwd::generate(b"secret", &salt).unwrap();
        let line = passwd.dump("user-1");

        let (username, parsed) = Passwd::parse(&line).unwrap().unwrap();
        assert_eq!(username, "user-1");
        assert_eq!(parsed, passwd);
    }

    #[test]
    fn test_parse_skips_comments() {
        assert!(Passwd::parse("").unwrap().is_none());
        assert!(Passwd::parse("  # comment").unwrap().is_none());
        assert!(Passwd::parse("not-a-passwd-line").is_err());
    }
}
