// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Maximum length of client id in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringError {
    /// Byte length exceeds the two byte length prefix.
    TooManyData,

    /// Not a valid UTF-8 byte sequence.
    InvalidString,
}

/// Check string length against the two byte length prefix.
///
/// # Errors
///
/// Returns error if `s` is longer than 64k bytes.
pub fn validate_utf8_string(s: &str) -> Result<(), StringError> {
    if s.len() > usize::from(u16::MAX) {
        return Err(StringError::TooManyData);
    }
    Ok(())
}

/// Convert a byte slice into an owned UTF-8 string.
///
/// # Errors
///
/// Returns error if `bytes` is not a valid UTF-8 sequence.
pub fn to_utf8_string(bytes: &[u8]) -> Result<String, StringError> {
    String::from_utf8(bytes.to_vec()).map_err(|_e| StringError::InvalidString)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdError {
    /// No chars at all.
    IsEmpty,

    /// Longer than 23 bytes.
    TooLong,
}

/// Check client id length, which shall be between 1 and 23 bytes.
///
/// # Errors
///
/// Returns error if `client_id` is empty or too long.
pub fn validate_client_id(client_id: &str) -> Result<(), ClientIdError> {
    if client_id.is_empty() {
        return Err(ClientIdError::IsEmpty);
    }
    if client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(ClientIdError::TooLong);
    }
    Ok(())
}

/// Generate a random alphanumeric string, used for client id suffixes.
#[must_use]
pub fn random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_client_id() {
        assert_eq!(validate_client_id(""), Err(ClientIdError::IsEmpty));
        assert!(validate_client_id("x").is_ok());
        assert!(validate_client_id(&"x".repeat(23)).is_ok());
        assert_eq!(
            validate_client_id(&"x".repeat(24)),
            Err(ClientIdError::TooLong)
        );
    }

    #[test]
    fn test_random_string() {
        let s = random_string(8);
        assert_eq!(s.len(), 8);
        assert!(s.bytes().all(|b| b.is_ascii_alphanumeric()));
    }
}
