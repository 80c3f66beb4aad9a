// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicError {
    /// Topic name or filter has no chars.
    EmptyTopic,

    /// Longer than the two byte length prefix allows.
    TooManyData,

    /// Topic name contains wildcard chars or empty segments.
    InvalidChar,
}

/// Check whether `name` is a canonical topic name: non-empty, at least
/// one symbol in every `/`-separated segment, and no wildcard chars.
#[must_use]
pub fn is_valid_topic_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('/')
            .all(|segment| !segment.is_empty() && !segment.contains(['#', '+']))
}

/// Validate a topic name used in publish packets.
///
/// # Errors
///
/// Returns error if `name` is empty, too long, or not canonical.
pub fn validate_pub_topic(name: &str) -> Result<(), TopicError> {
    if name.is_empty() {
        return Err(TopicError::EmptyTopic);
    }
    if name.len() > usize::from(u16::MAX) {
        return Err(TopicError::TooManyData);
    }
    if !is_valid_topic_name(name) {
        return Err(TopicError::InvalidChar);
    }
    Ok(())
}

/// Validate a topic filter used in subscribe/unsubscribe packets.
///
/// Filters may contain wildcards; anything past the first `#` is
/// ignored by the matcher, so only emptiness and length are checked here.
///
/// # Errors
///
/// Returns error if `filter` is empty or too long.
pub fn validate_sub_topic(filter: &str) -> Result<(), TopicError> {
    if filter.is_empty() {
        return Err(TopicError::EmptyTopic);
    }
    if filter.len() > usize::from(u16::MAX) {
        return Err(TopicError::TooManyData);
    }
    Ok(())
}

/// A canonical topic name carried in publish packets. No wildcards.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PubTopic(String);

impl PubTopic {
    /// Create a new topic name.
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a canonical topic name.
    pub fn new(name: &str) -> Result<Self, TopicError> {
        validate_pub_topic(name)?;
        Ok(Self(name.to_string()))
    }

    /// Get byte length in packet.
    #[must_use]
    pub fn bytes(&self) -> usize {
        2 + self.0.len()
    }
}

impl AsRef<str> for PubTopic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl DecodePacket for PubTopic {
    // Names are not validated on decode; the router drops publishes to
    // ill-formed topics without tearing the connection down.
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let len = ba.read_u16()?;
        let s = ba.read_string(len as usize)?;
        Ok(Self(s))
    }
}

impl EncodePacket for PubTopic {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        #[allow(clippy::cast_possible_truncation)]
        let len = self.0.len() as u16;
        buf.write_u16::<BigEndian>(len)?;
        buf.write_all(self.0.as_bytes())?;
        Ok(self.bytes())
    }
}

/// A topic filter carried in subscribe/unsubscribe packets. May contain
/// `+` and `#` wildcards.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubTopic(String);

impl SubTopic {
    /// Create a new topic filter.
    ///
    /// # Errors
    ///
    /// Returns error if `filter` is empty or too long.
    pub fn new(filter: &str) -> Result<Self, TopicError> {
        validate_sub_topic(filter)?;
        Ok(Self(filter.to_string()))
    }

    /// Get byte length in packet.
    #[must_use]
    pub fn bytes(&self) -> usize {
        2 + self.0.len()
    }
}

impl AsRef<str> for SubTopic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl DecodePacket for SubTopic {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let len = ba.read_u16()?;
        let s = ba.read_string(len as usize)?;
        validate_sub_topic(&s)?;
        Ok(Self(s))
    }
}

impl EncodePacket for SubTopic {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        #[allow(clippy::cast_possible_truncation)]
        let len = self.0.len() as u16;
        buf.write_u16::<BigEndian>(len)?;
        buf.write_all(self.0.as_bytes())?;
        Ok(self.bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum FilterPart {
    /// Literal segment.
    Normal(String),

    /// `+` char, matches exactly one segment.
    SingleWildcard,

    /// `#` char, matches any suffix of zero or more segments.
    MultiWildcard,
}

impl FilterPart {
    fn parse(s: &str) -> Self {
        match s {
            "+" => Self::SingleWildcard,
            "#" => Self::MultiWildcard,
            _ => Self::Normal(s.to_string()),
        }
    }
}

/// A parsed topic filter used to match canonical topic names.
///
/// Any occurrence of `#` truncates the filter: everything after the
/// first `#` is dropped and the filter ends in a tail wildcard, so
/// `a/#/b` is equivalent to `a/#`.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicFilter {
    filter: String,
    parts: Vec<FilterPart>,
}

impl TopicFilter {
    /// Parse a filter string, normalizing anything containing `#` to
    /// the single `prefix#` form.
    ///
    /// # Errors
    ///
    /// Returns error if `filter` is empty.
    pub fn parse(filter: &str) -> Result<Self, TopicError> {
        if filter.is_empty() {
            return Err(TopicError::EmptyTopic);
        }
        let normalized = Self::normalize(filter);
        let parts = normalized.split('/').map(FilterPart::parse).collect();
        Ok(Self {
            filter: normalized,
            parts,
        })
    }

    /// Truncate `filter` at the first `#`.
    #[must_use]
    pub fn normalize(filter: &str) -> String {
        match filter.find('#') {
            Some(pos) => format!("{}#", &filter[..pos]),
            None => filter.to_string(),
        }
    }

    /// Get the normalized filter string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.filter
    }

    /// Check whether canonical topic name `name` matches this filter.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        let mut segments = name.split('/');
        for part in &self.parts {
            match part {
                FilterPart::MultiWildcard => return true,
                FilterPart::SingleWildcard => {
                    if segments.next().is_none() {
                        return false;
                    }
                }
                FilterPart::Normal(s) => match segments.next() {
                    Some(segment) if segment == s => {}
                    _ => return false,
                },
            }
        }
        segments.next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_topic_name() {
        assert!(is_valid_topic_name("a"));
        assert!(is_valid_topic_name("sport/tennis/player1"));
        assert!(!is_valid_topic_name(""));
        assert!(!is_valid_topic_name("a//b"));
        assert!(!is_valid_topic_name("/a"));
        assert!(!is_valid_topic_name("a/"));
        assert!(!is_valid_topic_name("a/+/b"));
        assert!(!is_valid_topic_name("a/#"));
    }

    #[test]
    fn test_multi_wildcard() {
        let filter = TopicFilter::parse("#").unwrap();
        assert!(filter.is_match("a"));
        assert!(filter.is_match("a/b"));
        assert!(filter.is_match("sport/tennis/player1"));

        let filter = TopicFilter::parse("sport/#").unwrap();
        assert!(filter.is_match("sport"));
        assert!(filter.is_match("sport/tennis"));
        assert!(filter.is_match("sport/tennis/player1"));
        assert!(!filter.is_match("other"));
    }

    #[test]
    fn test_single_wildcard() {
        let filter = TopicFilter::parse("a/+").unwrap();
        assert!(filter.is_match("a/b"));
        assert!(!filter.is_match("a/b/c"));
        assert!(!filter.is_match("a"));

        let filter = TopicFilter::parse("+/b").unwrap();
        assert!(filter.is_match("a/b"));
        assert!(filter.is_match("x/b"));
        assert!(!filter.is_match("a/x"));
    }

    #[test]
    fn test_filter_normalization() {
        // Everything after the first `#` is dropped.
        let filter = TopicFilter::parse("a/#/b").unwrap();
        assert_eq!(filter.as_str(), "a/#");
        assert!(filter.is_match("a/x"));
        assert!(filter.is_match("a/x/y"));

        let filter = TopicFilter::parse("a#").unwrap();
        assert_eq!(filter.as_str(), "a#");
    }

    #[test]
    fn test_literal_filter() {
        let filter = TopicFilter::parse("a/b").unwrap();
        assert!(filter.is_match("a/b"));
        assert!(!filter.is_match("a"));
        assert!(!filter.is_match("a/b/c"));
    }
}
