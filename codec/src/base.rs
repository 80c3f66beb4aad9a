// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;
use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{ByteArray, DecodeError, EncodeError, PacketType, VarIntError};

/// Protocol name of MQTT 3.1.
pub const PROTOCOL_NAME: &str = "MQIsdp";

/// Convert a packet into a network byte stream.
pub trait EncodePacket {
    /// Encode packet into byte buffer `buf` and return number of bytes appended.
    ///
    /// # Errors
    ///
    /// Returns error if packet fields are invalid.
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError>;
}

/// Parse a packet from a network byte stream.
pub trait DecodePacket: Sized {
    /// Decode packet from byte array `ba`.
    ///
    /// # Errors
    ///
    /// Returns error if byte stream does not contain a well formed packet.
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError>;
}

pub trait Packet: fmt::Debug {
    fn packet_type(&self) -> PacketType;

    /// Get byte length of the whole packet, fixed header included.
    ///
    /// # Errors
    ///
    /// Returns error if packet size is out of range.
    fn bytes(&self) -> Result<usize, VarIntError>;
}

/// Packet identifier used in QoS 1/2 publish flows and in
/// subscribe/unsubscribe exchanges.
///
/// A non-zero value is required wherever the identifier is present on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u16);

impl PacketId {
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Get byte length in packet.
    #[must_use]
    #[inline]
    pub const fn bytes() -> usize {
        2
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DecodePacket for PacketId {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let value = ba.read_u16()?;
        Ok(Self(value))
    }
}

impl EncodePacket for PacketId {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.write_u16::<BigEndian>(self.0)?;
        Ok(Self::bytes())
    }
}

/// Level of assurance for delivery of a publish message.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QoS {
    /// At most once delivery.
    #[default]
    AtMostOnce = 0,

    /// At least once delivery.
    AtLeastOnce = 1,

    /// Exactly once delivery.
    ExactOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactOnce),
            _ => Err(DecodeError::InvalidQoS),
        }
    }
}
