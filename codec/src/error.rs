// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::io;

use crate::byte_array::ByteArrayError;
use crate::topic::TopicError;
use crate::utils::StringError;
use crate::var_int::VarIntError;

/// Errors raised while parsing a packet from a byte stream.
///
/// Apart from `InvalidProtocolLevel` and `InvalidClientId`, which the
/// CONNECT handler answers with a ConnectAck return code, every variant
/// means the packet is malformed and the network connection must be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Type bits in fixed header do not name a known packet kind.
    InvalidPacketType,

    /// Reserved flag bits in fixed header carry an unexpected value.
    InvalidPacketFlags,

    /// Tried to read past the end of the buffer.
    OutOfRange,

    /// String field is not valid UTF-8 or too long.
    InvalidString,

    /// Remaining-length field does not terminate within four bytes.
    InvalidVarInt,

    /// Remaining-length field disagrees with the actual payload.
    InvalidRemainingLength,

    /// Protocol name is not `MQIsdp`.
    InvalidProtocolName,

    /// Protocol level byte is not 3.
    InvalidProtocolLevel,

    /// Client id is empty or longer than 23 bytes.
    InvalidClientId,

    /// Connect flag combination violates the protocol.
    InvalidConnectFlags,

    /// Packet id is zero where a non-zero id is required.
    InvalidPacketId,

    /// QoS byte is not 0, 1 or 2, or reserved QoS bits are set.
    InvalidQoS,

    /// Topic name contains wildcards or empty segments.
    InvalidTopic,

    /// Subscribe/unsubscribe payload contains no topic filter.
    EmptyTopicFilter,
}

impl From<ByteArrayError> for DecodeError {
    fn from(e: ByteArrayError) -> Self {
        match e {
            ByteArrayError::OutOfRangeError => Self::OutOfRange,
            ByteArrayError::InvalidString(_) => Self::InvalidString,
        }
    }
}

impl From<VarIntError> for DecodeError {
    fn from(_e: VarIntError) -> Self {
        Self::InvalidVarInt
    }
}

impl From<TopicError> for DecodeError {
    fn from(_e: TopicError) -> Self {
        Self::InvalidTopic
    }
}

impl From<StringError> for DecodeError {
    fn from(_e: StringError) -> Self {
        Self::InvalidString
    }
}

/// Errors raised while serializing a packet into a byte buffer.
#[derive(Debug)]
pub enum EncodeError {
    IoError,

    /// Packet is larger than the remaining-length field can express.
    InvalidVarInt,

    /// Client id is empty or longer than 23 bytes.
    InvalidClientId,

    /// Topic name or filter fails validation.
    InvalidTopic,

    /// Binary or string field is longer than 64k.
    TooManyData,

    /// Packet field combination violates the protocol.
    InvalidPacketType,
}

impl From<io::Error> for EncodeError {
    fn from(_e: io::Error) -> Self {
        Self::IoError
    }
}

impl From<VarIntError> for EncodeError {
    fn from(_e: VarIntError) -> Self {
        Self::InvalidVarInt
    }
}

impl From<TopicError> for EncodeError {
    fn from(_e: TopicError) -> Self {
        Self::InvalidTopic
    }
}

impl From<StringError> for EncodeError {
    fn from(_e: StringError) -> Self {
        Self::TooManyData
    }
}
