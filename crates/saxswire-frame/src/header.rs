use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use crate::compression::Compression;
use crate::error::{FrameError, FramePart, Result};

/// Frame header: magic (4) + version (2) + type (1) + compression (1) + length (8).
pub const HEADER_SIZE: usize = 16;

/// CRC-32 trailer following the payload.
pub const TRAILER_SIZE: usize = 4;

/// Protocol identifier, written little-endian at offset 0.
pub const MAGIC: u32 = 0x5341_5853;

/// The only protocol version this build reads or writes.
pub const PROTOCOL_VERSION: u16 = 0x0001;

/// Message type tag carried at header offset 6.
///
/// Tags this build does not know are kept as [`MessageType::Unknown`] so a
/// reader can report exactly what it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Sample,
    FlowMetadata,
    StageRequest,
    Combined,
    Unknown(u8),
}

impl MessageType {
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0x01 => MessageType::Sample,
            0x02 => MessageType::FlowMetadata,
            0x03 => MessageType::StageRequest,
            0x04 => MessageType::Combined,
            other => MessageType::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            MessageType::Sample => 0x01,
            MessageType::FlowMetadata => 0x02,
            MessageType::StageRequest => 0x03,
            MessageType::Combined => 0x04,
            MessageType::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Sample => f.write_str("Sample"),
            MessageType::FlowMetadata => f.write_str("FlowMetadata"),
            MessageType::StageRequest => f.write_str("StageRequest"),
            MessageType::Combined => f.write_str("Combined"),
            MessageType::Unknown(tag) => write!(f, "Unknown({tag:#04x})"),
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub message_type: MessageType,
    pub compression: Compression,
    /// Length of the payload as transmitted (after compression).
    pub payload_len: u64,
}

impl FrameHeader {
    /// Create a header stamped with the current protocol version.
    pub fn new(message_type: MessageType, compression: Compression, payload_len: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message_type,
            compression,
            payload_len,
        }
    }

    /// Encode the header into its fixed 16-byte wire form.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────┬───────────┬────────┬─────────────┬──────────────┐
    /// │ Magic (4B) │ Version   │ Type   │ Compression │ Payload len  │
    /// │ u32 LE     │ (2B LE)   │ (1B)   │ (1B)        │ (8B LE)      │
    /// └────────────┴───────────┴────────┴─────────────┴──────────────┘
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut dst = &mut out[..];
        dst.put_u32_le(MAGIC);
        dst.put_u16_le(self.version);
        dst.put_u8(self.message_type.as_u8());
        dst.put_u8(self.compression.as_u8());
        dst.put_u64_le(self.payload_len);
        out
    }

    /// Append the encoded header to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.encode());
    }

    /// Decode and validate a header from the front of `src`.
    ///
    /// A buffer shorter than [`HEADER_SIZE`] yields [`FrameError::Incomplete`],
    /// which is distinct from [`FrameError::InvalidMagic`] so callers can tell
    /// a truncated stream from one that is not speaking this protocol. The
    /// message type is not checked here; see [`FrameHeader::expect_message_type`].
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(FrameError::Incomplete {
                part: FramePart::Header,
                expected: HEADER_SIZE as u64,
                received: src.len() as u64,
            });
        }

        let mut buf = &src[..HEADER_SIZE];
        let magic = buf.get_u32_le();
        if magic != MAGIC {
            return Err(FrameError::InvalidMagic {
                found: magic,
                expected: MAGIC,
            });
        }

        let version = buf.get_u16_le();
        if version != PROTOCOL_VERSION {
            return Err(FrameError::UnsupportedVersion {
                found: version,
                expected: PROTOCOL_VERSION,
            });
        }

        let message_type = MessageType::from_u8(buf.get_u8());
        let compression = Compression::from_u8(buf.get_u8());
        let payload_len = buf.get_u64_le();

        trace!(%message_type, %compression, payload_len, "decoded frame header");

        Ok(Self {
            version,
            message_type,
            compression,
            payload_len,
        })
    }

    /// Reject the header unless it carries the `expected` message type.
    pub fn expect_message_type(&self, expected: MessageType) -> Result<()> {
        if self.message_type != expected {
            return Err(FrameError::UnsupportedMessageType {
                found: self.message_type,
                expected,
            });
        }
        Ok(())
    }

    /// Total wire size of the frame this header describes.
    pub fn frame_len(&self) -> u64 {
        (HEADER_SIZE as u64)
            .saturating_add(self.payload_len)
            .saturating_add(TRAILER_SIZE as u64)
    }
}
