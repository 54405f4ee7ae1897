use std::fmt;

use crate::compression::Compression;
use crate::header::MessageType;

/// The section of a frame that was being read when the stream ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    Header,
    Payload,
    Trailer,
}

impl fmt::Display for FramePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FramePart::Header => "header",
            FramePart::Payload => "payload",
            FramePart::Trailer => "trailer",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header does not start with the protocol magic number.
    #[error("invalid frame magic (found {found:#010x}, expected {expected:#010x})")]
    InvalidMagic { found: u32, expected: u32 },

    /// The header carries a protocol version this build does not speak.
    #[error("unsupported protocol version (found {found:#06x}, expected {expected:#06x})")]
    UnsupportedVersion { found: u16, expected: u16 },

    /// The header names a message type the caller does not accept.
    #[error("unsupported message type (found {found}, expected {expected})")]
    UnsupportedMessageType {
        found: MessageType,
        expected: MessageType,
    },

    /// The compression tag is valid on the wire but has no transform in this build.
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(Compression),

    /// The CRC-32 trailer does not match the received payload.
    #[error("checksum mismatch (expected {expected:#010x}, actual {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Fewer bytes were available than the frame requires.
    #[error("incomplete frame {part}: expected {expected} bytes, received {received}")]
    Incomplete {
        part: FramePart,
        expected: u64,
        received: u64,
    },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The underlying stream stopped accepting bytes part way through a frame.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
