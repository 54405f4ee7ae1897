//! Payload compression dispatch.
//!
//! The tag space on the wire is open: newer peers may name algorithms this
//! build cannot run. Every tag still decodes into a [`Compression`] value so
//! the header is readable, but only [`Compression::None`] has a transform.
//! Everything else fails with [`FrameError::UnsupportedCompression`] instead
//! of passing bytes through.

use std::fmt;

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Compression tag carried at header offset 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Identity transform.
    #[default]
    None,
    Lz4,
    Zstd,
    /// A tag this build has no name for.
    Unknown(u8),
}

impl Compression {
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0x00 => Compression::None,
            0x01 => Compression::Lz4,
            0x02 => Compression::Zstd,
            other => Compression::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Compression::None => 0x00,
            Compression::Lz4 => 0x01,
            Compression::Zstd => 0x02,
            Compression::Unknown(tag) => tag,
        }
    }

    /// Returns true if this build can both compress and decompress the tag.
    pub fn is_supported(self) -> bool {
        matches!(self, Compression::None)
    }

    /// Apply the transform to a serialized payload before it is framed.
    pub fn compress(self, payload: Bytes) -> Result<Bytes> {
        match self {
            Compression::None => Ok(payload),
            Compression::Lz4 | Compression::Zstd | Compression::Unknown(_) => {
                Err(FrameError::UnsupportedCompression(self))
            }
        }
    }

    /// Reverse the transform on a payload whose checksum has been verified.
    pub fn decompress(self, payload: Bytes) -> Result<Bytes> {
        match self {
            Compression::None => Ok(payload),
            Compression::Lz4 | Compression::Zstd | Compression::Unknown(_) => {
                Err(FrameError::UnsupportedCompression(self))
            }
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => f.write_str("none"),
            Compression::Lz4 => f.write_str("lz4"),
            Compression::Zstd => f.write_str("zstd"),
            Compression::Unknown(tag) => write!(f, "unknown({tag})"),
        }
    }
}
