//! Fixed-header binary framing for SAXS sample streams.
//!
//! Every message on the wire is framed as:
//! - A 16-byte little-endian header (magic, version, message type,
//!   compression tag, payload length)
//! - The payload bytes, compressed if the header says so
//! - A 4-byte CRC-32 (IEEE) trailer computed over the payload as transmitted
//!
//! This crate knows nothing about what the payload contains. The record
//! layer (`saxswire-record`) and the stream layer (`saxswire-stream`) build
//! on top of it.

pub mod checksum;
pub mod codec;
pub mod compression;
pub mod error;
pub mod header;

pub use checksum::{checksum, verify};
pub use codec::{
    decode_frame, encode_frame, truncation_error, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD,
};
pub use compression::Compression;
pub use error::{FrameError, FramePart, Result};
pub use header::{FrameHeader, MessageType, HEADER_SIZE, MAGIC, PROTOCOL_VERSION, TRAILER_SIZE};
