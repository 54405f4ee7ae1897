//! CRC-32 (IEEE) integrity over the payload bytes as transmitted.
//!
//! The checksum always covers the post-compression payload, so a reader
//! verifies it before anything tries to decompress or deserialize.

use tracing::warn;

use crate::error::{FrameError, Result};

/// Compute the CRC-32 (IEEE polynomial) of `payload`.
pub fn checksum(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// Verify `payload` against the checksum carried in the frame trailer.
pub fn verify(payload: &[u8], expected: u32) -> Result<()> {
    let actual = checksum(payload);
    if actual != expected {
        warn!(
            expected = format_args!("{expected:#010x}"),
            actual = format_args!("{actual:#010x}"),
            payload_len = payload.len(),
            "frame checksum mismatch"
        );
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
