use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::compression::Compression;
use crate::error::{FrameError, FramePart, Result};
use crate::header::{FrameHeader, MessageType, HEADER_SIZE, TRAILER_SIZE};

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: u64 = 16 * 1024 * 1024;

/// A checksum-verified frame whose payload is still in its transmitted form.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: FrameHeader,
    /// Payload bytes as carried on the wire (compressed if the header says so).
    pub payload: Bytes,
}

impl Frame {
    /// The total wire size of this frame (header + payload + trailer).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }
}

/// Encode one frame around an already-compressed payload.
///
/// The payload is written as given; `compression` only names the transform
/// that produced it. The trailer is the CRC-32 of exactly these bytes.
pub fn encode_frame(
    message_type: MessageType,
    compression: Compression,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let payload_len = u64::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: u64::MAX,
        max: u64::MAX,
    })?;
    let header = FrameHeader::new(message_type, compression, payload_len);

    dst.reserve(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    header.encode_into(dst);
    dst.put_slice(payload);
    dst.put_u32_le(checksum::checksum(payload));
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. Header fields are
/// validated as soon as the header is available; the checksum is verified
/// before the frame is returned. The message type is left to the caller.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let header = FrameHeader::decode(&src[..HEADER_SIZE])?;
    if header.payload_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: header.payload_len,
            max: config.max_payload_size,
        });
    }

    // The declared length is untrusted until the checksum passes: no
    // arithmetic may wrap and nothing is allocated ahead of the bytes.
    let too_large = || FrameError::PayloadTooLarge {
        size: header.payload_len,
        max: config.max_payload_size,
    };
    let payload_len = usize::try_from(header.payload_len).map_err(|_| too_large())?;
    let total = payload_len
        .checked_add(HEADER_SIZE + TRAILER_SIZE)
        .ok_or_else(too_large)?;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    let expected = src.get_u32_le();
    checksum::verify(&payload, expected)?;

    Ok(Some(Frame { header, payload }))
}

/// Describe why `remaining` cannot be decoded as a whole frame.
///
/// Used when a stream ends with bytes still buffered: reports which part of
/// the frame was cut off and how many bytes of it arrived.
pub fn truncation_error(remaining: &[u8]) -> FrameError {
    if remaining.len() < HEADER_SIZE {
        return FrameError::Incomplete {
            part: FramePart::Header,
            expected: HEADER_SIZE as u64,
            received: remaining.len() as u64,
        };
    }

    let header = match FrameHeader::decode(remaining) {
        Ok(header) => header,
        Err(err) => return err,
    };
    let body = (remaining.len() - HEADER_SIZE) as u64;
    if body < header.payload_len {
        FrameError::Incomplete {
            part: FramePart::Payload,
            expected: header.payload_len,
            received: body,
        }
    } else {
        FrameError::Incomplete {
            part: FramePart::Trailer,
            expected: TRAILER_SIZE as u64,
            received: body - header.payload_len,
        }
    }
}

/// Configuration shared by frame writers and readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: u64,
    /// Compression applied by writers. Readers follow the header instead.
    pub compression: Compression,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            compression: Compression::None,
        }
    }
}
