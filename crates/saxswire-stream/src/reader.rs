use std::io::{ErrorKind, Read};

use bytes::Bytes;
use saxswire_frame::{
    verify, Frame, FrameConfig, FrameError, FrameHeader, FramePart, MessageType, HEADER_SIZE,
    TRAILER_SIZE,
};
use saxswire_record::{decode_combined, CombinedMessage, FlowMetadata, Sample};
use tracing::debug;

use crate::error::{Result, StreamError};

/// Reads combined sample frames from any `Read` stream.
///
/// Each call consumes exactly one frame. Any failure aborts the read with no
/// partial result; the stream position after a failure is unspecified, so a
/// failed reader should not be used again.
pub struct CombinedReader<R> {
    inner: R,
    config: FrameConfig,
}

impl<R: Read> CombinedReader<R> {
    /// Create a new reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reader with explicit configuration.
    ///
    /// Only `max_payload_size` applies; compression is taken from each header.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next sample and its flow metadata (blocking).
    ///
    /// Returns `Err(StreamError::EndOfStream)` when the stream ends cleanly
    /// before the first byte of a frame.
    pub fn read_combined(&mut self) -> Result<(Sample, FlowMetadata)> {
        self.read_message().map(CombinedMessage::into_parts)
    }

    /// Read the next frame and decode it into a [`CombinedMessage`].
    pub fn read_message(&mut self) -> Result<CombinedMessage> {
        let header = self.read_header()?;
        header.expect_message_type(MessageType::Combined)?;

        let frame = self.read_body(header)?;
        let payload = frame.header.compression.decompress(frame.payload)?;
        let message = decode_combined(&payload)?;

        debug!(
            sample = %message.flow_metadata.sample,
            points = message.sample.len(),
            bytes = frame.header.frame_len(),
            "read combined frame"
        );
        Ok(message)
    }

    /// Read the next checksum-verified frame without interpreting its payload.
    ///
    /// Any message type is accepted and the payload is left compressed.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let header = self.read_header()?;
        self.read_body(header)
    }

    fn read_header(&mut self) -> Result<FrameHeader> {
        let mut buf = [0u8; HEADER_SIZE];
        let received = read_full(&mut self.inner, &mut buf)?;
        if received == 0 {
            return Err(StreamError::EndOfStream);
        }
        if received < HEADER_SIZE {
            return Err(FrameError::Incomplete {
                part: FramePart::Header,
                expected: HEADER_SIZE as u64,
                received: received as u64,
            }
            .into());
        }
        Ok(FrameHeader::decode(&buf)?)
    }

    fn read_body(&mut self, header: FrameHeader) -> Result<Frame> {
        if header.payload_len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: header.payload_len,
                max: self.config.max_payload_size,
            }
            .into());
        }

        let mut payload = Vec::new();
        (&mut self.inner)
            .take(header.payload_len)
            .read_to_end(&mut payload)?;
        if (payload.len() as u64) < header.payload_len {
            return Err(FrameError::Incomplete {
                part: FramePart::Payload,
                expected: header.payload_len,
                received: payload.len() as u64,
            }
            .into());
        }

        let mut trailer = [0u8; TRAILER_SIZE];
        let received = read_full(&mut self.inner, &mut trailer)?;
        if received < TRAILER_SIZE {
            return Err(FrameError::Incomplete {
                part: FramePart::Trailer,
                expected: TRAILER_SIZE as u64,
                received: received as u64,
            }
            .into());
        }
        verify(&payload, u32::from_le_bytes(trailer))?;

        Ok(Frame {
            header,
            payload: Bytes::from(payload),
        })
    }

    /// Turn this reader into a streaming [`CombinedIter`](crate::CombinedIter).
    pub fn into_messages(self) -> crate::iter::CombinedIter<R> {
        crate::iter::CombinedIter::from_reader(self)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Update maximum payload size for subsequent frames.
    pub fn set_max_payload_size(&mut self, max_payload_size: u64) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
///
/// Returns the number of bytes read, which is less than `buf.len()` only if
/// the stream ended.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use saxswire_frame::{encode_frame, Compression, MAGIC};
    use saxswire_record::{encode_combined, RecordError, ValidationError};

    use super::*;
    use crate::writer::CombinedWriter;

    fn sample() -> Sample {
        Sample::new(vec![0.1, 0.2, 0.3], vec![100.0, 150.0, 120.0])
            .with_errors(vec![5.0, 7.0, 6.0])
            .with_shape(3)
            .with_metadata("experiment", "test-001")
    }

    fn flow() -> FlowMetadata {
        let mut flow = FlowMetadata::new("test_sample");
        flow.unprocessed_peaks.insert(1, 100.0);
        flow
    }

    fn wire_for(samples: &[(Sample, FlowMetadata)]) -> Vec<u8> {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        for (sample, flow) in samples {
            writer.write_combined(sample, flow).unwrap();
        }
        writer.into_inner().into_inner()
    }

    fn raw_frame(message_type: MessageType, compression: Compression, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(message_type, compression, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn read_single_message() {
        let wire = wire_for(&[(sample(), flow())]);
        let mut reader = CombinedReader::new(Cursor::new(wire));

        let (got_sample, got_flow) = reader.read_combined().unwrap();
        assert_eq!(got_sample, sample());
        assert_eq!(got_flow, flow());
    }

    #[test]
    fn end_to_end_scenario() {
        let sample = Sample::new(vec![0.1, 0.2, 0.3], vec![100.0, 150.0, 120.0])
            .with_errors(vec![5.0, 7.0, 6.0])
            .with_shape(3);
        let flow = FlowMetadata::new("test_sample");
        let wire = wire_for(&[(sample.clone(), flow)]);

        let (got, meta) = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap();
        assert_eq!(got.q_values, vec![0.1, 0.2, 0.3]);
        assert_eq!(got.intensity, vec![100.0, 150.0, 120.0]);
        assert_eq!(got.intensity_err, vec![5.0, 7.0, 6.0]);
        assert_eq!(got.shape, 3);
        assert_eq!(meta.sample, "test_sample");
    }

    #[test]
    fn read_multiple_messages_then_end_of_stream() {
        let wire = wire_for(&[
            (sample(), FlowMetadata::new("a")),
            (sample(), FlowMetadata::new("b")),
        ]);
        let mut reader = CombinedReader::new(Cursor::new(wire));

        assert_eq!(reader.read_message().unwrap().sample_id(), "a");
        assert_eq!(reader.read_message().unwrap().sample_id(), "b");
        assert!(reader.read_message().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = CombinedReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_combined().unwrap_err();
        assert!(matches!(err, StreamError::EndOfStream));
    }

    #[test]
    fn corrupted_magic_is_rejected() {
        let mut wire = wire_for(&[(sample(), flow())]);
        wire[0..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::InvalidMagic {
                found: 0xDEAD_BEEF,
                expected: MAGIC
            })
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut wire = wire_for(&[(sample(), flow())]);
        wire[4] = 0x02;

        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::UnsupportedVersion {
                found: 2,
                expected: 1
            })
        ));
    }

    #[test]
    fn other_message_types_are_rejected() {
        let payload = encode_combined(&sample(), &flow()).unwrap();
        let wire = raw_frame(MessageType::FlowMetadata, Compression::None, &payload);

        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::UnsupportedMessageType {
                found: MessageType::FlowMetadata,
                expected: MessageType::Combined
            })
        ));
    }

    #[test]
    fn any_payload_bit_flip_is_a_checksum_mismatch() {
        let wire = wire_for(&[(sample(), flow())]);
        let payload_range = HEADER_SIZE..wire.len() - TRAILER_SIZE;

        for offset in payload_range {
            for bit in [0x01u8, 0x80] {
                let mut corrupted = wire.clone();
                corrupted[offset] ^= bit;

                let err = CombinedReader::new(Cursor::new(corrupted))
                    .read_combined()
                    .unwrap_err();
                assert!(
                    matches!(err, StreamError::Frame(FrameError::ChecksumMismatch { .. })),
                    "offset {offset}: {err}"
                );
            }
        }
    }

    #[test]
    fn truncation_anywhere_is_incomplete() {
        let wire = wire_for(&[(sample(), flow())]);

        for cut in 1..wire.len() {
            let err = CombinedReader::new(Cursor::new(wire[..cut].to_vec()))
                .read_combined()
                .unwrap_err();
            let expected_part = if cut < HEADER_SIZE {
                FramePart::Header
            } else if cut < wire.len() - TRAILER_SIZE {
                FramePart::Payload
            } else {
                FramePart::Trailer
            };
            let part = match &err {
                StreamError::Frame(FrameError::Incomplete { part, .. }) => Some(*part),
                _ => None,
            };
            assert_eq!(part, Some(expected_part), "cut {cut}: {err}");
        }
    }

    #[test]
    fn named_compression_tags_are_unsupported() {
        let payload = encode_combined(&sample(), &flow()).unwrap();

        for compression in [Compression::Lz4, Compression::Zstd, Compression::Unknown(9)] {
            let wire = raw_frame(MessageType::Combined, compression, &payload);
            let err = CombinedReader::new(Cursor::new(wire))
                .read_combined()
                .unwrap_err();
            assert!(matches!(
                err,
                StreamError::Frame(FrameError::UnsupportedCompression(c)) if c == compression
            ));
        }
    }

    #[test]
    fn checksum_is_checked_before_decompression() {
        let payload = encode_combined(&sample(), &flow()).unwrap();
        let mut wire = raw_frame(MessageType::Combined, Compression::Lz4, &payload);
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn invalid_sample_is_a_content_error() {
        let bad = Sample::new(vec![0.1, 0.2, 0.3], vec![1.0, 2.0, 3.0]).with_errors(vec![1.0]);
        let payload = encode_combined(&bad, &flow()).unwrap();
        let wire = raw_frame(MessageType::Combined, Compression::None, &payload);

        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(err.is_invalid_sample());
        assert!(matches!(
            err,
            StreamError::Record(RecordError::InvalidSample(ValidationError::LengthMismatch {
                field: "intensity_err",
                ..
            }))
        ));
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let wire = raw_frame(MessageType::Combined, Compression::None, &[0xC1, 0xC1]);
        let err = CombinedReader::new(Cursor::new(wire))
            .read_combined()
            .unwrap_err();
        assert!(matches!(err, StreamError::Record(RecordError::Decode(_))));
    }

    #[test]
    fn oversized_payload_rejected_before_reading() {
        let header = FrameHeader::new(MessageType::Combined, Compression::None, 1 << 40).encode();
        let err = CombinedReader::new(Cursor::new(header.to_vec()))
            .read_combined()
            .unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn read_frame_accepts_any_message_type() {
        let wire = raw_frame(MessageType::StageRequest, Compression::Zstd, b"opaque");
        let frame = CombinedReader::new(Cursor::new(wire)).read_frame().unwrap();

        assert_eq!(frame.header.message_type, MessageType::StageRequest);
        assert_eq!(frame.header.compression, Compression::Zstd);
        assert_eq!(frame.payload.as_ref(), b"opaque");
    }

    #[test]
    fn partial_read_handling() {
        let wire = wire_for(&[(sample(), flow())]);
        let mut reader = CombinedReader::new(ByteByByteReader {
            bytes: wire,
            pos: 0,
        });

        let (got, _) = reader.read_combined().unwrap();
        assert_eq!(got, sample());
    }

    #[test]
    fn interrupted_read_retries() {
        let wire = wire_for(&[(sample(), flow())]);
        let mut reader = CombinedReader::new(InterruptedThenData {
            state: 0,
            bytes: wire,
            pos: 0,
        });

        let (got, _) = reader.read_combined().unwrap();
        assert_eq!(got, sample());
    }

    #[test]
    fn read_errors_propagate() {
        let mut reader = CombinedReader::new(FailingReader);
        let err = reader.read_combined().unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::Io(e)) if e.kind() == ErrorKind::ConnectionReset
        ));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = CombinedReader::new(cursor);

        reader.set_max_payload_size(64);
        assert_eq!(reader.config().max_payload_size, 64);
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }
}
