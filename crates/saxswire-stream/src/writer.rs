use std::io::{ErrorKind, Write};

use bytes::{Bytes, BytesMut};
use saxswire_frame::{encode_frame, Compression, FrameConfig, FrameError, MessageType};
use saxswire_record::{encode_combined, CombinedMessage, FlowMetadata, Sample};
use tracing::debug;

use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Validate, serialize, compress and frame one combined message into `dst`.
///
/// Nothing is appended to `dst` unless every step succeeds.
pub(crate) fn encode_message(
    sample: &Sample,
    flow: &FlowMetadata,
    config: &FrameConfig,
    dst: &mut BytesMut,
) -> Result<()> {
    sample.validate()?;

    let payload = encode_combined(sample, flow)?;
    let payload = config.compression.compress(Bytes::from(payload))?;

    let size = payload.len() as u64;
    if size > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size,
            max: config.max_payload_size,
        }
        .into());
    }

    encode_frame(MessageType::Combined, config.compression, &payload, dst)?;
    Ok(())
}

/// Writes combined sample frames to any `Write` stream.
///
/// Each call produces exactly one frame, assembled in memory first and then
/// handed to the stream as a single buffer. Calls on one writer must not be
/// interleaved; share it behind a single draining loop, not a lock per call.
pub struct CombinedWriter<W> {
    inner: W,
    buf: BytesMut,
    config: FrameConfig,
}

impl<W: Write> CombinedWriter<W> {
    /// Create a new writer with default configuration (no compression).
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write one sample and its flow metadata as a single frame.
    ///
    /// The sample is validated first; an invalid sample writes nothing.
    /// Returns the number of bytes written to the stream.
    pub fn write_combined(&mut self, sample: &Sample, flow: &FlowMetadata) -> Result<usize> {
        self.buf.clear();
        encode_message(sample, flow, &self.config, &mut self.buf)?;

        let written = self.write_frame_bytes()?;
        self.flush()?;

        debug!(
            sample = %flow.sample,
            points = sample.len(),
            compression = %self.config.compression,
            bytes = written,
            "wrote combined frame"
        );
        Ok(written)
    }

    /// Write a [`CombinedMessage`] as a single frame.
    pub fn write_message(&mut self, message: &CombinedMessage) -> Result<usize> {
        self.write_combined(&message.sample, &message.flow_metadata)
    }

    fn write_frame_bytes(&mut self) -> Result<usize> {
        let expected = self.buf.len();
        let mut offset = 0usize;
        while offset < expected {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    return Err(FrameError::ShortWrite {
                        written: offset,
                        expected,
                    }
                    .into())
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(offset)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Change the compression applied to subsequent frames.
    pub fn set_compression(&mut self, compression: Compression) {
        self.config.compression = compression;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use saxswire_frame::{decode_frame, HEADER_SIZE, MAGIC, TRAILER_SIZE};
    use saxswire_record::{decode_combined, RecordError, ValidationError};

    use super::*;
    use crate::error::StreamError;

    fn sample() -> Sample {
        Sample::new(vec![0.1, 0.2, 0.3], vec![100.0, 150.0, 120.0])
            .with_errors(vec![5.0, 7.0, 6.0])
            .with_shape(3)
    }

    fn flow() -> FlowMetadata {
        FlowMetadata::new("test_sample")
    }

    fn written_bytes(writer: CombinedWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_frame() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        let n = writer.write_combined(&sample(), &flow()).unwrap();

        let mut wire = BytesMut::from(written_bytes(writer).as_slice());
        assert_eq!(n, wire.len());

        let frame = decode_frame(&mut wire, &FrameConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(frame.header.message_type, MessageType::Combined);
        assert_eq!(frame.header.compression, Compression::None);
        assert_eq!(n, HEADER_SIZE + frame.payload.len() + TRAILER_SIZE);

        let message = decode_combined(&frame.payload).unwrap();
        assert_eq!(message.sample, sample());
        assert_eq!(message.flow_metadata, flow());
    }

    #[test]
    fn header_fields_on_the_wire() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_combined(&sample(), &flow()).unwrap();
        let wire = written_bytes(writer);

        assert_eq!(&wire[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&wire[4..6], &[0x01, 0x00]);
        assert_eq!(wire[6], 0x04);
        assert_eq!(wire[7], 0x00);
        let payload_len = u64::from_le_bytes(wire[8..16].try_into().unwrap());
        assert_eq!(payload_len as usize, wire.len() - HEADER_SIZE - TRAILER_SIZE);
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        for id in ["one", "two", "three"] {
            writer.write_combined(&sample(), &FlowMetadata::new(id)).unwrap();
        }

        let mut wire = BytesMut::from(written_bytes(writer).as_slice());
        for id in ["one", "two", "three"] {
            let frame = decode_frame(&mut wire, &FrameConfig::default())
                .unwrap()
                .unwrap();
            assert_eq!(decode_combined(&frame.payload).unwrap().sample_id(), id);
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn invalid_sample_writes_nothing() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        let bad = Sample::new(vec![0.1, 0.2], vec![1.0, 2.0]).with_shape(5);

        let err = writer.write_combined(&bad, &flow()).unwrap_err();
        assert!(err.is_invalid_sample());
        assert!(matches!(
            err,
            StreamError::Record(RecordError::InvalidSample(ValidationError::ShapeMismatch {
                shape: 5,
                len: 2
            }))
        ));
        assert!(written_bytes(writer).is_empty());
    }

    #[test]
    fn empty_sample_writes_nothing() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.write_combined(&Sample::default(), &flow()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Record(RecordError::InvalidSample(ValidationError::EmptyQValues))
        ));
        assert!(written_bytes(writer).is_empty());
    }

    #[test]
    fn unsupported_compression_writes_nothing() {
        for compression in [Compression::Lz4, Compression::Zstd] {
            let cfg = FrameConfig {
                compression,
                ..FrameConfig::default()
            };
            let mut writer = CombinedWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

            let err = writer.write_combined(&sample(), &flow()).unwrap_err();
            assert!(matches!(
                err,
                StreamError::Frame(FrameError::UnsupportedCompression(c)) if c == compression
            ));
            assert!(written_bytes(writer).is_empty());
        }
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 8,
            ..FrameConfig::default()
        };
        let mut writer = CombinedWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.write_combined(&sample(), &flow()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::PayloadTooLarge { max: 8, .. })
        ));
        assert!(written_bytes(writer).is_empty());
    }

    #[test]
    fn set_compression_applies_to_next_frame() {
        let mut writer = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.set_compression(Compression::Lz4);
        assert_eq!(writer.config().compression, Compression::Lz4);
        assert!(writer.write_combined(&sample(), &flow()).is_err());

        writer.set_compression(Compression::None);
        assert!(writer.write_combined(&sample(), &flow()).is_ok());
    }

    #[test]
    fn write_message_matches_write_combined() {
        let message = CombinedMessage::new(sample(), flow());

        let mut a = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        a.write_message(&message).unwrap();
        let mut b = CombinedWriter::new(Cursor::new(Vec::<u8>::new()));
        b.write_combined(&sample(), &flow()).unwrap();

        assert_eq!(written_bytes(a), written_bytes(b));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = CombinedWriter::new(sink);

        writer.write_combined(&sample(), &flow()).unwrap();

        assert!(flag.load(Ordering::SeqCst));
        assert!(!writer.get_ref().data.is_empty());
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = CombinedWriter::new(cursor);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = CombinedWriter::new(writer_impl);
        let n = writer.write_combined(&sample(), &flow()).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), n);
    }

    #[test]
    fn short_write_when_stream_stops_accepting() {
        let mut writer = CombinedWriter::new(LimitedWriter {
            remaining: 10,
            data: Vec::new(),
        });

        let err = writer.write_combined(&sample(), &flow()).unwrap_err();
        match err {
            StreamError::Frame(FrameError::ShortWrite { written, expected }) => {
                assert_eq!(written, 10);
                assert!(expected > written);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_write_when_write_returns_zero() {
        let mut writer = CombinedWriter::new(ZeroWriter);
        let err = writer.write_combined(&sample(), &flow()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::ShortWrite { written: 0, .. })
        ));
    }

    #[test]
    fn io_error_is_surfaced() {
        let mut writer = CombinedWriter::new(BrokenPipeWriter);
        let err = writer.write_combined(&sample(), &flow()).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Frame(FrameError::Io(e)) if e.kind() == ErrorKind::BrokenPipe
        ));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct LimitedWriter {
        remaining: usize,
        data: Vec<u8>,
    }

    impl Write for LimitedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.remaining);
            self.data.extend_from_slice(&buf[..n]);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipeWriter;

    impl Write for BrokenPipeWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
