use bytes::BytesMut;
use saxswire_frame::{decode_frame, truncation_error, FrameConfig, MessageType};
use saxswire_record::{decode_combined, CombinedMessage};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::StreamError;
use crate::writer::encode_message;

/// `tokio-util` codec for combined frames.
///
/// Use with `FramedRead` / `FramedWrite` over any async byte stream. Frames
/// go through the same validation and integrity checks as the blocking
/// [`CombinedReader`](crate::CombinedReader) and
/// [`CombinedWriter`](crate::CombinedWriter).
#[derive(Debug, Clone, Default)]
pub struct CombinedCodec {
    config: FrameConfig,
}

impl CombinedCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for CombinedCodec {
    type Item = CombinedMessage;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(frame) = decode_frame(src, &self.config)? else {
            return Ok(None);
        };
        frame.header.expect_message_type(MessageType::Combined)?;

        let payload = frame.header.compression.decompress(frame.payload)?;
        let message = decode_combined(&payload)?;
        trace!(sample = %message.flow_metadata.sample, "decoded combined frame");
        Ok(Some(message))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }
        if buf.is_empty() {
            Ok(None)
        } else {
            Err(truncation_error(buf).into())
        }
    }
}

impl Encoder<CombinedMessage> for CombinedCodec {
    type Error = StreamError;

    fn encode(&mut self, item: CombinedMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item.sample, &item.flow_metadata, &self.config, dst)
    }
}
