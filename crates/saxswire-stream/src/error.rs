use saxswire_frame::FrameError;
use saxswire_record::RecordError;

/// Errors surfaced by stream writers, readers and iterators.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream ended cleanly on a frame boundary.
    #[error("end of stream")]
    EndOfStream,

    /// Framing, integrity, compression or I/O failure.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The payload could not be encoded/decoded, or the sample is invalid.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

impl StreamError {
    /// Returns true for the clean end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, StreamError::EndOfStream)
    }

    /// Returns true if the frame was intact but its sample failed validation.
    pub fn is_invalid_sample(&self) -> bool {
        matches!(self, StreamError::Record(RecordError::InvalidSample(_)))
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Frame(FrameError::Io(err))
    }
}

impl From<saxswire_record::ValidationError> for StreamError {
    fn from(err: saxswire_record::ValidationError) -> Self {
        StreamError::Record(RecordError::InvalidSample(err))
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
