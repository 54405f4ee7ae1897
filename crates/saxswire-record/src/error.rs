/// A sample that is well-formed on the wire but violates a content invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("q_values array is empty")]
    EmptyQValues,

    #[error("intensity array is empty")]
    EmptyIntensity,

    /// A per-point array does not line up with `q_values`.
    #[error("{field} length {actual} does not match q_values length {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The declared shape is set and disagrees with the data.
    #[error("shape {shape} does not match q_values length {len}")]
    ShapeMismatch { shape: usize, len: usize },
}

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record decoded cleanly but its content is invalid.
    #[error("invalid sample: {0}")]
    InvalidSample(#[from] ValidationError),

    /// MessagePack serialization failed.
    #[error("msgpack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// The payload is not a well-formed combined message.
    #[error("msgpack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;
