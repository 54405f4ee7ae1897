//! MessagePack encoding of combined messages via `rmp-serde`.
//!
//! Structs are always written with `to_vec_named` so they appear on the
//! wire as maps keyed by field name, which is what non-Rust peers decode.

use tracing::trace;

use crate::error::Result;
use crate::flow::FlowMetadata;
use crate::message::{CombinedMessage, CombinedRef};
use crate::sample::Sample;

/// Serialize a sample and its metadata into one payload.
///
/// No validation happens here; writers validate before calling this.
pub fn encode_combined(sample: &Sample, flow_metadata: &FlowMetadata) -> Result<Vec<u8>> {
    let payload = rmp_serde::to_vec_named(&CombinedRef {
        sample,
        flow_metadata,
    })?;
    trace!(points = sample.len(), bytes = payload.len(), "encoded combined message");
    Ok(payload)
}

/// Deserialize a payload and validate the sample it carries.
///
/// Malformed MessagePack yields [`RecordError::Decode`](crate::RecordError::Decode);
/// a well-formed message with inconsistent arrays yields
/// [`RecordError::InvalidSample`](crate::RecordError::InvalidSample).
pub fn decode_combined(payload: &[u8]) -> Result<CombinedMessage> {
    let message: CombinedMessage = rmp_serde::from_slice(payload)?;
    message.sample.validate()?;
    Ok(message)
}
