//! SAXS records carried inside saxswire frames.
//!
//! A [`CombinedMessage`] pairs one [`Sample`] (a scattering curve) with its
//! [`FlowMetadata`] (pipeline side-channel state). The pair is serialized as
//! a single MessagePack map and validated on every decode.

pub mod codec;
pub mod error;
pub mod flow;
pub mod message;
pub mod sample;

pub use codec::{decode_combined, encode_combined};
pub use error::{RecordError, Result, ValidationError};
pub use flow::{FlowMetadata, PeakMap};
pub use message::CombinedMessage;
pub use sample::{Annotations, Sample};

/// Accept MessagePack `nil` wherever an empty collection is expected.
///
/// Some producers encode empty maps and slices as `nil` rather than as an
/// empty container.
pub(crate) fn nil_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;

    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
