use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nil_as_default;

/// Peak index to peak value.
pub type PeakMap = BTreeMap<i64, f64>;

/// Inter-stage state that travels through the pipeline with each sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetadata {
    /// Stable sample identifier assigned by the producer.
    #[serde(default)]
    pub sample: String,

    #[serde(default, deserialize_with = "nil_as_default")]
    pub processed_peaks: PeakMap,

    #[serde(default, deserialize_with = "nil_as_default")]
    pub unprocessed_peaks: PeakMap,

    #[serde(default, deserialize_with = "nil_as_default")]
    pub current: PeakMap,
}

impl FlowMetadata {
    /// Metadata for `sample` with no peaks recorded yet.
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            ..Self::default()
        }
    }

    /// Total number of peaks across all three maps.
    pub fn peak_count(&self) -> usize {
        self.processed_peaks.len() + self.unprocessed_peaks.len() + self.current.len()
    }
}
