use serde::{Deserialize, Serialize};

use crate::flow::FlowMetadata;
use crate::sample::Sample;

/// The unit framed on the wire: one sample plus its flow metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedMessage {
    pub sample: Sample,
    pub flow_metadata: FlowMetadata,
}

impl CombinedMessage {
    pub fn new(sample: Sample, flow_metadata: FlowMetadata) -> Self {
        Self {
            sample,
            flow_metadata,
        }
    }

    /// Split into the sample and its metadata.
    pub fn into_parts(self) -> (Sample, FlowMetadata) {
        (self.sample, self.flow_metadata)
    }

    /// Identifier of the sample this message carries.
    pub fn sample_id(&self) -> &str {
        &self.flow_metadata.sample
    }
}

impl From<(Sample, FlowMetadata)> for CombinedMessage {
    fn from((sample, flow_metadata): (Sample, FlowMetadata)) -> Self {
        Self::new(sample, flow_metadata)
    }
}

/// Borrowed view with the same wire shape as [`CombinedMessage`].
#[derive(Serialize)]
pub(crate) struct CombinedRef<'a> {
    pub sample: &'a Sample,
    pub flow_metadata: &'a FlowMetadata,
}
