use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::nil_as_default;

/// Free-form annotations attached to a sample.
///
/// Values are any JSON-representable scalar or nested structure.
pub type Annotations = BTreeMap<String, serde_json::Value>;

/// One small-angle X-ray scattering measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Scattering-vector magnitudes.
    #[serde(default, deserialize_with = "nil_as_default")]
    pub q_values: Vec<f64>,

    /// Measured intensity at each `q`.
    #[serde(default, deserialize_with = "nil_as_default")]
    pub intensity: Vec<f64>,

    /// Intensity uncertainty at each `q`; empty when not measured.
    #[serde(
        default,
        deserialize_with = "nil_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub intensity_err: Vec<f64>,

    #[serde(default, deserialize_with = "nil_as_default")]
    pub metadata: Annotations,

    /// Declared number of points. Zero means "not provided".
    #[serde(default)]
    pub shape: usize,
}

impl Sample {
    /// Create a sample from `q` and intensity with no uncertainties or shape.
    pub fn new(q_values: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            q_values,
            intensity,
            ..Self::default()
        }
    }

    pub fn with_errors(mut self, intensity_err: Vec<f64>) -> Self {
        self.intensity_err = intensity_err;
        self
    }

    pub fn with_shape(mut self, shape: usize) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of data points.
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }

    /// Returns true if per-point intensity uncertainties are present.
    pub fn has_errors(&self) -> bool {
        !self.intensity_err.is_empty()
    }

    /// Check every content invariant.
    ///
    /// Runs before a sample is written and after one is decoded, so an
    /// invalid sample is never partially accepted on either side.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.q_values.len();
        if len == 0 {
            return Err(ValidationError::EmptyQValues);
        }
        if self.intensity.is_empty() {
            return Err(ValidationError::EmptyIntensity);
        }
        if self.intensity.len() != len {
            return Err(ValidationError::LengthMismatch {
                field: "intensity",
                expected: len,
                actual: self.intensity.len(),
            });
        }
        if !self.intensity_err.is_empty() && self.intensity_err.len() != len {
            return Err(ValidationError::LengthMismatch {
                field: "intensity_err",
                expected: len,
                actual: self.intensity_err.len(),
            });
        }
        if self.shape != 0 && self.shape != len {
            return Err(ValidationError::ShapeMismatch {
                shape: self.shape,
                len,
            });
        }
        Ok(())
    }
}
