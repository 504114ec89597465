use serde::{Deserialize, Serialize};

use super::encoder::{FeatureVector, FEATURE_COUNT};

/// Per-feature center/scale fitted at training time. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizationParameters {
    pub center: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "standardization expects {expected} features, got center={center} scale={scale} vector={vector}"
)]
pub struct DimensionMismatchError {
    pub expected: usize,
    pub center: usize,
    pub scale: usize,
    pub vector: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error(transparent)]
    Dimension(#[from] DimensionMismatchError),
    #[error("scale for feature {index} must be finite and non-zero, found {value}")]
    DegenerateScale { index: usize, value: f64 },
    #[error("center for feature {index} must be finite, found {value}")]
    NonFiniteCenter { index: usize, value: f64 },
}

impl StandardizationParameters {
    pub fn new(center: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { center, scale }
    }

    /// Identity transform, handy when a model was fitted on raw features.
    pub fn identity() -> Self {
        Self {
            center: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    fn check_dimensions(&self, vector: usize) -> Result<(), DimensionMismatchError> {
        if self.center.len() == FEATURE_COUNT
            && self.scale.len() == FEATURE_COUNT
            && vector == FEATURE_COUNT
        {
            Ok(())
        } else {
            Err(DimensionMismatchError {
                expected: FEATURE_COUNT,
                center: self.center.len(),
                scale: self.scale.len(),
                vector,
            })
        }
    }

    /// Load-time check. A constant training feature leaves a zero scale, which
    /// would turn every prediction into NaN/inf, so such artifacts are refused.
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.check_dimensions(FEATURE_COUNT)?;

        if let Some((index, value)) = self
            .center
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ParameterError::NonFiniteCenter { index, value });
        }

        if let Some((index, value)) = self
            .scale
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || *value == 0.0)
        {
            return Err(ParameterError::DegenerateScale { index, value });
        }

        Ok(())
    }
}

/// `output[i] = (vector[i] - center[i]) / scale[i]`, plain IEEE arithmetic.
pub fn standardize(
    vector: &FeatureVector,
    params: &StandardizationParameters,
) -> Result<FeatureVector, DimensionMismatchError> {
    params.check_dimensions(FEATURE_COUNT)?;

    let mut scaled = [0.0; FEATURE_COUNT];
    for (index, value) in vector.as_slice().iter().enumerate() {
        scaled[index] = (value - params.center[index]) / params.scale[index];
    }
    Ok(FeatureVector::from_array(scaled))
}
