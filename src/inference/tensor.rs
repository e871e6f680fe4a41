//! Model input tensors
//!
//! Every tensor carries a leading batch dimension of 1. Image tensors are laid
//! out `(1, height, width, channels)`, tabular tensors `(1, features)`.

use serde::{Deserialize, Serialize};

use crate::utils::error::{CropSightError, Result};

/// Default image input shape used when a model declares nothing
pub const DEFAULT_IMAGE_SHAPE: [usize; 3] = [224, 224, 3];

/// Shape of a single model input, without the batch dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TensorShape(Vec<usize>);

impl TensorShape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// `(height, width, channels)` image shape
    pub fn image(height: usize, width: usize, channels: usize) -> Self {
        Self(vec![height, width, channels])
    }

    /// `(features)` tabular shape
    pub fn features(count: usize) -> Self {
        Self(vec![count])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of scalar elements for one sample
    pub fn len(&self) -> usize {
        self.0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spatial `(height, width)` for image shapes
    pub fn spatial(&self) -> Option<(u32, u32)> {
        match self.0.as_slice() {
            [h, w, 3] if *h > 0 && *w > 0 => Some((*h as u32, *w as u32)),
            _ => None,
        }
    }

    /// Shape with the leading batch dimension of 1
    pub fn batched(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.0.len() + 1);
        dims.push(1);
        dims.extend_from_slice(&self.0);
        dims
    }
}

impl Default for TensorShape {
    fn default() -> Self {
        Self(DEFAULT_IMAGE_SHAPE.to_vec())
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "({})", dims.join(", "))
    }
}

/// Dense f32 tensor handed to a model
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl InputTensor {
    /// Build a tensor, checking that `data` fills `shape` exactly
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CropSightError::Preprocess(format!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Tabular input of shape `(1, features.len())`
    pub fn from_features(features: &[f32]) -> Self {
        Self {
            shape: vec![1, features.len()],
            data: features.to_vec(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Check the tensor against a model's declared input shape
    pub fn ensure_shape(&self, expected: &TensorShape) -> Result<()> {
        let batched = expected.batched();
        if self.shape != batched {
            return Err(CropSightError::ShapeMismatch {
                expected: batched,
                actual: self.shape.clone(),
            });
        }
        Ok(())
    }
}
