//! Error Handling Module
//!
//! Defines the closed set of error kinds raised by the inference and
//! recommendation pipeline. Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for CropSight operations
#[derive(Error, Debug)]
pub enum CropSightError {
    /// Missing, empty, oversized or wrong-type input
    #[error("{0}")]
    InputValidation(String),

    /// A model identifier was requested that is not in the registry
    #[error("Model '{0}' is not loaded")]
    ModelNotLoaded(String),

    /// The recommendations knowledge base was never loaded
    #[error("Recommendations knowledge base is not loaded")]
    KnowledgeBaseNotLoaded,

    /// A model failed to load at startup
    #[error("Failed to load model '{id}': {reason}")]
    ModelLoad { id: String, reason: String },

    /// A model identifier was loaded twice
    #[error("Model '{0}' is already loaded")]
    DuplicateModel(String),

    /// Uploaded bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image decoded but could not be turned into a tensor
    #[error("Failed to preprocess input: {0}")]
    Preprocess(String),

    /// Tensor shape does not match the model's declared input shape
    #[error("Input shape {actual:?} does not match model input shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Model output width differs from the number of class labels
    #[error("Model '{model}' produced {outputs} scores but has {labels} class labels")]
    LabelMismatch {
        model: String,
        labels: usize,
        outputs: usize,
    },

    /// The model failed while running a forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// The forward pass did not finish within the deadline
    #[error("Inference timed out after {0:?}")]
    InferenceTimeout(Duration),

    /// A forward pass that already timed out still holds the model
    #[error("Model '{0}' is still busy with a timed-out request")]
    ModelStalled(String),

    /// Disease key absent from the knowledge base
    #[error("No recommendations found for disease: {0}")]
    DiseaseNotFound(String),

    /// Disease present but without any crop entries
    #[error("No data available for disease: {0}")]
    NoCropDataAvailable(String),

    /// Knowledge base file could not be parsed
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CropSightError {
    fn from(err: serde_json::Error) -> Self {
        CropSightError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for CropSightError {
    fn from(err: image::ImageError) -> Self {
        CropSightError::Decode(err.to_string())
    }
}

/// Convenience Result type for CropSight operations
pub type Result<T> = std::result::Result<T, CropSightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CropSightError::DiseaseNotFound("Blight".to_string());
        assert_eq!(
            format!("{}", err),
            "No recommendations found for disease: Blight"
        );
    }

    #[test]
    fn test_label_mismatch_display() {
        let err = CropSightError::LabelMismatch {
            model: "pest".to_string(),
            labels: 3,
            outputs: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("pest"));
        assert!(msg.contains("4 scores"));
    }

    #[test]
    fn test_image_error_becomes_decode() {
        let err = image::load_from_memory(b"definitely not an image").unwrap_err();
        let converted: CropSightError = err.into();
        assert!(matches!(converted, CropSightError::Decode(_)));
    }
}
