//! Inference pipeline
//!
//! - `tensor`: model input tensors and shapes
//! - `preprocess`: image bytes -> normalized `(1, H, W, 3)` tensor
//! - `features`: named tabular features -> `(1, n)` tensor
//! - `labels`: class label sets aligned to model outputs
//! - `registry`: models loaded once at startup, immutable afterwards
//! - `engine`: runs a model and ranks its scores

pub mod engine;
pub mod features;
pub mod labels;
pub mod preprocess;
pub mod registry;
pub mod tensor;

pub use engine::{rank_scores, InferenceEngine, PredictionResult, DEFAULT_INFERENCE_TIMEOUT};
pub use features::{encode_features, CROP_FEATURES};
pub use labels::ClassLabelSet;
pub use preprocess::{prepare, NormalizationMode, PreprocessOptions, ResizeFilter};
pub use registry::{
    LoadFailure, LoadedModel, ModelHandle, ModelRegistry, ModelSpec, ModelSummary, RegistryStatus,
};
pub use tensor::{InputTensor, TensorShape, DEFAULT_IMAGE_SHAPE};

/// Maximum accepted upload size (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
