//! Burn networks served by the registry
//!
//! - `cnn`: convolutional image classifier (leaf disease, rice, pest)
//! - `mlp`: tabular classifier (crop recommendation)
//! - `info`: the `model_info.json` sidecar
//! - `classifier`: the `Classifier` trait and its burn implementation

pub mod classifier;
pub mod cnn;
pub mod info;
pub mod mlp;

pub use classifier::{BurnClassifier, Classifier};
pub use cnn::{LeafCnn, LeafCnnConfig};
pub use info::{Architecture, ModelInfo, INFO_FILE, WEIGHTS_FILE};
pub use mlp::{FeatureMlp, FeatureMlpConfig};
