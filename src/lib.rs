//! # CropSight
//!
//! Inference serving for agricultural image and tabular models built with Burn,
//! plus a treatment recommendation knowledge base.
//!
//! ## Modules
//!
//! - `inference`: preprocessing, the model registry and the inference engine
//! - `model`: Burn networks and the `model_info.json` sidecar
//! - `category`: pest label -> crop family rules
//! - `knowledge`: disease/crop/region recommendations with fallback
//! - `utils`: errors and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cropsight::inference::{InferenceEngine, ModelRegistry};
//!
//! let mut registry = ModelRegistry::new();
//! let model = registry.load_dir("disease", Path::new("models/disease"))?;
//! let ranked = InferenceEngine::default().classify_image(model, bytes, 1).await?;
//! ```

pub mod backend;
pub mod category;
pub mod inference;
pub mod knowledge;
pub mod model;
pub mod utils;

pub use category::{categorize, partition, CategoryPartition, CategoryTag};
pub use inference::{
    InferenceEngine, InputTensor, LoadedModel, ModelHandle, ModelRegistry, ModelSpec,
    PredictionResult, TensorShape,
};
pub use knowledge::{resolve, KnowledgeDocument, ResolvedRecommendation};
pub use model::{BurnClassifier, Classifier, ModelInfo};
pub use utils::error::{CropSightError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
