//! Model registry
//!
//! Built once at startup, then shared read-only behind an `Arc`. Entries are
//! never replaced: loading an identifier twice is an error, and a model that
//! failed to load stays absent with its failure reason recorded so routes can
//! report "model unavailable" instead of bringing the process down.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::backend::{default_device, InferenceBackend};
use crate::inference::labels::ClassLabelSet;
use crate::inference::preprocess::PreprocessOptions;
use crate::inference::tensor::TensorShape;
use crate::model::classifier::{BurnClassifier, Classifier};
use crate::model::info::ModelInfo;
use crate::utils::error::{CropSightError, Result};

/// Metadata supplied alongside a classifier when it is registered
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub labels: ClassLabelSet,
    /// Declared input shape; derived from the model when absent
    pub input_shape: Option<TensorShape>,
    /// Required for image models, `None` for tabular ones
    pub preprocessing: Option<PreprocessOptions>,
    pub feature_names: Vec<String>,
}

impl ModelSpec {
    pub fn new(labels: ClassLabelSet) -> Self {
        Self {
            labels,
            input_shape: None,
            preprocessing: None,
            feature_names: Vec::new(),
        }
    }

    pub fn with_input_shape(mut self, shape: TensorShape) -> Self {
        self.input_shape = Some(shape);
        self
    }

    pub fn with_preprocessing(mut self, options: PreprocessOptions) -> Self {
        self.preprocessing = Some(options);
        self
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }
}

/// A registered model plus the metadata needed to feed it
#[derive(Debug)]
pub struct LoadedModel {
    id: String,
    classifier: Box<dyn Classifier>,
    labels: ClassLabelSet,
    input_shape: TensorShape,
    preprocessing: Option<PreprocessOptions>,
    feature_names: Vec<String>,
    /// Set while a timed-out forward pass is still running
    stalled: AtomicBool,
}

/// Shared, immutable reference to a loaded model
pub type ModelHandle = Arc<LoadedModel>;

impl LoadedModel {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn labels(&self) -> &ClassLabelSet {
        &self.labels
    }

    pub fn input_shape(&self) -> &TensorShape {
        &self.input_shape
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn architecture(&self) -> &str {
        self.classifier.architecture()
    }

    /// Preprocessing settings; an error for models that take no images
    pub fn preprocessing(&self) -> Result<PreprocessOptions> {
        self.preprocessing.ok_or_else(|| {
            CropSightError::Config(format!("model '{}' declares no image preprocessing", self.id))
        })
    }

    /// Only the inference engine calls into the model
    pub(crate) fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled.load(Ordering::Acquire)
    }

    pub(crate) fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::Release);
    }
}

/// Summary of a loaded model for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub id: String,
    pub architecture: String,
    pub total_classes: usize,
    pub input_shape: TensorShape,
    pub normalization: Option<String>,
}

/// A model that failed to load at startup
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub id: String,
    pub reason: String,
}

/// Registry contents for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub models: Vec<ModelSummary>,
    pub failures: Vec<LoadFailure>,
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelHandle>,
    failures: HashMap<String, String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a classifier under `id`.
    ///
    /// The input shape is the declared one, else the classifier's own
    /// signature, else `224x224x3`.
    pub fn load(
        &mut self,
        id: &str,
        classifier: Box<dyn Classifier>,
        spec: ModelSpec,
    ) -> Result<ModelHandle> {
        if self.models.contains_key(id) {
            return Err(CropSightError::DuplicateModel(id.to_string()));
        }

        let input_shape = match spec.input_shape {
            Some(shape) => shape,
            None => match classifier.input_signature() {
                Some(shape) => {
                    info!("Model '{}': input shape {} taken from model signature", id, shape);
                    shape
                }
                None => {
                    let shape = TensorShape::default();
                    warn!("Model '{}': no input shape declared, defaulting to {}", id, shape);
                    shape
                }
            },
        };

        let handle = Arc::new(LoadedModel {
            id: id.to_string(),
            classifier,
            labels: spec.labels,
            input_shape,
            preprocessing: spec.preprocessing,
            feature_names: spec.feature_names,
            stalled: AtomicBool::new(false),
        });

        info!(
            "Model '{}' registered: {} ({} classes, input {})",
            id,
            handle.architecture(),
            handle.labels.len(),
            handle.input_shape
        );

        self.failures.remove(id);
        self.models.insert(id.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Load `dir/model_info.json` + `dir/model.mpk` on the inference backend.
    ///
    /// Failures are recorded against `id` and returned as `ModelLoad`.
    pub fn load_dir(&mut self, id: &str, dir: &Path) -> Result<ModelHandle> {
        match self.try_load_dir(id, dir) {
            Ok(handle) => Ok(handle),
            Err(CropSightError::DuplicateModel(id)) => Err(CropSightError::DuplicateModel(id)),
            Err(e) => {
                let reason = e.to_string();
                error!("Failed to load model '{}' from {:?}: {}", id, dir, reason);
                self.failures.insert(id.to_string(), reason.clone());
                Err(CropSightError::ModelLoad {
                    id: id.to_string(),
                    reason,
                })
            }
        }
    }

    fn try_load_dir(&mut self, id: &str, dir: &Path) -> Result<ModelHandle> {
        if self.models.contains_key(id) {
            return Err(CropSightError::DuplicateModel(id.to_string()));
        }

        let info = ModelInfo::load(dir)?;
        let labels = ClassLabelSet::new(info.class_names.clone())?;
        let classifier = BurnClassifier::<InferenceBackend>::load(dir, &info, &default_device())?;

        let mut spec = ModelSpec::new(labels).with_feature_names(info.feature_names.clone());
        if let Some(shape) = info.input_shape.clone() {
            spec = spec.with_input_shape(shape);
        }
        if let Some(options) = info.preprocess_options() {
            spec = spec.with_preprocessing(options);
        }

        self.load(id, Box::new(classifier), spec)
    }

    /// Look up a loaded model
    pub fn get(&self, id: &str) -> Result<ModelHandle> {
        self.models
            .get(id)
            .cloned()
            .ok_or_else(|| CropSightError::ModelNotLoaded(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Recorded load failure for `id`, if any
    pub fn failure(&self, id: &str) -> Option<&str> {
        self.failures.get(id).map(String::as_str)
    }

    /// Loaded models sorted by id
    pub fn summaries(&self) -> Vec<ModelSummary> {
        let mut summaries: Vec<ModelSummary> = self
            .models
            .values()
            .map(|m| ModelSummary {
                id: m.id.clone(),
                architecture: m.architecture().to_string(),
                total_classes: m.labels.len(),
                input_shape: m.input_shape.clone(),
                normalization: m.preprocessing.map(|p| p.normalization.to_string()),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            models: self.summaries(),
            failures: self.failures(),
        }
    }

    /// Load failures sorted by id
    pub fn failures(&self) -> Vec<LoadFailure> {
        let mut failures: Vec<LoadFailure> = self
            .failures
            .iter()
            .map(|(id, reason)| LoadFailure {
                id: id.clone(),
                reason: reason.clone(),
            })
            .collect();
        failures.sort_by(|a, b| a.id.cmp(&b.id));
        failures
    }
}
