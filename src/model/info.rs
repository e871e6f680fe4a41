//! `model_info.json` sidecar
//!
//! Every model directory holds the burn weights (`model.mpk`) and this
//! sidecar describing how to build the network and feed it:
//!
//! ```json
//! {
//!   "architecture": { "type": "cnn", "base_filters": 32, "input_size": 224 },
//!   "class_names": ["Healthy", "Powdery", "Rust"],
//!   "normalization": "raw",
//!   "resize_filter": "catmull_rom"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::inference::preprocess::{NormalizationMode, PreprocessOptions, ResizeFilter};
use crate::inference::tensor::TensorShape;
use crate::model::cnn::LeafCnnConfig;
use crate::model::mlp::FeatureMlpConfig;
use crate::utils::error::{CropSightError, Result};

/// File name of the sidecar inside a model directory
pub const INFO_FILE: &str = "model_info.json";

/// File name of the burn record inside a model directory
pub const WEIGHTS_FILE: &str = "model.mpk";

fn default_base_filters() -> usize {
    32
}

fn default_cnn_hidden() -> usize {
    256
}

fn default_mlp_hidden() -> usize {
    64
}

fn default_true() -> bool {
    true
}

/// Network family and its structural hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Architecture {
    Cnn {
        #[serde(default = "default_base_filters")]
        base_filters: usize,
        #[serde(default = "default_cnn_hidden")]
        hidden_size: usize,
        #[serde(default)]
        input_size: Option<usize>,
    },
    Mlp {
        num_features: usize,
        #[serde(default = "default_mlp_hidden")]
        hidden_size: usize,
    },
}

impl Architecture {
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::Cnn { .. } => "cnn",
            Architecture::Mlp { .. } => "mlp",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Architecture::Cnn { .. })
    }

    pub fn cnn_config(&self, num_classes: usize) -> Option<LeafCnnConfig> {
        match self {
            Architecture::Cnn {
                base_filters,
                hidden_size,
                input_size,
            } => Some(
                LeafCnnConfig::new()
                    .with_num_classes(num_classes)
                    .with_base_filters(*base_filters)
                    .with_hidden_size(*hidden_size)
                    .with_input_size(*input_size),
            ),
            Architecture::Mlp { .. } => None,
        }
    }

    pub fn mlp_config(&self, num_classes: usize) -> Option<FeatureMlpConfig> {
        match self {
            Architecture::Mlp {
                num_features,
                hidden_size,
            } => Some(FeatureMlpConfig::new(*num_features, num_classes).with_hidden_size(*hidden_size)),
            Architecture::Cnn { .. } => None,
        }
    }
}

/// Parsed `model_info.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub architecture: Architecture,

    /// Labels in output-index order
    pub class_names: Vec<String>,

    /// Declared input shape without the batch dimension
    #[serde(default)]
    pub input_shape: Option<TensorShape>,

    /// Pixel scaling; required for image models
    #[serde(default)]
    pub normalization: Option<NormalizationMode>,

    #[serde(default)]
    pub resize_filter: ResizeFilter,

    /// Whether the network output is passed through softmax
    #[serde(default = "default_true")]
    pub softmax_output: bool,

    /// Input feature order for tabular models
    #[serde(default)]
    pub feature_names: Vec<String>,
}

impl ModelInfo {
    /// Read and validate the sidecar from a model directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INFO_FILE);
        if !path.exists() {
            return Err(CropSightError::PathNotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        let info: ModelInfo = serde_json::from_str(&content)?;
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.architecture {
            Architecture::Cnn { .. } if self.normalization.is_none() => Err(CropSightError::Config(
                "image models must declare a normalization mode".to_string(),
            )),
            Architecture::Mlp { num_features, .. }
                if !self.feature_names.is_empty() && self.feature_names.len() != *num_features =>
            {
                Err(CropSightError::Config(format!(
                    "{} feature names declared for {} input features",
                    self.feature_names.len(),
                    num_features
                )))
            }
            _ => Ok(()),
        }
    }

    /// Preprocessing settings for image models
    pub fn preprocess_options(&self) -> Option<PreprocessOptions> {
        self.normalization
            .map(|mode| PreprocessOptions::new(mode).with_resize_filter(self.resize_filter))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(INFO_FILE), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cnn_info() {
        let info: ModelInfo = serde_json::from_str(
            r#"{
                "architecture": {"type": "cnn", "input_size": 128},
                "class_names": ["Healthy", "Powdery", "Rust"],
                "normalization": "unit_range"
            }"#,
        )
        .unwrap();

        assert!(info.validate().is_ok());
        assert_eq!(info.architecture.name(), "cnn");
        assert!(info.architecture.is_image());
        assert_eq!(info.resize_filter, ResizeFilter::CatmullRom);
        assert!(info.softmax_output);
        let opts = info.preprocess_options().unwrap();
        assert_eq!(opts.normalization, NormalizationMode::UnitRange);

        let cfg = info.architecture.cnn_config(3).unwrap();
        assert_eq!(cfg.num_classes, 3);
        assert_eq!(cfg.base_filters, 32);
        assert_eq!(cfg.input_size, Some(128));
    }

    #[test]
    fn test_image_model_requires_normalization() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"architecture": {"type": "cnn"}, "class_names": ["A", "B"]}"#,
        )
        .unwrap();
        assert!(matches!(info.validate(), Err(CropSightError::Config(_))));
    }

    #[test]
    fn test_mlp_feature_names_must_match() {
        let info: ModelInfo = serde_json::from_str(
            r#"{
                "architecture": {"type": "mlp", "num_features": 3},
                "class_names": ["rice", "maize"],
                "feature_names": ["N", "P"]
            }"#,
        )
        .unwrap();
        assert!(info.validate().is_err());
    }

    #[test]
    fn test_mlp_without_feature_names_is_tabular() {
        let info: ModelInfo = serde_json::from_str(
            r#"{"architecture": {"type": "mlp", "num_features": 7}, "class_names": ["rice", "maize"]}"#,
        )
        .unwrap();
        assert!(info.validate().is_ok());
        assert!(info.feature_names.is_empty());
        assert!(!info.architecture.is_image());
        assert!(info.preprocess_options().is_none());
    }
}
