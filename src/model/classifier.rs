//! The model seam: anything that maps an input tensor to a score vector.
//!
//! The registry and engine only see [`Classifier`]. The burn-backed
//! implementation loads weights from a model directory and serializes
//! forward passes through a mutex held only for the duration of the call.

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::{activation::softmax, backend::Backend, Tensor, TensorData};

use crate::inference::tensor::{InputTensor, TensorShape};
use crate::model::cnn::LeafCnn;
use crate::model::info::{Architecture, ModelInfo, WEIGHTS_FILE};
use crate::model::mlp::FeatureMlp;
use crate::utils::error::{CropSightError, Result};

/// A loaded model exposing `predict(input) -> scores`
pub trait Classifier: Send + Sync + fmt::Debug {
    /// One score per class, index-aligned to the model's label set
    fn predict(&self, input: &InputTensor) -> Result<Vec<f32>>;

    /// Input shape the model declares about itself, without batch dimension
    fn input_signature(&self) -> Option<TensorShape> {
        None
    }

    /// Short architecture name for diagnostics
    fn architecture(&self) -> &str;
}

enum Network<B: Backend> {
    Cnn(LeafCnn<B>),
    Mlp(FeatureMlp<B>),
}

/// Burn network loaded from a compact record
pub struct BurnClassifier<B: Backend> {
    network: Mutex<Network<B>>,
    device: B::Device,
    architecture: Architecture,
    softmax_output: bool,
}

impl<B: Backend> BurnClassifier<B> {
    /// Build the network described by `info` and load `dir/model.mpk` into it
    pub fn load(dir: &Path, info: &ModelInfo, device: &B::Device) -> Result<Self> {
        let weights = dir.join(WEIGHTS_FILE);
        if !weights.exists() {
            return Err(CropSightError::PathNotFound(weights));
        }

        let num_classes = info.class_names.len();
        let recorder = CompactRecorder::new();
        let load_err = |e: burn::record::RecorderError| {
            CropSightError::Serialization(format!("failed to read {}: {:?}", weights.display(), e))
        };

        let network = match &info.architecture {
            arch @ Architecture::Cnn { .. } => {
                let config = arch
                    .cnn_config(num_classes)
                    .ok_or_else(|| CropSightError::Config("not a cnn architecture".to_string()))?;
                let model = config
                    .init::<B>(device)
                    .load_file(weights.clone(), &recorder, device)
                    .map_err(load_err)?;
                Network::Cnn(model)
            }
            arch @ Architecture::Mlp { .. } => {
                let config = arch
                    .mlp_config(num_classes)
                    .ok_or_else(|| CropSightError::Config("not an mlp architecture".to_string()))?;
                let model = config
                    .init::<B>(device)
                    .load_file(weights.clone(), &recorder, device)
                    .map_err(load_err)?;
                Network::Mlp(model)
            }
        };

        Ok(Self::from_parts(network, info, device))
    }

    /// Wrap an in-memory MLP (used by tests and tooling)
    pub fn from_mlp(model: FeatureMlp<B>, info: &ModelInfo, device: &B::Device) -> Self {
        Self::from_parts(Network::Mlp(model), info, device)
    }

    fn from_parts(network: Network<B>, info: &ModelInfo, device: &B::Device) -> Self {
        Self {
            network: Mutex::new(network),
            device: device.clone(),
            architecture: info.architecture.clone(),
            softmax_output: info.softmax_output,
        }
    }

    fn to_tensor<const D: usize>(&self, input: &InputTensor) -> Result<Tensor<B, D>> {
        if input.shape().len() != D {
            return Err(CropSightError::ShapeMismatch {
                expected: vec![0; D],
                actual: input.shape().to_vec(),
            });
        }
        let data = TensorData::new(input.data().to_vec(), input.shape().to_vec());
        Ok(Tensor::<B, D>::from_data(data, &self.device))
    }
}

impl<B: Backend> Classifier for BurnClassifier<B> {
    fn predict(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let output = {
            let network = self
                .network
                .lock()
                .map_err(|_| CropSightError::Inference("model lock poisoned".to_string()))?;

            match &*network {
                Network::Cnn(model) => {
                    // (1, H, W, C) -> (1, C, H, W)
                    let x = self.to_tensor::<4>(input)?.permute([0, 3, 1, 2]);
                    model.forward(x)
                }
                Network::Mlp(model) => model.forward(self.to_tensor::<2>(input)?),
            }
        };

        let output = if self.softmax_output {
            softmax(output, 1)
        } else {
            output
        };

        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| CropSightError::Inference(format!("failed to read model output: {:?}", e)))
    }

    fn input_signature(&self) -> Option<TensorShape> {
        match &self.architecture {
            Architecture::Cnn { input_size, .. } => {
                input_size.map(|size| TensorShape::image(size, size, 3))
            }
            Architecture::Mlp { num_features, .. } => Some(TensorShape::features(*num_features)),
        }
    }

    fn architecture(&self) -> &str {
        self.architecture.name()
    }
}

impl<B: Backend> fmt::Debug for BurnClassifier<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BurnClassifier")
            .field("architecture", &self.architecture)
            .field("softmax_output", &self.softmax_output)
            .finish()
    }
}
