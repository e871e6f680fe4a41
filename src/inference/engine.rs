//! Inference engine
//!
//! The single place that calls into a model. Produces a ranked, top-K list
//! of `(label, confidence)` pairs from the raw score vector.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::inference::labels::ClassLabelSet;
use crate::inference::preprocess;
use crate::inference::registry::{LoadedModel, ModelHandle};
use crate::inference::tensor::InputTensor;
use crate::utils::error::{CropSightError, Result};

/// Default deadline for a single forward pass.
///
/// A blocking forward pass cannot be cancelled. After a timeout the model
/// stays stalled until that pass returns, and calls made meanwhile fail with
/// `ModelStalled` rather than queueing on the model lock.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// One ranked prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    /// Raw model score for `label`
    pub confidence: f32,
    /// 1-based; rank 1 is the argmax
    pub rank: usize,
}

/// Sort scores descending (ties: lower label index first) and keep `top_k`
pub fn rank_scores(labels: &ClassLabelSet, scores: &[f32], top_k: usize) -> Vec<PredictionResult> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    order
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, idx)| PredictionResult {
            label: labels.get(idx).unwrap_or("Unknown").to_string(),
            confidence: scores[idx],
            rank: i + 1,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct InferenceEngine {
    timeout: Duration,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }
}

impl InferenceEngine {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the model and rank its scores.
    ///
    /// Fails on `top_k == 0`, on a tensor that does not match the model's
    /// input shape, and when the score vector width differs from the label
    /// count. Scores are returned as the model produced them.
    pub fn infer(
        &self,
        model: &LoadedModel,
        tensor: &InputTensor,
        top_k: usize,
    ) -> Result<Vec<PredictionResult>> {
        if top_k == 0 {
            return Err(CropSightError::InputValidation(
                "top_k must be at least 1".to_string(),
            ));
        }
        tensor.ensure_shape(model.input_shape())?;

        let start = Instant::now();
        let scores = model.classifier().predict(tensor)?;
        let elapsed = start.elapsed();

        if scores.len() != model.labels().len() {
            error!(
                "Model '{}' output width {} does not match {} class labels",
                model.id(),
                scores.len(),
                model.labels().len()
            );
            return Err(CropSightError::LabelMismatch {
                model: model.id().to_string(),
                labels: model.labels().len(),
                outputs: scores.len(),
            });
        }

        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(CropSightError::Inference(format!(
                "model '{}' produced a non-finite score for '{}'",
                model.id(),
                model.labels().get(bad).unwrap_or("?")
            )));
        }

        let ranked = rank_scores(model.labels(), &scores, top_k);
        if let Some(best) = ranked.first() {
            debug!(
                "Model '{}': {} ({:.4}) in {:.2} ms",
                model.id(),
                best.label,
                best.confidence,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        Ok(ranked)
    }

    /// [`infer`](Self::infer) on the blocking pool, bounded by the engine timeout
    pub async fn infer_with_timeout(
        &self,
        model: ModelHandle,
        tensor: InputTensor,
        top_k: usize,
    ) -> Result<Vec<PredictionResult>> {
        if model.is_stalled() {
            warn!("Model '{}' is still running a timed-out request", model.id());
            return Err(CropSightError::ModelStalled(model.id().to_string()));
        }

        let engine = self.clone();
        let task_model = model.clone();
        let mut task =
            tokio::task::spawn_blocking(move || engine.infer(&task_model, &tensor, top_k));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(CropSightError::Inference(format!(
                "inference task failed: {}",
                join_err
            ))),
            Err(_) => {
                warn!("Model '{}' exceeded {:?}", model.id(), self.timeout);
                model.set_stalled(true);
                let stalled = model.clone();
                tokio::spawn(async move {
                    let _ = task.await;
                    stalled.set_stalled(false);
                    debug!("Model '{}' finished its timed-out request", stalled.id());
                });
                Err(CropSightError::InferenceTimeout(self.timeout))
            }
        }
    }

    /// Preprocess uploaded image bytes for `model` and run inference
    pub async fn classify_image(
        &self,
        model: ModelHandle,
        bytes: Vec<u8>,
        top_k: usize,
    ) -> Result<Vec<PredictionResult>> {
        let options = model.preprocessing()?;
        let shape = model.input_shape().clone();

        let tensor = tokio::task::spawn_blocking(move || preprocess::prepare(&bytes, &shape, options))
            .await
            .map_err(|e| CropSightError::Preprocess(format!("preprocessing task failed: {}", e)))??;

        self.infer_with_timeout(model, tensor, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::preprocess::tests::solid_rgb_png;
    use crate::inference::preprocess::{NormalizationMode, PreprocessOptions};
    use crate::inference::registry::tests::{labels, FixedScores};
    use crate::inference::registry::{ModelRegistry, ModelSpec};
    use crate::inference::tensor::TensorShape;

    fn register(scores: Vec<f32>, names: &[&str]) -> ModelHandle {
        let mut registry = ModelRegistry::new();
        registry
            .load(
                "test",
                Box::new(FixedScores::new(scores)),
                ModelSpec::new(labels(names))
                    .with_input_shape(TensorShape::features(2))
                    .with_preprocessing(PreprocessOptions::new(NormalizationMode::UnitRange)),
            )
            .unwrap()
    }

    fn features() -> InputTensor {
        InputTensor::from_features(&[0.0, 1.0])
    }

    #[test]
    fn test_results_sorted_with_contiguous_ranks() {
        let model = register(vec![0.1, 0.6, 0.05, 0.25], &["a", "b", "c", "d"]);
        let results = InferenceEngine::default().infer(&model, &features(), 4).unwrap();

        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "d", "a", "c"]);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.rank, i + 1);
        }
        assert!(results.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(results[0].confidence, 0.6);
    }

    #[test]
    fn test_top_k_truncates_and_caps_at_class_count() {
        let model = register(vec![0.2, 0.5, 0.3], &["a", "b", "c"]);
        let engine = InferenceEngine::default();

        assert_eq!(engine.infer(&model, &features(), 2).unwrap().len(), 2);
        assert_eq!(engine.infer(&model, &features(), 10).unwrap().len(), 3);
        assert!(matches!(
            engine.infer(&model, &features(), 0),
            Err(CropSightError::InputValidation(_))
        ));
    }

    #[test]
    fn test_ties_keep_label_index_order() {
        let model = register(vec![0.3, 0.2, 0.3, 0.2], &["w", "x", "y", "z"]);
        let engine = InferenceEngine::default();

        let first = engine.infer(&model, &features(), 4).unwrap();
        let labels: Vec<&str> = first.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["w", "y", "x", "z"]);

        for _ in 0..5 {
            assert_eq!(engine.infer(&model, &features(), 4).unwrap(), first);
        }
    }

    #[test]
    fn test_label_mismatch_is_surfaced() {
        let model = register(vec![0.2, 0.5, 0.3], &["a", "b"]);
        let err = InferenceEngine::default()
            .infer(&model, &features(), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            CropSightError::LabelMismatch {
                labels: 2,
                outputs: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected_before_model_call() {
        let model = register(vec![0.5, 0.5], &["a", "b"]);
        let tensor = InputTensor::from_features(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            InferenceEngine::default().infer(&model, &tensor, 1),
            Err(CropSightError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_no_softmax_applied() {
        let model = register(vec![4.0, -2.0], &["a", "b"]);
        let results = InferenceEngine::default().infer(&model, &features(), 2).unwrap();
        assert_eq!(results[0].confidence, 4.0);
        assert_eq!(results[1].confidence, -2.0);
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        let model = register(vec![f32::NAN, 0.5], &["a", "b"]);
        assert!(matches!(
            InferenceEngine::default().infer(&model, &features(), 1),
            Err(CropSightError::Inference(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let mut registry = ModelRegistry::new();
        let mut slow = FixedScores::new(vec![1.0]);
        slow.delay = Some(Duration::from_millis(300));
        let model = registry
            .load(
                "slow",
                Box::new(slow),
                ModelSpec::new(labels(&["a"])).with_input_shape(TensorShape::features(2)),
            )
            .unwrap();

        let engine = InferenceEngine::new(Duration::from_millis(20));
        let err = engine
            .infer_with_timeout(model, features(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CropSightError::InferenceTimeout(_)));
    }

    #[tokio::test]
    async fn test_stalled_model_fails_fast_until_released() {
        let mut registry = ModelRegistry::new();
        let mut slow = FixedScores::new(vec![1.0]);
        slow.delay = Some(Duration::from_millis(200));
        let model = registry
            .load(
                "slow",
                Box::new(slow),
                ModelSpec::new(labels(&["a"])).with_input_shape(TensorShape::features(2)),
            )
            .unwrap();

        let engine = InferenceEngine::new(Duration::from_millis(20));
        let err = engine
            .infer_with_timeout(model.clone(), features(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CropSightError::InferenceTimeout(_)));
        assert!(model.is_stalled());

        let start = Instant::now();
        let err = InferenceEngine::default()
            .infer_with_timeout(model.clone(), features(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CropSightError::ModelStalled(ref id) if id == "slow"));
        assert!(start.elapsed() < Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!model.is_stalled());
        let results = InferenceEngine::default()
            .infer_with_timeout(model, features(), 1)
            .await
            .unwrap();
        assert_eq!(results[0].label, "a");
    }

    #[tokio::test]
    async fn test_classify_image_end_to_end() {
        let mut registry = ModelRegistry::new();
        let model = registry
            .load(
                "disease",
                Box::new(FixedScores::new(vec![0.1, 0.7, 0.2])),
                ModelSpec::new(labels(&["Healthy", "Powdery", "Rust"]))
                    .with_input_shape(TensorShape::image(8, 8, 3))
                    .with_preprocessing(PreprocessOptions::new(NormalizationMode::Raw)),
            )
            .unwrap();

        let results = InferenceEngine::default()
            .classify_image(model, solid_rgb_png(20, 12, [30, 200, 40]), 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Powdery");
        assert_eq!(results[0].rank, 1);
    }

    #[tokio::test]
    async fn test_classify_image_rejects_garbage() {
        let mut registry = ModelRegistry::new();
        let model = registry
            .load(
                "disease",
                Box::new(FixedScores::new(vec![1.0])),
                ModelSpec::new(labels(&["Healthy"]))
                    .with_preprocessing(PreprocessOptions::new(NormalizationMode::UnitRange)),
            )
            .unwrap();

        let err = InferenceEngine::default()
            .classify_image(model, b"not an image".to_vec(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CropSightError::Decode(_)));
    }
}
