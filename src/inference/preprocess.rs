//! Image preprocessing
//!
//! Turns uploaded image bytes into a `(1, H, W, 3)` tensor. Resizing and
//! normalization are properties of the model, so both travel in
//! [`PreprocessOptions`] rather than being fixed here.

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

use crate::inference::tensor::{InputTensor, TensorShape};
use crate::utils::error::{CropSightError, Result};

/// ImageNet normalization mean values (RGB)
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How pixel values are scaled before reaching the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Divide by 255 into `[0, 1]`
    UnitRange,
    /// Keep `[0, 255]`; the model graph normalizes internally
    Raw,
    /// `[0, 1]` followed by per-channel ImageNet mean/std
    Imagenet,
}

impl NormalizationMode {
    fn apply(self, channel: usize, value: u8) -> f32 {
        let v = value as f32;
        match self {
            NormalizationMode::Raw => v,
            NormalizationMode::UnitRange => v / 255.0,
            NormalizationMode::Imagenet => {
                (v / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
            }
        }
    }
}

impl std::fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizationMode::UnitRange => write!(f, "unit_range"),
            NormalizationMode::Raw => write!(f, "raw"),
            NormalizationMode::Imagenet => write!(f, "imagenet"),
        }
    }
}

/// Resampling filter used to resize to the model's input size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Per-model preprocessing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub normalization: NormalizationMode,
    #[serde(default)]
    pub resize_filter: ResizeFilter,
}

impl PreprocessOptions {
    pub fn new(normalization: NormalizationMode) -> Self {
        Self {
            normalization,
            resize_filter: ResizeFilter::default(),
        }
    }

    pub fn with_resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }
}

/// Decode, coerce to RGB, resize and normalize an uploaded image.
///
/// `target` must be an `(H, W, 3)` image shape. The output is byte-for-byte
/// reproducible for the same bytes and options.
pub fn prepare(bytes: &[u8], target: &TensorShape, options: PreprocessOptions) -> Result<InputTensor> {
    let (height, width) = target.spatial().ok_or_else(|| {
        CropSightError::Preprocess(format!("{} is not an (H, W, 3) image shape", target))
    })?;

    if bytes.is_empty() {
        return Err(CropSightError::Decode("empty image payload".to_string()));
    }

    let image = image::load_from_memory(bytes)?;
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, width, height, options.resize_filter.into());

    // HWC layout, row-major
    let mut data = Vec::with_capacity(target.len());
    for pixel in resized.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            data.push(options.normalization.apply(channel, value));
        }
    }

    InputTensor::new(target.batched(), data)
}
