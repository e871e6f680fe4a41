//! Pest detection endpoints

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use cropsight::category::{categorize, partition, CategoryPartition, CategoryTag};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::{SharedState, PEST_MODEL};
use crate::upload::{read_image, IMAGE_EXTENSIONS};

const TOP_K: usize = 5;

#[derive(Serialize)]
pub struct PestScore {
    pub pest_name: String,
    pub confidence: f32,
}

#[derive(Serialize)]
pub struct PestPrediction {
    pub predicted_pest: String,
    pub confidence: f32,
    pub crop_category: CategoryTag,
    pub top_5_predictions: Vec<PestScore>,
}

#[derive(Serialize)]
pub struct PestResponse {
    pub success: bool,
    pub prediction: PestPrediction,
}

#[derive(Serialize)]
pub struct PestClassesResponse {
    pub total_classes: usize,
    pub crop_categories: CategoryPartition,
    pub all_classes: Vec<String>,
}

/// POST /api/pest/predict - identify a pest and its crop family
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PestResponse>> {
    let model = state.registry.get(PEST_MODEL)?;
    let mut multipart = multipart?;
    let upload = read_image(
        &mut multipart,
        state.config.max_upload_bytes,
        Some(&IMAGE_EXTENSIONS[..]),
    )
    .await?;
    info!(
        "Processing pest image {:?} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let results = state
        .engine
        .classify_image(model, upload.bytes, TOP_K)
        .await?;
    let best = results
        .first()
        .ok_or_else(|| ApiError::internal("Model returned no predictions"))?;

    let prediction = PestPrediction {
        predicted_pest: best.label.clone(),
        confidence: best.confidence,
        crop_category: categorize(&best.label),
        top_5_predictions: results
            .iter()
            .map(|r| PestScore {
                pest_name: r.label.clone(),
                confidence: r.confidence,
            })
            .collect(),
    };
    info!(
        "Pest prediction: {} ({:.3}), crop {}",
        prediction.predicted_pest, prediction.confidence, prediction.crop_category
    );

    Ok(Json(PestResponse {
        success: true,
        prediction,
    }))
}

/// GET /api/pest/classes - pest labels grouped by crop
pub async fn list_classes(State(state): State<SharedState>) -> ApiResult<Json<PestClassesResponse>> {
    let model = state.registry.get(PEST_MODEL)?;
    let labels = model.labels();

    Ok(Json(PestClassesResponse {
        total_classes: labels.len(),
        crop_categories: partition(labels.iter()),
        all_classes: labels.as_slice().to_vec(),
    }))
}
