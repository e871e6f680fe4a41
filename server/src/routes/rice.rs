//! Rice leaf disease prediction

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::{SharedState, RICE_MODEL};
use crate::upload::{read_image, IMAGE_EXTENSIONS};

const TOP_K: usize = 3;

#[derive(Clone, Serialize)]
pub struct RankedClass {
    pub rank: usize,
    pub class: String,
    pub confidence: f32,
    pub percentage: f32,
}

#[derive(Serialize)]
pub struct RiceResponse {
    pub success: bool,
    pub predictions: Vec<RankedClass>,
    pub best_prediction: RankedClass,
}

/// POST /api/rice/predict - top 3 rice leaf conditions
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RiceResponse>> {
    let model = state.registry.get(RICE_MODEL)?;
    let mut multipart = multipart?;
    let upload = read_image(
        &mut multipart,
        state.config.max_upload_bytes,
        Some(&IMAGE_EXTENSIONS[..]),
    )
    .await?;

    let predictions: Vec<RankedClass> = state
        .engine
        .classify_image(model, upload.bytes, TOP_K)
        .await?
        .into_iter()
        .map(|r| RankedClass {
            rank: r.rank,
            percentage: r.confidence * 100.0,
            confidence: r.confidence,
            class: r.label,
        })
        .collect();

    let best_prediction = predictions
        .first()
        .cloned()
        .ok_or_else(|| ApiError::internal("Failed to process image or make prediction"))?;
    info!(
        "Rice prediction: {} ({:.2}%)",
        best_prediction.class, best_prediction.percentage
    );

    Ok(Json(RiceResponse {
        success: true,
        predictions,
        best_prediction,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, multipart, png_bytes, post_json, send};

    #[tokio::test]
    async fn test_top_three_ranked() {
        let (status, body) = send(app(), multipart("/api/rice/predict", "image", "leaf.jpeg", &png_bytes())).await;
        assert_eq!(status, 200);

        let predictions = body["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 3);
        let ranks: Vec<u64> = predictions.iter().map(|p| p["rank"].as_u64().unwrap()).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(predictions[0]["class"], "Brown Spot");
        assert_eq!(predictions[1]["class"], "Healthy");

        let best = &body["best_prediction"];
        assert_eq!(best["class"], "Brown Spot");
        let pct = best["percentage"].as_f64().unwrap();
        assert!((pct - 60.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_json_error() {
        let (status, body) = send(app(), post_json("/api/rice/predict", r#"{"image": "leaf.png"}"#)).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "No image file provided");
    }
}
