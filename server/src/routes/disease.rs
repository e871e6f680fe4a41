//! Leaf disease prediction

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::{SharedState, DISEASE_MODEL};
use crate::upload::read_image;

const TOP_K: usize = 1;

#[derive(Serialize)]
pub struct DiseasePrediction {
    pub class_name: String,
    /// Formatted to 4 decimals
    pub confidence: String,
}

#[derive(Serialize)]
pub struct DiseaseResponse {
    pub success: bool,
    pub prediction: DiseasePrediction,
}

/// POST /predict - classify a leaf image
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DiseaseResponse>> {
    let model = state.registry.get(DISEASE_MODEL)?;
    let mut multipart = multipart?;
    let upload = read_image(&mut multipart, state.config.max_upload_bytes, None).await?;

    let results = state
        .engine
        .classify_image(model, upload.bytes, TOP_K)
        .await?;
    let best = results
        .into_iter()
        .next()
        .ok_or_else(|| crate::error::ApiError::internal("Model returned no predictions"))?;

    info!("Disease prediction: {} ({:.4})", best.label, best.confidence);
    Ok(Json(DiseaseResponse {
        success: true,
        prediction: DiseasePrediction {
            class_name: best.label,
            confidence: format!("{:.4}", best.confidence),
        },
    }))
}

#[cfg(test)]
mod tests {
    use cropsight::inference::ModelRegistry;

    use crate::config::ServerConfig;
    use crate::routes::test_support::{app, multipart, png_bytes, post_json, send, state_with};

    #[tokio::test]
    async fn test_predict() {
        let (status, body) = send(app(), multipart("/predict", "image", "leaf.jpg", &png_bytes())).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["prediction"]["class_name"], "Powdery");
        assert_eq!(body["prediction"]["confidence"], "0.8000");
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let (status, body) = send(app(), multipart("/predict", "file", "leaf.jpg", &png_bytes())).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_json_error() {
        let (status, body) = send(app(), post_json("/predict", "{}")).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_undecodable_image() {
        let (status, body) = send(app(), multipart("/predict", "image", "leaf.jpg", b"not an image")).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().starts_with("Failed to decode image"));
    }

    #[tokio::test]
    async fn test_model_unavailable() {
        let app = crate::build_router(state_with(ModelRegistry::new(), ServerConfig::default()));
        let (status, body) = send(app, multipart("/predict", "image", "leaf.jpg", &png_bytes())).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "Model 'disease' is unavailable");
    }
}
