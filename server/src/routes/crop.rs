//! Crop recommendation from soil and weather readings

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use cropsight::inference::{encode_features, CROP_FEATURES};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::{SharedState, CROP_MODEL};

const TOP_K: usize = 5;

#[derive(Serialize)]
pub struct CropScore {
    pub crop: String,
    pub confidence: f32,
}

#[derive(Serialize)]
pub struct CropPrediction {
    pub predicted_crop: String,
    pub confidence: f32,
    pub top_predictions: Vec<CropScore>,
}

#[derive(Serialize)]
pub struct CropResponse {
    pub success: bool,
    pub prediction: CropPrediction,
}

/// Parse a JSON object of feature readings. Numbers and numeric strings are
/// accepted.
fn parse_readings(body: &[u8]) -> ApiResult<HashMap<String, f64>> {
    let raw: HashMap<String, Value> = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Request body must be a JSON object: {}", e)))?;

    let mut readings = HashMap::with_capacity(raw.len());
    for (name, value) in raw {
        let number = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let number = number
            .ok_or_else(|| ApiError::bad_request(format!("Feature '{}' must be a number", name)))?;
        readings.insert(name, number);
    }
    Ok(readings)
}

/// POST /api/crop/predict - suggest crops for the given conditions
pub async fn predict(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<CropResponse>> {
    let model = state.registry.get(CROP_MODEL)?;
    let body = body?;
    let readings = parse_readings(&body)?;

    let tensor = if model.feature_names().is_empty() {
        encode_features(&CROP_FEATURES, &readings)?
    } else {
        encode_features(model.feature_names(), &readings)?
    };

    let results = state.engine.infer_with_timeout(model, tensor, TOP_K).await?;
    let best = results
        .first()
        .ok_or_else(|| ApiError::internal("Model returned no predictions"))?;
    info!("Crop prediction: {} ({:.3})", best.label, best.confidence);

    Ok(Json(CropResponse {
        success: true,
        prediction: CropPrediction {
            predicted_crop: best.label.clone(),
            confidence: best.confidence,
            top_predictions: results
                .iter()
                .map(|r| CropScore {
                    crop: r.label.clone(),
                    confidence: r.confidence,
                })
                .collect(),
        },
    }))
}
