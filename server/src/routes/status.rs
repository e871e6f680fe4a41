//! API status endpoint

use axum::{extract::State, Json};
use cropsight::backend::backend_name;
use cropsight::category::supported_crops;
use cropsight::inference::{LoadFailure, ModelSummary, TensorShape};
use serde::Serialize;

use crate::state::{SharedState, PEST_MODEL};

#[derive(Serialize)]
pub struct StatusResponse {
    pub api_status: String,
    /// Whether the pest model is loaded
    pub model_loaded: bool,
    pub backend: String,
    pub total_classes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_crops: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<TensorShape>,
    pub knowledge_base_loaded: bool,
    pub models: Vec<ModelSummary>,
    pub failures: Vec<LoadFailure>,
}

/// GET /api/status - loaded models and load failures
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let pest = state.registry.get(PEST_MODEL).ok();
    let registry = state.registry.status();

    Json(StatusResponse {
        api_status: "running".to_string(),
        model_loaded: pest.is_some(),
        backend: backend_name().to_string(),
        total_classes: pest.as_ref().map(|m| m.labels().len()).unwrap_or(0),
        supported_crops: pest.as_ref().map(|_| supported_crops()),
        input_shape: pest.as_ref().map(|m| m.input_shape().clone()),
        knowledge_base_loaded: state.knowledge.is_some(),
        models: registry.models,
        failures: registry.failures,
    })
}
