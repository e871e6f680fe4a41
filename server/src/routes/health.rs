//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: !state.registry.is_empty(),
        uptime_seconds: state.uptime_seconds(),
        version: cropsight::VERSION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use cropsight::inference::ModelRegistry;

    use crate::config::ServerConfig;
    use crate::routes::test_support::{app, get, send, state_with};

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_health_without_models() {
        let app = crate::build_router(state_with(ModelRegistry::new(), ServerConfig::default()));
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["model_loaded"], false);
    }
}
