//! Treatment recommendations

use axum::extract::{Query, State};
use axum::Json;
use cropsight::knowledge::{resolve, ResolvedRecommendation};
use cropsight::CropSightError;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

const DEFAULT_CROP: &str = "Rice";
const DEFAULT_REGION: &str = "General";

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub disease: Option<String>,
    pub crop: Option<String>,
    pub region: Option<String>,
}

#[derive(Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: ResolvedRecommendation,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// GET /recommendations?disease=&crop=&region=
pub async fn get_recommendations(
    State(state): State<SharedState>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    let disease = non_blank(&query.disease)
        .ok_or_else(|| ApiError::bad_request("Disease parameter is required"))?;
    let crop = non_blank(&query.crop).unwrap_or(DEFAULT_CROP);
    let region = non_blank(&query.region).unwrap_or(DEFAULT_REGION);

    let doc = state
        .knowledge
        .as_ref()
        .ok_or(CropSightError::KnowledgeBaseNotLoaded)?;
    let recommendations = resolve(doc, disease, Some(crop), Some(region))?;

    Ok(Json(RecommendationResponse {
        success: true,
        recommendations,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cropsight::inference::ModelRegistry;

    use crate::config::ServerConfig;
    use crate::routes::test_support::{app, get, send};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_resolves_with_fallbacks() {
        let (status, body) = send(app(), get("/recommendations?disease=Powdery&crop=Wheat&region=Arid")).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        let rec = &body["recommendations"];
        assert_eq!(rec["crop"], "Wheat");
        assert_eq!(rec["region"], "Arid");
        assert_eq!(rec["disease_info"], "White powdery growth.");
        assert_eq!(rec["chemical_control"][0], "Triadimefon");
        assert_eq!(rec["organic_low_cost"][0], "Milk spray");
    }

    #[tokio::test]
    async fn test_default_crop_falls_back_to_first() {
        let (status, body) = send(app(), get("/recommendations?disease=Rust")).await;
        assert_eq!(status, 200);
        assert_eq!(body["recommendations"]["crop"], "Wheat");
        assert_eq!(body["recommendations"]["region"], "General");
        assert_eq!(body["recommendations"]["chemical_control"][0], "Propiconazole");
    }

    #[tokio::test]
    async fn test_missing_disease() {
        for uri in ["/recommendations", "/recommendations?disease=%20%20"] {
            let (status, body) = send(app(), get(uri)).await;
            assert_eq!(status, 400);
            assert_eq!(body["error"], "Disease parameter is required");
        }
    }

    #[tokio::test]
    async fn test_unknown_disease_and_no_crop_data() {
        let (status, body) = send(app(), get("/recommendations?disease=Mosaic")).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], "No recommendations found for disease: Mosaic");

        let (status, body) = send(app(), get("/recommendations?disease=Orphan")).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], "No data available for disease: Orphan");
    }

    #[tokio::test]
    async fn test_knowledge_base_not_loaded() {
        let state = Arc::new(AppState::new(ServerConfig::default(), ModelRegistry::new(), None));
        let (status, body) = send(crate::build_router(state), get("/recommendations?disease=Rust")).await;
        assert_eq!(status, 500);
        assert_eq!(body["success"], false);
    }
}
