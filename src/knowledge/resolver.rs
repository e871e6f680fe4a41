//! Crop / region fallback over the knowledge document

use serde::Serialize;
use tracing::debug;

use crate::knowledge::document::{KnowledgeDocument, RecommendationFields, GENERAL_REGION};
use crate::utils::error::{CropSightError, Result};

/// Recommendation after fallback; `crop` and `region` are the keys actually used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecommendation {
    pub disease: String,
    pub crop: String,
    pub region: String,
    pub disease_info: String,
    pub preventative_cultural: Vec<String>,
    pub organic_low_cost: Vec<String>,
    pub chemical_control: Vec<String>,
}

/// Look up recommendations for `disease`.
///
/// An unknown crop falls back to the first crop listed for the disease. An
/// unknown region falls back to `General`. Descriptive fields always come
/// from the crop's `General` entry; only `chemical_control` is regional.
pub fn resolve(
    doc: &KnowledgeDocument,
    disease: &str,
    crop: Option<&str>,
    region: Option<&str>,
) -> Result<ResolvedRecommendation> {
    let crops = doc
        .disease(disease)
        .ok_or_else(|| CropSightError::DiseaseNotFound(disease.to_string()))?;

    let (crop_key, regions) = match crop.and_then(|c| crops.get(c).map(|r| (c, r))) {
        Some(found) => found,
        None => crops
            .first()
            .ok_or_else(|| CropSightError::NoCropDataAvailable(disease.to_string()))?,
    };
    if crop.is_some_and(|c| c != crop_key) {
        debug!("Crop {:?} not listed for '{}', using '{}'", crop, disease, crop_key);
    }

    let empty = RecommendationFields::default();
    let general = regions.get(GENERAL_REGION).unwrap_or(&empty);

    let (region_key, chemical) = match region.and_then(|r| regions.get(r).map(|f| (r, f))) {
        Some((r, fields)) => (r, &fields.chemical_control),
        None => (GENERAL_REGION, &general.chemical_control),
    };

    Ok(ResolvedRecommendation {
        disease: disease.to_string(),
        crop: crop_key.to_string(),
        region: region_key.to_string(),
        disease_info: general.disease_info.clone(),
        preventative_cultural: general.preventative_cultural.clone(),
        organic_low_cost: general.organic_low_cost.clone(),
        chemical_control: chemical.clone(),
    })
}
