//! Application state for the CropSight server
//!
//! Built once before serving; nothing in here is mutated afterwards.

use std::sync::Arc;
use std::time::Instant;

use cropsight::inference::{InferenceEngine, ModelRegistry};
use cropsight::knowledge::KnowledgeDocument;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Leaf disease classifier, served on `/predict`
pub const DISEASE_MODEL: &str = "disease";
/// Rice leaf classifier, served on `/api/rice/predict`
pub const RICE_MODEL: &str = "rice";
/// Pest classifier, served on `/api/pest/*`
pub const PEST_MODEL: &str = "pest";
/// Crop recommendation classifier, served on `/api/crop/predict`
pub const CROP_MODEL: &str = "crop";

/// Model ids, each loaded from the subdirectory of the same name
pub const MODEL_IDS: [&str; 4] = [DISEASE_MODEL, RICE_MODEL, PEST_MODEL, CROP_MODEL];

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub registry: ModelRegistry,
    pub knowledge: Option<KnowledgeDocument>,
    pub engine: InferenceEngine,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        registry: ModelRegistry,
        knowledge: Option<KnowledgeDocument>,
    ) -> Self {
        let engine = InferenceEngine::new(config.inference_timeout);
        Self {
            config,
            registry,
            knowledge,
            engine,
            started_at: Instant::now(),
        }
    }

    /// Load every model and the knowledge base named by `config`.
    ///
    /// Missing pieces are logged and left out; dependent routes report them
    /// as unavailable.
    pub fn load(config: ServerConfig) -> Self {
        let mut registry = ModelRegistry::new();
        for id in MODEL_IDS {
            let dir = config.models_dir.join(id);
            // failures are recorded on the registry and surfaced by /api/status
            if registry.load_dir(id, &dir).is_err() {
                warn!("Routes backed by model '{}' will be unavailable", id);
            }
        }
        info!("{} of {} models loaded", registry.len(), MODEL_IDS.len());

        let knowledge = match KnowledgeDocument::load(&config.knowledge_base) {
            Ok(doc) => Some(doc),
            Err(e) => {
                error!("Knowledge base unavailable: {}", e);
                None
            }
        };

        Self::new(config, registry, knowledge)
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
