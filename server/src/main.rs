//! CropSight Server
//!
//! HTTP API serving leaf disease, rice, pest and crop recommendation models
//! plus treatment recommendations from the knowledge base. Everything is
//! loaded once at startup; a missing model only disables its own routes.

mod config;
mod error;
mod routes;
mod state;
mod upload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use cropsight::backend::backend_name;
use cropsight::utils::logging::init_logging;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{RunMode, ServerConfig};
use crate::state::{AppState, SharedState};

/// CropSight Server
#[derive(Parser, Debug)]
#[command(name = "cropsight-server")]
#[command(version)]
#[command(about = "HTTP API for CropSight inference and recommendations")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Run mode; development enables debug logging
    #[arg(long, env = "CROPSIGHT_ENV", value_enum, default_value = "development")]
    env: RunMode,

    /// Models directory (one subdirectory per model)
    #[arg(long, env = "CROPSIGHT_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    /// Recommendations knowledge base
    #[arg(long, env = "CROPSIGHT_KNOWLEDGE_BASE", default_value = "data/recommendations.json")]
    knowledge_base: PathBuf,

    /// Largest accepted image upload in bytes
    #[arg(long, default_value_t = cropsight::inference::MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Per-request inference deadline in seconds
    #[arg(long, default_value = "30")]
    inference_timeout_secs: u64,
}

/// Build the API router over shared state
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        .route("/api/status", get(routes::status::get_status))

        // Leaf disease
        .route("/predict", post(routes::disease::predict))
        .route("/recommendations", get(routes::recommendations::get_recommendations))

        // Pest
        .route("/api/pest/predict", post(routes::pest::predict))
        .route("/api/pest/classes", get(routes::pest::list_classes))

        // Rice and crop
        .route("/api/rice/predict", post(routes::rice::predict))
        .route("/api/crop/predict", post(routes::crop::predict))

        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.env.log_config()).map_err(|e| anyhow::anyhow!(e))?;

    let config = ServerConfig {
        mode: cli.env,
        models_dir: cli.models_dir,
        knowledge_base: cli.knowledge_base,
        max_upload_bytes: cli.max_upload_bytes,
        inference_timeout: Duration::from_secs(cli.inference_timeout_secs),
    };

    info!("CropSight Server v{}", cropsight::VERSION);
    info!("Configuration:");
    info!("  Mode:           {:?} (debug: {})", config.mode, config.mode.is_debug());
    info!("  Backend:        {}", backend_name());
    info!("  Models dir:     {:?}", config.models_dir);
    info!("  Knowledge base: {:?}", config.knowledge_base);
    info!("  Upload limit:   {} bytes", config.max_upload_bytes);
    info!("  Timeout:        {:?}", config.inference_timeout);

    let state = Arc::new(AppState::load(config));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
