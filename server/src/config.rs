//! Server configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use cropsight::inference::{DEFAULT_INFERENCE_TIMEOUT, MAX_UPLOAD_BYTES};
use cropsight::utils::logging::LogConfig;
use serde::Serialize;

/// Run mode selected by `CROPSIGHT_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Production,
    Development,
}

impl RunMode {
    pub fn is_debug(&self) -> bool {
        matches!(self, RunMode::Development)
    }

    pub fn log_config(&self) -> LogConfig {
        match self {
            RunMode::Production => LogConfig::production(),
            RunMode::Development => LogConfig::verbose(),
        }
    }
}

/// Resolved server configuration
#[derive(Clone, Debug, Serialize)]
pub struct ServerConfig {
    pub mode: RunMode,
    /// Root holding one subdirectory per model (`disease/`, `rice/`, `pest/`, `crop/`)
    pub models_dir: PathBuf,
    /// Recommendations JSON
    pub knowledge_base: PathBuf,
    /// Largest accepted image upload in bytes
    pub max_upload_bytes: usize,
    /// Deadline for a single forward pass
    pub inference_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Development,
            models_dir: PathBuf::from("models"),
            knowledge_base: PathBuf::from("data/recommendations.json"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Request body limit for the transport layer. Kept above the upload cap so
    /// oversized files reach the handler and get a structured 400.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(self.max_upload_bytes / 10 + 64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.inference_timeout, Duration::from_secs(30));
        assert!(config.mode.is_debug());
        assert!(config.body_limit() > config.max_upload_bytes);
    }
}
