//! Utility modules: error types and logging setup

pub mod error;
pub mod logging;

pub use error::{CropSightError, Result};
pub use logging::{init_logging, LogConfig, LogLevel};
