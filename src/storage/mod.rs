//! Configuration storage
//!
//! Read-only access to the models directory. Nothing is persisted.

pub mod model_config;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading configuration from disk
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Models directory not found: {0}")]
    MissingModelsDir(PathBuf),
}
