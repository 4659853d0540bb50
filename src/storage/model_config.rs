//! Model configuration loading
//!
//! Reads the optional `config.json` from the models directory. The file is
//! never written back.

use crate::storage::StorageError;
use crate::types::config::ModelConfig;
use std::fs;
use std::path::Path;

/// Name of the optional override file inside the models directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Load the launch configuration for `models_dir`
///
/// The directory itself must exist. A missing `config.json` yields the
/// defaults; a malformed one is an error.
pub fn load_model_config(models_dir: &Path) -> Result<ModelConfig, StorageError> {
    let models_dir = std::path::absolute(models_dir)?;
    if !models_dir.is_dir() {
        return Err(StorageError::MissingModelsDir(models_dir));
    }

    let path = models_dir.join(CONFIG_FILE_NAME);
    let mut config = if path.exists() {
        let json = fs::read_to_string(&path)?;
        let config: ModelConfig = serde_json::from_str(&json)?;
        tracing::debug!("Loaded model config from {}", path.display());
        config
    } else {
        tracing::info!("No {} in {}, using defaults", CONFIG_FILE_NAME, models_dir.display());
        ModelConfig::default()
    };

    // The directory the file was found in always wins over any path it names
    config.models_dir = models_dir;
    config.validate();
    Ok(config)
}
