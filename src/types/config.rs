//! Configuration types
//!
//! Sampling parameters and model launch configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory holding the weights and `config.json`, relative to the working directory
pub const DEFAULT_MODELS_DIR: &str = "models";
/// Weights file loaded at startup
pub const DEFAULT_MODEL_FILE: &str = "replit-v2-codeinstruct-3b.q4_1.bin";

/// Sampling parameters applied to every generation
///
/// Built once at startup and cloned into each inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Temperature (0 = greedy)
    pub temperature: f32,
    /// Top-k sampling parameter (<= 0 disables it)
    pub top_k: i32,
    /// Top-p (nucleus sampling) parameter
    pub top_p: f32,
    /// Penalty applied to recently generated tokens (1.0 = off)
    pub repetition_penalty: f32,
    /// RNG seed, negative for a random seed
    pub seed: i32,
    /// Start every generation from an empty context
    pub reset: bool,
    /// Maximum number of tokens to generate
    pub max_new_tokens: u32,
    /// Number of recent tokens the repetition penalty looks at
    pub last_n_tokens: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 50,
            top_p: 0.9,
            repetition_penalty: 1.0,
            seed: 42,
            reset: true,
            max_new_tokens: 256,
            last_n_tokens: 64,
        }
    }
}

/// Model launch configuration, read from `models/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing the weights and config file
    pub models_dir: PathBuf,
    /// Weights file name inside `models_dir`
    pub model_file: String,
    /// Architecture label, informational only (llama.cpp reads it from the file)
    pub model_type: String,
    /// Context window size in tokens
    pub context_length: u32,
    /// Number of GPU layers to offload (0 = CPU only)
    pub gpu_layers: u32,
    /// Generation threads (None = llama.cpp default)
    pub threads: Option<i32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            model_type: "replit".to_string(),
            context_length: 6048,
            gpu_layers: 0,
            threads: None,
        }
    }
}

impl ModelConfig {
    /// Full path to the weights file
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_file)
    }

    /// Clamp values into ranges llama.cpp accepts
    pub fn validate(&mut self) {
        if self.context_length < 512 {
            tracing::warn!(
                "Context length {} too small, raising to 512",
                self.context_length
            );
            self.context_length = 512;
        }
        if let Some(threads) = self.threads {
            if threads <= 0 {
                self.threads = None;
            }
        }
        if self.model_file.trim().is_empty() {
            self.model_file = DEFAULT_MODEL_FILE.to_string();
        }
    }
}
