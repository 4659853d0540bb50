//! LLM Chatbot desktop entry point
//!
//! Loads the model before the window opens; any failure there ends the process.

use dioxus::desktop::{Config, WindowBuilder};
use llm_chatbot::app::{App, SharedGenerator};
use llm_chatbot::inference::engine::LlamaEngine;
use llm_chatbot::storage::model_config::load_model_config;
use llm_chatbot::types::config::DEFAULT_MODELS_DIR;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const STYLESHEET: &str = include_str!("../assets/main.css");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match load_model_config(Path::new(DEFAULT_MODELS_DIR)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read model configuration: {}", e);
            std::process::exit(1);
        }
    };

    let engine = match LlamaEngine::load(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to load model: {}", e);
            std::process::exit(1);
        }
    };

    let shared = SharedGenerator {
        model_name: engine.model_name().to_string(),
        generator: Arc::new(engine),
    };

    let window = WindowBuilder::new()
        .with_title("LLM Chatbot")
        .with_inner_size(dioxus::desktop::LogicalSize::new(900.0, 820.0));

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            Config::new()
                .with_window(window)
                .with_menu(None)
                .with_custom_head(format!("<style>{STYLESHEET}</style>")),
        )
        .with_context(shared)
        .launch(App);
}
