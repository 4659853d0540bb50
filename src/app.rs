//! Root Dioxus application component
//!
//! This module contains the main App component that serves as the root of the UI tree.

use crate::inference::engine::TextGenerator;
use crate::session::ChatSession;
use crate::types::config::GenerationConfig;
use crate::ui::Layout;
use dioxus::prelude::*;
use std::sync::Arc;

/// Loaded model handed to the UI at launch
#[derive(Clone)]
pub struct SharedGenerator {
    pub generator: Arc<dyn TextGenerator>,
    pub model_name: String,
}

/// Contents of the latest-answer area
#[derive(Clone, PartialEq, Debug)]
pub enum AnswerView {
    Empty,
    /// Waiting on the named question
    Pending(String),
    /// Formatted answer
    Answer(String),
    /// Informational message (stop, busy)
    Notice(String),
    Error(String),
}

/// Global application state shared across components
#[derive(Clone, Copy)]
pub struct AppState {
    pub session: Signal<ChatSession>,
    pub answer: Signal<AnswerView>,
    pub model_name: Signal<String>,
}

impl AppState {
    pub fn new(shared: &SharedGenerator) -> Self {
        tracing::info!("AppState initialized");
        let config = GenerationConfig::default();
        tracing::debug!("Generation config: {:?}", config);

        Self {
            session: Signal::new(ChatSession::new(Arc::clone(&shared.generator), config)),
            answer: Signal::new(AnswerView::Empty),
            model_name: Signal::new(shared.model_name.clone()),
        }
    }
}

#[component]
pub fn App() -> Element {
    let shared = use_context::<SharedGenerator>();
    use_context_provider(|| AppState::new(&shared));

    rsx! {
        Layout {}
    }
}
