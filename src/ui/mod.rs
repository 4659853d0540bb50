//! UI components
//!
//! This module contains all user interface components built with Dioxus.

pub mod chat;

use crate::app::AppState;
use chat::ChatView;
use dioxus::prelude::*;

/// Window chrome around the chat view
#[component]
pub fn Layout() -> Element {
    let app_state = use_context::<AppState>();
    let model_name = app_state.model_name.read().clone();
    let status = if app_state.session.read().is_generating() {
        "Generating..."
    } else {
        "Idle"
    };

    rsx! {
        div {
            class: "layout",

            header {
                class: "layout-header",
                span { class: "model-name", "{model_name}" }
                span { class: "status", "{status}" }
            }

            main {
                class: "layout-body",
                ChatView {}
            }
        }
    }
}
