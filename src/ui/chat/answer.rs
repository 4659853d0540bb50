//! Latest-answer display

use crate::app::{AnswerView, AppState};
use dioxus::prelude::*;

#[component]
pub fn AnswerPanel() -> Element {
    let app_state = use_context::<AppState>();
    let view = app_state.answer.read().clone();

    let (class, text) = match view {
        AnswerView::Empty => ("answer-text", String::new()),
        AnswerView::Pending(question) => (
            "answer-text pending",
            format!("Question:\n{question}\n\nGenerating..."),
        ),
        AnswerView::Answer(text) => ("answer-text answer-tag", text),
        AnswerView::Notice(text) => ("answer-text notice", text),
        AnswerView::Error(text) => ("answer-text error", format!("Error: {text}")),
    };

    rsx! {
        div {
            class: "panel",
            label { class: "section-label", "Assistant Response:" }
            div {
                class: "{class}",
                "{text}"
            }
        }
    }
}
