//! Chat interface components
//!
//! Prompt entry, the latest answer and the question history.

pub mod answer;
pub mod history;
pub mod input;

use answer::AnswerPanel;
use dioxus::prelude::*;
use history::HistoryPanel;
use input::PromptInput;

use crate::app::{AnswerView, AppState};
use crate::session::{Finished, GenerationOutcome};

#[component]
pub fn ChatView() -> Element {
    let app_state = use_context::<AppState>();
    let is_generating = app_state.session.read().is_generating();

    let on_submit = move |raw: String| {
        let mut session = app_state.session;
        let mut answer = app_state.answer;

        let question = raw.trim().to_string();
        let pending = match session.write().begin(question.clone()) {
            Ok(pending) => pending,
            Err(e) => {
                answer.set(AnswerView::Notice(e.to_string()));
                return;
            }
        };
        answer.set(AnswerView::Pending(question.clone()));

        spawn(async move {
            let id = pending.id();
            let outcome = match tokio::task::spawn_blocking(move || pending.run()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Generation worker crashed: {}", e);
                    GenerationOutcome::Failed(format!("Worker crashed: {e}"))
                }
            };

            let finished = session.write().finish(id, &question, outcome);
            match finished {
                Finished::Answered(text) => answer.set(AnswerView::Answer(text)),
                Finished::Cancelled => {
                    answer.set(AnswerView::Notice("Generation stopped.".to_string()))
                }
                Finished::Failed(message) => answer.set(AnswerView::Error(message)),
                Finished::Stale => {}
            }
        });
    };

    let on_stop = move |_: ()| {
        app_state.session.read().cancel();
    };

    rsx! {
        div {
            class: "chat-view",

            PromptInput {
                on_submit: on_submit,
                on_stop: on_stop,
                is_generating: is_generating,
            }

            AnswerPanel {}

            HistoryPanel {}
        }
    }
}
