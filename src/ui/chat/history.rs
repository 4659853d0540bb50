//! Question history display
//!
//! Re-rendered in full from the transcript whenever it changes.

use crate::app::AppState;
use crate::types::transcript::SegmentKind;
use dioxus::prelude::*;

fn segment_class(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Label => "question-tag",
        SegmentKind::Answer => "answer-tag",
        SegmentKind::Separator => "separator",
    }
}

#[component]
pub fn HistoryPanel() -> Element {
    let app_state = use_context::<AppState>();
    let segments: Vec<(&'static str, String)> = app_state
        .session
        .read()
        .transcript()
        .render_history()
        .into_iter()
        .map(|segment| (segment_class(segment.kind), segment.text))
        .collect();

    rsx! {
        div {
            class: "panel",
            label { class: "section-label", "Question History:" }
            div {
                class: "history-text",
                for (i, (class, text)) in segments.into_iter().enumerate() {
                    span {
                        key: "{i}",
                        class: "{class}",
                        "{text}"
                    }
                }
            }
        }
    }
}
