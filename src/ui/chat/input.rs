//! Prompt entry with submit and stop buttons

use dioxus::prelude::*;

#[component]
pub fn PromptInput(
    on_submit: EventHandler<String>,
    on_stop: EventHandler<()>,
    is_generating: bool,
) -> Element {
    let mut text = use_signal(String::new);

    // Blank prompts go through as-is; only a running generation blocks submit
    let mut submit = move || {
        if !is_generating {
            on_submit.call(text());
            text.set(String::new());
        }
    };

    let handle_keydown = move |evt: KeyboardEvent| {
        if evt.key() == Key::Escape && is_generating {
            on_stop.call(());
        } else if evt.key() == Key::Enter {
            evt.prevent_default();
            submit();
        }
    };

    let submit_class = if is_generating {
        "button button-primary disabled"
    } else {
        "button button-primary"
    };

    rsx! {
        div {
            class: "prompt",

            label { class: "section-label", r#for: "prompt-entry", "User Prompt:" }

            div {
                class: "prompt-row",

                input {
                    id: "prompt-entry",
                    class: "prompt-entry",
                    r#type: "text",
                    value: "{text}",
                    oninput: move |evt| text.set(evt.value()),
                    onkeydown: handle_keydown,
                }

                button {
                    class: "{submit_class}",
                    disabled: is_generating,
                    title: "Submit (Enter)",
                    onclick: move |_| submit(),
                    "Submit"
                }

                if is_generating {
                    button {
                        class: "button button-stop",
                        title: "Stop (Esc)",
                        onclick: move |_| on_stop.call(()),
                        "Stop"
                    }
                }
            }
        }
    }
}
