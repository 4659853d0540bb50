//! Prompt templates
//!
//! The instruct model expects an Alpaca-style instruction/response frame.

const INSTRUCTION_MARKER: &str = "### Instruction:";
const RESPONSE_MARKER: &str = "### Response:";

/// Wrap a raw user prompt in the instruction template
///
/// The prompt is embedded verbatim; empty or whitespace-only input is not
/// rejected.
pub fn format_prompt(user_prompt: &str) -> String {
    format!("{INSTRUCTION_MARKER}\n{user_prompt}\n\n{RESPONSE_MARKER}")
}

/// Text shown for a finished answer and stored in the transcript
pub fn format_answer(question: &str, answer: &str) -> String {
    format!("Question:\n{question}\n\nAnswer:\n{answer}")
}
