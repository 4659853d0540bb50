//! LLM inference
//!
//! This module handles prompt formatting, llama-cpp model loading and token streaming.

pub mod engine;
pub mod prompt;
pub mod streaming;
