//! LLM Chatbot library
//!
//! Core library for the local instruct-model desktop front-end.

pub mod app;
pub mod inference;
pub mod session;
pub mod storage;
pub mod types;
pub mod ui;
