//! Token streaming
//!
//! Generation runs on its own thread and reports through a channel of
//! [`StreamToken`]s. [`TokenStream`] turns that channel into a lazy iterator
//! of text fragments, and [`accumulate`] drains it into the final answer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::inference::engine::InferenceError;

/// Message sent from a generation thread
#[derive(Debug, Clone, PartialEq)]
pub enum StreamToken {
    /// Decoded text of one or more tokens
    Token(String),
    /// Generation finished normally (EOS, token limit or stop request)
    Done,
    /// Generation failed; no more messages follow
    Error(String),
}

/// Lazy, finite sequence of generated text fragments
///
/// Dropping the stream raises its stop flag so the producing thread winds
/// down instead of generating into a closed channel.
pub struct TokenStream {
    rx: Receiver<StreamToken>,
    stop: Arc<AtomicBool>,
    finished: bool,
}

impl TokenStream {
    pub fn new(rx: Receiver<StreamToken>, stop: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            stop,
            finished: false,
        }
    }

    /// Flag the producer polls between tokens
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

impl Iterator for TokenStream {
    type Item = Result<String, InferenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.rx.recv() {
            Ok(StreamToken::Token(text)) => Some(Ok(text)),
            Ok(StreamToken::Done) => {
                self.finished = true;
                None
            }
            Ok(StreamToken::Error(e)) => {
                self.finished = true;
                Some(Err(InferenceError::Generation(e)))
            }
            Err(_) => {
                self.finished = true;
                Some(Err(InferenceError::Interrupted))
            }
        }
    }
}

impl Drop for TokenStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Concatenate fragments in delivery order until the sequence is exhausted
///
/// Stops at the first error. No partial answer is returned on failure.
pub fn accumulate<I, E>(fragments: I) -> Result<String, E>
where
    I: IntoIterator<Item = Result<String, E>>,
{
    let mut answer = String::new();
    for fragment in fragments {
        answer.push_str(&fragment?);
    }
    Ok(answer)
}
