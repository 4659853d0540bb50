//! Generation worker
//!
//! A [`PendingAnswer`] is everything a worker needs to answer one question
//! off the UI thread. Running it blocks until the stream is exhausted.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::inference::engine::TextGenerator;
use crate::inference::prompt::format_prompt;
use crate::inference::streaming::accumulate;
use crate::types::config::GenerationConfig;

/// How a generation ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Full answer text, fragments concatenated
    Completed(String),
    /// Stopped on request; the partial answer is discarded
    Cancelled,
    /// Inference error, as shown to the user
    Failed(String),
}

/// One admitted question, ready to run on a worker
pub struct PendingAnswer {
    pub(crate) id: Uuid,
    pub(crate) question: String,
    pub(crate) generator: Arc<dyn TextGenerator>,
    pub(crate) config: GenerationConfig,
    pub(crate) cancel: Arc<AtomicBool>,
}

impl PendingAnswer {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Format, generate and accumulate. Blocks the calling thread.
    pub fn run(self) -> GenerationOutcome {
        let started = Instant::now();
        let prompt = format_prompt(&self.question);

        let stream = match self.generator.generate_stream(&prompt, &self.config) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Generation {} could not start: {}", self.id, e);
                return GenerationOutcome::Failed(e.to_string());
            }
        };

        // Forward the session's cancel token to the producer between fragments
        let producer_stop = stream.stop_signal();
        let stopped_early = Cell::new(false);
        let fragments = stream.inspect(|_| {
            if self.cancel.load(Ordering::Relaxed) {
                producer_stop.store(true, Ordering::Relaxed);
                stopped_early.set(true);
            }
        });

        let result = accumulate(fragments);

        // A stop that arrives after the last fragment does not discard the answer
        if stopped_early.get() {
            tracing::info!("Generation {} cancelled", self.id);
            return GenerationOutcome::Cancelled;
        }

        match result {
            Ok(answer) => {
                tracing::info!(
                    "Generation {} finished: {} chars in {:.1}s",
                    self.id,
                    answer.chars().count(),
                    started.elapsed().as_secs_f32()
                );
                GenerationOutcome::Completed(answer)
            }
            Err(e) => {
                tracing::error!("Generation {} failed: {}", self.id, e);
                GenerationOutcome::Failed(e.to_string())
            }
        }
    }
}
