//! Chat session
//!
//! Owns the generation config, the transcript and the idle/generating phase.
//! One generation may be in flight at a time; a second submission while one
//! runs is rejected rather than queued.

pub mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::inference::engine::TextGenerator;
use crate::inference::prompt::format_answer;
use crate::types::config::GenerationConfig;
use crate::types::transcript::Transcript;
pub use worker::{GenerationOutcome, PendingAnswer};

/// Submission errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("A generation is already in progress")]
    Busy,
}

/// Current phase of the session
#[derive(Clone, Debug)]
enum Phase {
    Idle,
    Generating { id: Uuid, cancel: Arc<AtomicBool> },
}

/// What the UI should show after a generation ends
#[derive(Clone, Debug, PartialEq)]
pub enum Finished {
    /// Formatted answer, now the last transcript entry
    Answered(String),
    Cancelled,
    Failed(String),
    /// Outcome for a generation that is no longer the current one
    Stale,
}

pub struct ChatSession {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
    transcript: Transcript,
    phase: Phase,
}

impl ChatSession {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self {
            generator,
            config,
            transcript: Transcript::new(),
            phase: Phase::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Generating { .. })
    }

    /// Admit a question: idle -> generating
    ///
    /// The question is taken as given; trimming is the caller's concern.
    pub fn begin(&mut self, question: impl Into<String>) -> Result<PendingAnswer, SubmitError> {
        if let Phase::Generating { id, .. } = &self.phase {
            tracing::warn!("Rejected submission while generation {} is running", id);
            return Err(SubmitError::Busy);
        }

        let id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        self.phase = Phase::Generating {
            id,
            cancel: Arc::clone(&cancel),
        };
        tracing::info!("Generation {} started", id);

        Ok(PendingAnswer {
            id,
            question: question.into(),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
            cancel,
        })
    }

    /// Request cancellation of the in-flight generation, if any
    pub fn cancel(&self) -> bool {
        match &self.phase {
            Phase::Generating { id, cancel } => {
                tracing::info!("Cancelling generation {}", id);
                cancel.store(true, Ordering::Relaxed);
                true
            }
            Phase::Idle => false,
        }
    }

    /// Apply a worker's outcome: generating -> idle
    ///
    /// Only a completed answer touches the transcript.
    pub fn finish(&mut self, id: Uuid, question: &str, outcome: GenerationOutcome) -> Finished {
        match &self.phase {
            Phase::Generating { id: current, .. } if *current == id => {}
            _ => {
                tracing::warn!("Ignoring outcome of stale generation {}", id);
                return Finished::Stale;
            }
        }
        self.phase = Phase::Idle;

        match outcome {
            GenerationOutcome::Completed(answer) => {
                let formatted = format_answer(question, &answer);
                self.transcript.push(question.to_string(), formatted.clone());
                Finished::Answered(formatted)
            }
            GenerationOutcome::Cancelled => Finished::Cancelled,
            GenerationOutcome::Failed(message) => Finished::Failed(message),
        }
    }

    /// Begin, run and finish on the current thread
    pub fn ask(&mut self, question: &str) -> Result<Finished, SubmitError> {
        let pending = self.begin(question)?;
        let id = pending.id();
        let outcome = pending.run();
        Ok(self.finish(id, question, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::engine::InferenceError;
    use crate::inference::streaming::{StreamToken, TokenStream};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays fixed fragments and records every prompt it was given
    struct ScriptedGenerator {
        fragments: Vec<String>,
        fail_with: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                fail_with: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::new(&["partial"])
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate_stream(
            &self,
            prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<TokenStream, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let (tx, rx) = mpsc::channel();
            for fragment in &self.fragments {
                tx.send(StreamToken::Token(fragment.clone())).unwrap();
            }
            match &self.fail_with {
                Some(message) => tx.send(StreamToken::Error(message.clone())).unwrap(),
                None => tx.send(StreamToken::Done).unwrap(),
            }
            Ok(TokenStream::new(rx, Arc::new(AtomicBool::new(false))))
        }
    }

    /// Fails before producing a stream
    struct BrokenGenerator;

    impl TextGenerator for BrokenGenerator {
        fn generate_stream(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<TokenStream, InferenceError> {
            Err(InferenceError::Context("out of memory".to_string()))
        }
    }

    /// Streams "x" until its stream's stop flag is raised
    struct EndlessGenerator {
        first_token: Mutex<Option<mpsc::Sender<()>>>,
        saw_stop: Arc<AtomicBool>,
    }

    impl TextGenerator for EndlessGenerator {
        fn generate_stream(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<TokenStream, InferenceError> {
            let (tx, rx) = mpsc::channel();
            let stop = Arc::new(AtomicBool::new(false));
            let producer_stop = Arc::clone(&stop);
            let saw_stop = Arc::clone(&self.saw_stop);
            let first_token = self.first_token.lock().unwrap().take();

            std::thread::spawn(move || {
                for _ in 0..2000 {
                    if producer_stop.load(Ordering::Relaxed) {
                        saw_stop.store(true, Ordering::Relaxed);
                        break;
                    }
                    if tx.send(StreamToken::Token("x".to_string())).is_err() {
                        return;
                    }
                    if let Some(notify) = &first_token {
                        let _ = notify.send(());
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
                let _ = tx.send(StreamToken::Done);
            });

            Ok(TokenStream::new(rx, stop))
        }
    }

    fn session_with(generator: Arc<ScriptedGenerator>) -> ChatSession {
        ChatSession::new(generator, GenerationConfig::default())
    }

    #[test]
    fn test_sequential_questions_keep_order() {
        let generator = Arc::new(ScriptedGenerator::new(&["Hel", "lo"]));
        let mut session = session_with(generator);

        session.ask("Q1").unwrap();
        session.ask("Q2").unwrap();

        let transcript = session.transcript();
        assert_eq!(transcript.questions(), ["Q1", "Q2"]);
        assert_eq!(
            transcript.answers(),
            [
                "Question:\nQ1\n\nAnswer:\nHello",
                "Question:\nQ2\n\nAnswer:\nHello"
            ]
        );
        assert!(!session.is_generating());
    }

    #[test]
    fn test_completed_answer_is_returned_formatted() {
        let generator = Arc::new(ScriptedGenerator::new(&["4"]));
        let mut session = session_with(generator);
        let finished = session.ask("2+2?").unwrap();
        assert_eq!(finished, Finished::Answered("Question:\n2+2?\n\nAnswer:\n4".to_string()));
    }

    #[test]
    fn test_blank_prompt_is_submitted() {
        let generator = Arc::new(ScriptedGenerator::new(&["ok"]));
        let mut session = session_with(Arc::clone(&generator));

        session.ask("").unwrap();
        session.ask("   ").unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], "### Instruction:\n\n\n### Response:");
        assert_eq!(prompts[1], "### Instruction:\n   \n\n### Response:");
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_overlapping_submission_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::new(&["a"]));
        let mut session = session_with(generator);

        let first = session.begin("Q1").unwrap();
        assert!(session.is_generating());
        assert_eq!(session.begin("Q2").err(), Some(SubmitError::Busy));

        let id = first.id();
        let outcome = first.run();
        session.finish(id, "Q1", outcome);

        assert!(!session.is_generating());
        assert_eq!(session.transcript().questions(), ["Q1"]);
        assert!(session.begin("Q2").is_ok());
    }

    #[test]
    fn test_cancelled_generation_leaves_transcript_untouched() {
        let generator = Arc::new(ScriptedGenerator::new(&["a", "b", "c"]));
        let mut session = session_with(generator);

        let pending = session.begin("Q").unwrap();
        assert!(session.cancel());
        let id = pending.id();
        let outcome = pending.run();
        assert_eq!(outcome, GenerationOutcome::Cancelled);

        assert_eq!(session.finish(id, "Q", outcome), Finished::Cancelled);
        assert!(session.transcript().is_empty());
        assert!(!session.is_generating());
        assert!(!session.cancel());
    }

    #[test]
    fn test_stop_reaches_producer_mid_stream() {
        let (started_tx, started_rx) = mpsc::channel();
        let saw_stop = Arc::new(AtomicBool::new(false));
        let generator = Arc::new(EndlessGenerator {
            first_token: Mutex::new(Some(started_tx)),
            saw_stop: Arc::clone(&saw_stop),
        });
        let mut session = ChatSession::new(generator, GenerationConfig::default());

        let pending = session.begin("Q").unwrap();
        let id = pending.id();
        let worker = std::thread::spawn(move || pending.run());

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(session.cancel());

        let outcome = worker.join().unwrap();
        assert_eq!(outcome, GenerationOutcome::Cancelled);
        assert!(saw_stop.load(Ordering::Relaxed));

        assert_eq!(session.finish(id, "Q", outcome), Finished::Cancelled);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_stop_after_last_fragment_keeps_answer() {
        let generator = Arc::new(ScriptedGenerator::new(&[]));
        let mut session = session_with(generator);

        let pending = session.begin("Q").unwrap();
        session.cancel();
        let id = pending.id();
        let outcome = pending.run();
        assert_eq!(outcome, GenerationOutcome::Completed(String::new()));

        assert!(matches!(session.finish(id, "Q", outcome), Finished::Answered(_)));
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_stream_error_is_surfaced() {
        let generator = Arc::new(ScriptedGenerator::failing("decode failed"));
        let mut session = session_with(generator);

        match session.ask("Q").unwrap() {
            Finished::Failed(message) => assert!(message.contains("decode failed")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(session.transcript().is_empty());
        assert!(!session.is_generating());
    }

    #[test]
    fn test_start_error_is_surfaced() {
        let mut session = ChatSession::new(Arc::new(BrokenGenerator), GenerationConfig::default());
        match session.ask("Q").unwrap() {
            Finished::Failed(message) => assert!(message.contains("out of memory")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!session.is_generating());
    }

    #[test]
    fn test_stale_outcome_is_ignored() {
        let generator = Arc::new(ScriptedGenerator::new(&["a"]));
        let mut session = session_with(generator);

        let finished = session.finish(Uuid::new_v4(), "ghost", GenerationOutcome::Completed("x".into()));
        assert_eq!(finished, Finished::Stale);
        assert!(session.transcript().is_empty());

        let pending = session.begin("Q").unwrap();
        let finished = session.finish(Uuid::new_v4(), "ghost", GenerationOutcome::Completed("x".into()));
        assert_eq!(finished, Finished::Stale);
        assert!(session.is_generating());

        let id = pending.id();
        let outcome = pending.run();
        assert!(matches!(session.finish(id, "Q", outcome), Finished::Answered(_)));
    }

    #[tokio::test]
    async fn test_worker_runs_off_the_calling_task() {
        let generator = Arc::new(ScriptedGenerator::new(&["Hel", "lo", " ", "world"]));
        let mut session = session_with(generator);

        for question in ["first", "second"] {
            let pending = session.begin(question).unwrap();
            let id = pending.id();
            let outcome = tokio::task::spawn_blocking(move || pending.run())
                .await
                .unwrap();
            session.finish(id, question, outcome);
        }

        assert_eq!(session.transcript().questions(), ["first", "second"]);
        assert!(session.transcript().answers()[1].ends_with("Hello world"));
    }
}
