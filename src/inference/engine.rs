//! llama.cpp inference engine
//!
//! Loads the model once and runs each generation on a dedicated thread,
//! streaming decoded text back through a channel.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use thiserror::Error;

use crate::inference::streaming::{StreamToken, TokenStream};
use crate::types::config::{GenerationConfig, ModelConfig};

/// Inference errors
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to initialize llama backend: {0}")]
    BackendInit(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Failed to create context: {0}")]
    Context(String),
    #[error("Tokenization failed: {0}")]
    Tokenize(String),
    #[error("Prompt is {tokens} tokens, context holds {context_length}")]
    PromptTooLong { tokens: usize, context_length: u32 },
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("Generation ended without a result")]
    Interrupted,
}

/// Anything that can turn a prompt into a stream of text fragments
pub trait TextGenerator: Send + Sync {
    fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TokenStream, InferenceError>;
}

/// llama.cpp backed generator
pub struct LlamaEngine {
    backend: Arc<LlamaBackend>,
    model: Arc<LlamaModel>,
    model_name: String,
    context_length: u32,
    threads: Option<i32>,
}

impl LlamaEngine {
    /// Initialize the backend and load the weights named by `config`
    pub fn load(config: &ModelConfig) -> Result<Self, InferenceError> {
        let path = config.model_path();
        if !path.is_file() {
            return Err(InferenceError::ModelNotFound(path));
        }

        let backend =
            LlamaBackend::init().map_err(|e| InferenceError::BackendInit(e.to_string()))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);

        tracing::info!(
            "Loading {} model from {} ({} GPU layers)",
            config.model_type,
            path.display(),
            config.gpu_layers
        );
        let model = LlamaModel::load_from_file(&backend, &path, &model_params)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        tracing::info!("Model loaded");

        let model_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model_file.clone());

        Ok(Self {
            backend: Arc::new(backend),
            model: Arc::new(model),
            model_name,
            context_length: config.context_length,
            threads: config.threads,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl TextGenerator for LlamaEngine {
    fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TokenStream, InferenceError> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let job = GenerationJob {
            backend: Arc::clone(&self.backend),
            model: Arc::clone(&self.model),
            context_length: self.context_length,
            threads: self.threads,
            prompt: prompt.to_string(),
            config: config.clone(),
            stop: Arc::clone(&stop),
        };

        std::thread::Builder::new()
            .name("llm-generate".to_string())
            .spawn(move || job.run(tx))
            .map_err(|e| InferenceError::Generation(format!("Failed to spawn thread: {e}")))?;

        Ok(TokenStream::new(rx, stop))
    }
}

/// Everything one generation thread owns
struct GenerationJob {
    backend: Arc<LlamaBackend>,
    model: Arc<LlamaModel>,
    context_length: u32,
    threads: Option<i32>,
    prompt: String,
    config: GenerationConfig,
    stop: Arc<AtomicBool>,
}

impl GenerationJob {
    fn run(self, tx: Sender<StreamToken>) {
        match self.generate(&tx) {
            Ok(count) => {
                tracing::debug!("Generated {} tokens", count);
                let _ = tx.send(StreamToken::Done);
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                let _ = tx.send(StreamToken::Error(e.to_string()));
            }
        }
    }

    /// Returns the number of tokens generated
    fn generate(&self, tx: &Sender<StreamToken>) -> Result<u32, InferenceError> {
        // Every call builds its own context, so `reset` is always in effect
        if !self.config.reset {
            tracing::debug!("reset=false requested, context is still rebuilt per generation");
        }

        let mut ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.context_length))
            .with_n_batch(self.context_length);
        if let Some(threads) = self.threads {
            ctx_params = ctx_params
                .with_n_threads(threads)
                .with_n_threads_batch(threads);
        }

        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| InferenceError::Context(e.to_string()))?;

        let tokens = self
            .model
            .str_to_token(&self.prompt, AddBos::Always)
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;
        if tokens.is_empty() {
            return Err(InferenceError::Tokenize("prompt produced no tokens".to_string()));
        }
        if tokens.len() >= self.context_length as usize {
            return Err(InferenceError::PromptTooLong {
                tokens: tokens.len(),
                context_length: self.context_length,
            });
        }

        let mut batch = LlamaBatch::new(tokens.len(), 1);
        let last_index = tokens.len() - 1;
        for (i, token) in tokens.iter().enumerate() {
            batch
                .add(*token, i as i32, &[0], i == last_index)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }
        ctx.decode(&mut batch)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        let mut sampler = build_sampler(&self.config);
        let mut n_cur = batch.n_tokens();
        let mut pending = Vec::new();
        let mut generated = 0;

        while generated < self.config.max_new_tokens {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!("Generation stopped after {} tokens", generated);
                break;
            }

            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            if self.model.is_eog_token(token) {
                break;
            }
            generated += 1;

            let bytes = self
                .model
                .token_to_bytes(token, Special::Plaintext)
                .map_err(|e| InferenceError::Generation(e.to_string()))?;
            pending.extend_from_slice(&bytes);
            let text = drain_utf8(&mut pending);
            if !text.is_empty() && tx.send(StreamToken::Token(text)).is_err() {
                // Receiver dropped
                return Ok(generated);
            }

            if n_cur as u32 >= self.context_length {
                tracing::warn!("Context window full, ending generation");
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
            n_cur += 1;
            ctx.decode(&mut batch)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }

        if !pending.is_empty() {
            let _ = tx.send(StreamToken::Token(String::from_utf8_lossy(&pending).into_owned()));
        }

        Ok(generated)
    }
}

/// Map the sampling parameters onto a llama.cpp sampler chain
fn build_sampler(config: &GenerationConfig) -> LlamaSampler {
    let penalties = LlamaSampler::penalties(config.last_n_tokens, config.repetition_penalty, 0.0, 0.0);

    if config.temperature <= 0.0 {
        return LlamaSampler::chain_simple([penalties, LlamaSampler::greedy()]);
    }

    let mut chain = vec![penalties];
    if config.top_k > 0 {
        chain.push(LlamaSampler::top_k(config.top_k));
    }
    chain.push(LlamaSampler::top_p(config.top_p, 1));
    chain.push(LlamaSampler::temp(config.temperature));
    chain.push(LlamaSampler::dist(sampler_seed(config.seed)));
    LlamaSampler::chain_simple(chain)
}

/// Negative seeds map to llama.cpp's "pick a random seed" value
fn sampler_seed(seed: i32) -> u32 {
    u32::try_from(seed).unwrap_or(u32::MAX)
}

/// Take the longest complete UTF-8 prefix out of `pending`
///
/// A multi-byte character split across tokens stays buffered until the rest
/// arrives. Bytes that can never form valid UTF-8 are replaced.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    let complete = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => return String::from_utf8_lossy(&std::mem::take(pending)).into_owned(),
    };
    let tail = pending.split_off(complete);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}
