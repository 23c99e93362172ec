//! The speech-synthesis capability.
//!
//! The neural model itself lives outside this crate. [`SynthesisEngine`] is the
//! seam the request pipeline talks to: two blocking entry points, one
//! single-pass and one sentence-bucketed. The engine is built once at startup
//! and shared read-only between requests.

pub mod artifacts;
pub mod process;

pub use artifacts::{verify_model_artifacts, REQUIRED_MODEL_FILES};
pub use process::{ProcessEngineSettings, ProcessSynthesisEngine};

use crate::domain::audio::SampleBuffer;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("required model file missing: {file} ({path})")]
    MissingArtifact { file: String, path: PathBuf },
    #[error("engine failed to start: {0}")]
    Startup(String),
    #[error("engine reported an error: {0}")]
    Inference(String),
    #[error("engine returned an unexpected result shape: {0}")]
    MalformedOutput(String),
    #[error("engine worker unavailable: {0}")]
    Worker(String),
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoding parameters exactly as the engine receives them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineParams {
    pub do_sample: bool,
    pub top_p: f32,
    /// `None` disables top-k filtering; never zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub temperature: f32,
    pub length_penalty: f32,
    pub num_beams: u32,
    pub repetition_penalty: f32,
    pub max_mel_tokens: u32,
    pub max_text_tokens_per_sentence: u32,
}

/// Raw engine output, before shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub sample_rate: i64,
    pub channels: u16,
    pub samples: SampleBuffer,
}

pub trait SynthesisEngine: Send + Sync {
    /// Single-pass synthesis.
    fn synthesize(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
    ) -> Result<EngineOutput, EngineError>;

    /// Sentence-bucketed synthesis.
    fn synthesize_bucketed(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
        sentences_bucket_max_size: u32,
    ) -> Result<EngineOutput, EngineError>;
}
