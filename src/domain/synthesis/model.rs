use crate::infrastructure::temp::TempFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Synthesis strategy requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Single-pass synthesis
    #[default]
    Standard,
    /// Sentence-bucketed synthesis
    Batch,
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// Decoding knobs as accepted at ingress, already range-checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodingParams {
    pub do_sample: bool,
    pub top_p: f32,
    pub top_k: i32,
    pub temperature: f32,
    pub length_penalty: f32,
    pub num_beams: u32,
    pub repetition_penalty: f32,
    pub max_mel_tokens: u32,
    pub max_text_tokens_per_sentence: u32,
    pub sentences_bucket_max_size: u32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            do_sample: true,
            top_p: 0.8,
            top_k: 30,
            temperature: 1.0,
            length_penalty: 0.0,
            num_beams: 3,
            repetition_penalty: 10.0,
            max_mel_tokens: 600,
            max_text_tokens_per_sentence: 120,
            sentences_bucket_max_size: 4,
        }
    }
}

/// A validated synthesis request. Immutable once accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub reference_audio_url: String,
    pub text: String,
    pub inference_mode: InferenceMode,
    pub params: DecodingParams,
}

/// Remote reference audio written to a request-owned temp file.
#[derive(Debug)]
pub struct FetchedAsset {
    pub file: TempFile,
    pub extension: String,
    pub byte_size: u64,
}

impl FetchedAsset {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Mono 16kHz PCM WAV derived from a [`FetchedAsset`].
#[derive(Debug)]
pub struct CanonicalAudio {
    pub file: TempFile,
}

impl CanonicalAudio {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Engine output after shape validation. In-memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

/// Encoded response payload.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub sample_count: usize,
}
