use super::error::SynthesisError;
use super::model::{CanonicalAudio, DecodingParams, InferenceMode, SynthesisRequest, SynthesisResult};
use crate::infrastructure::engine::{EngineOutput, EngineParams, SynthesisEngine};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Highest rate accepted from the engine.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Map ingress parameters to what the engine takes. A non-positive `top_k`
/// means "disabled" and is passed as absent.
pub fn engine_params(params: &DecodingParams) -> EngineParams {
    EngineParams {
        do_sample: params.do_sample,
        top_p: params.top_p,
        top_k: u32::try_from(params.top_k).ok().filter(|k| *k > 0),
        temperature: params.temperature,
        length_penalty: params.length_penalty,
        num_beams: params.num_beams,
        repetition_penalty: params.repetition_penalty,
        max_mel_tokens: params.max_mel_tokens,
        max_text_tokens_per_sentence: params.max_text_tokens_per_sentence,
    }
}

/// Check the engine result before it reaches the encoder.
pub fn validate_output(output: EngineOutput) -> Result<SynthesisResult, SynthesisError> {
    if output.channels != 1 {
        return Err(SynthesisError::InvalidAudioShape(format!(
            "expected mono output, got {} channels",
            output.channels
        )));
    }
    let sample_rate = u32::try_from(output.sample_rate)
        .ok()
        .filter(|rate| (1..=MAX_SAMPLE_RATE).contains(rate))
        .ok_or_else(|| {
            SynthesisError::InvalidAudioShape(format!("sample rate {}", output.sample_rate))
        })?;
    if output.samples.is_empty() {
        return Err(SynthesisError::InvalidAudioShape("no samples".to_string()));
    }

    Ok(SynthesisResult {
        sample_rate,
        samples: output.samples.into_i16(),
    })
}

/// Runs one synthesis attempt on a blocking worker thread.
pub struct SynthesisInvoker {
    engine: Arc<dyn SynthesisEngine>,
    timeout: Option<Duration>,
}

impl SynthesisInvoker {
    pub fn new(engine: Arc<dyn SynthesisEngine>, timeout: Option<Duration>) -> Self {
        Self { engine, timeout }
    }

    /// The canonical audio stays owned by this future: it is deleted before
    /// any result is returned, on timeout, or when the future is dropped.
    /// The engine only sees its path.
    pub async fn invoke(
        &self,
        audio: CanonicalAudio,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let engine = self.engine.clone();
        let text = request.text.clone();
        let mode = request.inference_mode;
        let params = engine_params(&request.params);
        let bucket_size = request.params.sentences_bucket_max_size;

        let prompt_wav = audio.path().to_path_buf();

        let job = tokio::task::spawn_blocking(move || match mode {
            InferenceMode::Standard => engine.synthesize(&prompt_wav, &text, &params),
            InferenceMode::Batch => {
                engine.synthesize_bucketed(&prompt_wav, &text, &params, bucket_size)
            }
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, job).await {
                Ok(joined) => joined,
                Err(_) => {
                    drop(audio);
                    return Err(SynthesisError::SynthesisFailed(format!(
                        "synthesis exceeded {:?}",
                        limit
                    )));
                }
            },
            None => job.await,
        };

        drop(audio);

        let output = joined.context("synthesis task panicked")??;
        validate_output(output)
    }
}
