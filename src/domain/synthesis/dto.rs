use super::error::SynthesisError;
use super::model::{DecodingParams, InferenceMode, SynthesisRequest};
use serde::{Deserialize, Serialize};

pub const MAX_TEXT_CHARS: usize = 10_000;

/// JSON body for `POST /synthesize`.
///
/// Numbers are taken wide so that out-of-range values are reported by
/// [`SynthesizeBody::validate`] rather than as a deserialization failure. The
/// snake_case aliases keep older clients working.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeBody {
    #[serde(alias = "prompt_url", alias = "reference_audio_url")]
    pub reference_audio_url: String,
    pub text: String,
    #[serde(default, alias = "infer_mode", alias = "inference_mode")]
    pub inference_mode: InferenceMode,
    #[serde(default = "defaults::max_text_tokens_per_sentence", alias = "max_text_tokens_per_sentence")]
    pub max_text_tokens_per_sentence: i64,
    #[serde(default = "defaults::sentences_bucket_max_size", alias = "sentences_bucket_max_size")]
    pub sentences_bucket_max_size: i64,
    #[serde(default = "defaults::do_sample", alias = "do_sample")]
    pub do_sample: bool,
    #[serde(default = "defaults::top_p", alias = "top_p")]
    pub top_p: f64,
    #[serde(default = "defaults::top_k", alias = "top_k")]
    pub top_k: i64,
    #[serde(default = "defaults::temperature")]
    pub temperature: f64,
    #[serde(default = "defaults::length_penalty", alias = "length_penalty")]
    pub length_penalty: f64,
    #[serde(default = "defaults::num_beams", alias = "num_beams")]
    pub num_beams: i64,
    #[serde(default = "defaults::repetition_penalty", alias = "repetition_penalty")]
    pub repetition_penalty: f64,
    #[serde(default = "defaults::max_mel_tokens", alias = "max_mel_tokens")]
    pub max_mel_tokens: i64,
}

mod defaults {
    use super::DecodingParams;

    pub fn max_text_tokens_per_sentence() -> i64 {
        DecodingParams::default().max_text_tokens_per_sentence as i64
    }
    pub fn sentences_bucket_max_size() -> i64 {
        DecodingParams::default().sentences_bucket_max_size as i64
    }
    pub fn do_sample() -> bool {
        DecodingParams::default().do_sample
    }
    pub fn top_p() -> f64 {
        DecodingParams::default().top_p as f64
    }
    pub fn top_k() -> i64 {
        DecodingParams::default().top_k as i64
    }
    pub fn temperature() -> f64 {
        DecodingParams::default().temperature as f64
    }
    pub fn length_penalty() -> f64 {
        DecodingParams::default().length_penalty as f64
    }
    pub fn num_beams() -> i64 {
        DecodingParams::default().num_beams as i64
    }
    pub fn repetition_penalty() -> f64 {
        DecodingParams::default().repetition_penalty as f64
    }
    pub fn max_mel_tokens() -> i64 {
        DecodingParams::default().max_mel_tokens as i64
    }
}

impl SynthesizeBody {
    /// Check bounds and produce the immutable request.
    pub fn validate(self) -> Result<SynthesisRequest, SynthesisError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(invalid("text must not be empty"));
        }
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(SynthesisError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                MAX_TEXT_CHARS
            )));
        }

        let url = self.reference_audio_url.trim();
        if url.is_empty() {
            return Err(invalid("referenceAudioUrl must not be empty"));
        }

        let params = DecodingParams {
            do_sample: self.do_sample,
            top_p: float_in("topP", self.top_p, |v| v > 0.0 && v <= 1.0, "in (0, 1]")?,
            top_k: self.top_k.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            temperature: float_in("temperature", self.temperature, |v| v > 0.0 && v <= 10.0, "in (0, 10]")?,
            length_penalty: float_in("lengthPenalty", self.length_penalty, |_| true, "finite")?,
            num_beams: int_in("numBeams", self.num_beams, 1, 16)?,
            repetition_penalty: float_in(
                "repetitionPenalty",
                self.repetition_penalty,
                |v| v > 0.0 && v <= 100.0,
                "in (0, 100]",
            )?,
            max_mel_tokens: int_in("maxMelTokens", self.max_mel_tokens, 1, 4096)?,
            max_text_tokens_per_sentence: int_in(
                "maxTextTokensPerSentence",
                self.max_text_tokens_per_sentence,
                1,
                1000,
            )?,
            sentences_bucket_max_size: int_in(
                "sentencesBucketMaxSize",
                self.sentences_bucket_max_size,
                1,
                64,
            )?,
        };

        Ok(SynthesisRequest {
            reference_audio_url: url.to_string(),
            text: text.to_string(),
            inference_mode: self.inference_mode,
            params,
        })
    }
}

fn invalid(msg: &str) -> SynthesisError {
    SynthesisError::InvalidRequest(msg.to_string())
}

fn float_in(
    name: &str,
    value: f64,
    accept: impl Fn(f64) -> bool,
    expected: &str,
) -> Result<f32, SynthesisError> {
    if value.is_finite() && accept(value) {
        Ok(value as f32)
    } else {
        Err(SynthesisError::InvalidRequest(format!(
            "{} must be {}, got {}",
            name, expected, value
        )))
    }
}

fn int_in(name: &str, value: i64, min: i64, max: i64) -> Result<u32, SynthesisError> {
    if (min..=max).contains(&value) {
        Ok(value as u32)
    } else {
        Err(SynthesisError::InvalidRequest(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}
