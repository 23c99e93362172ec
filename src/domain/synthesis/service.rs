use super::context::{Phase, RequestContext};
use super::error::SynthesisError;
use super::invoker::SynthesisInvoker;
use super::model::{SynthesisRequest, SynthesizedAudio};
use crate::domain::audio::encode_wav;
use crate::infrastructure::fetcher::AssetFetcher;
use crate::infrastructure::transcoder::FormatNormalizer;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SynthesisService {
    fetcher: Arc<AssetFetcher>,
    normalizer: Arc<FormatNormalizer>,
    invoker: Arc<SynthesisInvoker>,
}

impl SynthesisService {
    pub fn new(
        fetcher: Arc<AssetFetcher>,
        normalizer: Arc<FormatNormalizer>,
        invoker: Arc<SynthesisInvoker>,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            invoker,
        }
    }
}

#[async_trait]
pub trait SynthesisServiceApi: Send + Sync {
    /// Run one request through the pipeline
    ///
    /// This operation:
    /// - Downloads the reference audio
    /// - Normalizes it to mono 16kHz WAV
    /// - Invokes the engine in the requested mode (single attempt)
    /// - Encodes the waveform as WAV
    ///
    /// Every temp file created along the way is gone by the time this returns.
    async fn synthesize(
        &self,
        ctx: &mut RequestContext,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}

#[async_trait]
impl SynthesisServiceApi for SynthesisService {
    async fn synthesize(
        &self,
        ctx: &mut RequestContext,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            text_length = request.text.chars().count(),
            inference_mode = %request.inference_mode,
            "Synthesis request accepted"
        );
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            reference_audio_url = %request.reference_audio_url,
            params = ?request.params,
            "Synthesis parameters"
        );

        // 1. Fetch reference audio
        ctx.advance(Phase::Fetching);
        let asset = match self.fetcher.fetch(&request.reference_audio_url).await {
            Ok(asset) => asset,
            Err(e) => return Err(ctx.fail(e.into())),
        };
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            byte_size = asset.byte_size,
            extension = %asset.extension,
            "Reference audio downloaded"
        );

        // 2. Normalize (consumes the fetched file)
        ctx.advance(Phase::Normalizing);
        let canonical = match self.normalizer.normalize(asset).await {
            Ok(canonical) => canonical,
            Err(e) => return Err(ctx.fail(e.into())),
        };

        // 3. Synthesize (consumes the canonical file)
        ctx.advance(Phase::Synthesizing);
        let result = match self.invoker.invoke(canonical, request).await {
            Ok(result) => result,
            Err(e) => return Err(ctx.fail(e)),
        };

        // 4. Encode
        ctx.advance(Phase::Encoding);
        let wav = encode_wav(result.sample_rate, &result.samples);

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            sample_rate = result.sample_rate,
            sample_count = result.samples.len(),
            wav_bytes = wav.len(),
            "Audio encoded"
        );

        Ok(SynthesizedAudio {
            wav,
            sample_rate: result.sample_rate,
            sample_count: result.samples.len(),
        })
    }
}
