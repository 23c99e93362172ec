use async_trait::async_trait;
use indextts_api::domain::audio::SampleBuffer;
use indextts_api::infrastructure::engine::{
    EngineError, EngineOutput, EngineParams, SynthesisEngine,
};
use indextts_api::infrastructure::transcoder::{TranscodeError, Transcoder};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::asset_server::BROKEN_MARKER;

/// Text that makes [`FakeEngine`] fail regardless of its configured reply.
pub const FAIL_ENGINE_TEXT: &str = "please fail";

#[derive(Debug, Clone)]
pub struct EngineCall {
    pub bucketed: bool,
    pub text: String,
    pub params: EngineParams,
    pub sentences_bucket_max_size: Option<u32>,
    /// Whether the canonical prompt file existed during the call.
    pub prompt_present: bool,
}

#[derive(Debug, Clone)]
pub enum EngineReply {
    Audio(EngineOutput),
    Error(String),
    Malformed(String),
}

/// Records every call and answers with the configured reply.
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    reply: Mutex<EngineReply>,
    delay: Mutex<Duration>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(EngineReply::Audio(EngineOutput {
                sample_rate: 22050,
                channels: 1,
                samples: SampleBuffer::Int16(vec![0, 1000, -1000, 500]),
            })),
            delay: Mutex::new(Duration::ZERO),
        }
    }
}

impl FakeEngine {
    pub fn reply_with(&self, reply: EngineReply) {
        *self.reply.lock() = reply;
    }

    /// Block for `delay` on every call before answering.
    pub fn stall_for(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    fn answer(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
        sentences_bucket_max_size: Option<u32>,
    ) -> Result<EngineOutput, EngineError> {
        self.calls.lock().push(EngineCall {
            bucketed: sentences_bucket_max_size.is_some(),
            text: text.to_string(),
            params: params.clone(),
            sentences_bucket_max_size,
            prompt_present: prompt_wav.exists(),
        });

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        if text.contains(FAIL_ENGINE_TEXT) {
            return Err(EngineError::Inference("forced failure".to_string()));
        }

        match self.reply.lock().clone() {
            EngineReply::Audio(output) => Ok(output),
            EngineReply::Error(msg) => Err(EngineError::Inference(msg)),
            EngineReply::Malformed(msg) => Err(EngineError::MalformedOutput(msg)),
        }
    }
}

impl SynthesisEngine for FakeEngine {
    fn synthesize(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
    ) -> Result<EngineOutput, EngineError> {
        self.answer(prompt_wav, text, params, None)
    }

    fn synthesize_bucketed(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
        sentences_bucket_max_size: u32,
    ) -> Result<EngineOutput, EngineError> {
        self.answer(prompt_wav, text, params, Some(sentences_bucket_max_size))
    }
}

/// Copies input to output, failing on inputs that start with [`BROKEN_MARKER`].
pub struct FakeTranscoder {
    available: AtomicBool,
    calls: AtomicUsize,
    delay: Mutex<Duration>,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        }
    }
}

impl FakeTranscoder {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Hang for `delay` after writing the output, before reporting success.
    pub fn stall_for(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake-ffmpeg"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn to_canonical_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let bytes = tokio::fs::read(input).await?;
        if bytes.starts_with(BROKEN_MARKER) {
            // Leave a partial output behind, like a real tool would
            tokio::fs::write(output, b"partial").await?;
            return Err(TranscodeError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        tokio::fs::write(output, bytes).await?;

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
