use crate::domain::synthesis::{CanonicalAudio, FetchedAsset};
use crate::infrastructure::temp::TempStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;
const STDERR_TAIL: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("transcoder '{0}' not found")]
    Unavailable(String),
    #[error("transcoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("transcoding exceeded {0:?}")]
    TimedOut(Duration),
    #[error("failed to run transcoder: {0}")]
    Io(#[from] std::io::Error),
}

/// External tool turning arbitrary audio/video into canonical WAV.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the tool can be run on this host.
    fn is_available(&self) -> bool;

    /// Write mono, 16kHz, 16-bit PCM WAV of `input` to `output`.
    async fn to_canonical_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// ffmpeg-backed [`Transcoder`].
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        locate_executable(&self.program).is_some()
    }

    async fn to_canonical_wav(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let program = locate_executable(&self.program)
            .ok_or_else(|| TranscodeError::Unavailable(self.program.clone()))?;

        let result = Command::new(&program)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-ar", CANONICAL_SAMPLE_RATE.to_string().as_str(), "-ac", "1", "-c:a", "pcm_s16le"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TranscodeError::Unavailable(self.program.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL);
            let tail_start = (tail_start..stderr.len())
                .find(|i| stderr.is_char_boundary(*i))
                .unwrap_or(stderr.len());
            return Err(TranscodeError::Failed {
                status: out.status.to_string(),
                stderr: stderr[tail_start..].trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Resolve `program` the way a shell would: paths are checked directly, bare
/// names are searched on `PATH`.
pub fn locate_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Turns a fetched asset into canonical audio.
///
/// Consumes the fetched asset, so its temp file is gone when this returns,
/// whatever the outcome.
pub struct FormatNormalizer {
    transcoder: Arc<dyn Transcoder>,
    temp: TempStore,
    timeout: Option<Duration>,
}

impl FormatNormalizer {
    pub fn new(transcoder: Arc<dyn Transcoder>, temp: TempStore, timeout: Option<Duration>) -> Self {
        Self {
            transcoder,
            temp,
            timeout,
        }
    }

    pub fn transcoder_available(&self) -> bool {
        self.transcoder.is_available()
    }

    pub async fn normalize(&self, asset: FetchedAsset) -> Result<CanonicalAudio, TranscodeError> {
        if !self.transcoder.is_available() {
            return Err(TranscodeError::Unavailable(self.transcoder.name().to_string()));
        }

        let output = self.temp.allocate("canonical", "wav");
        let started = Instant::now();

        let job = self.transcoder.to_canonical_wav(asset.path(), output.path());
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, job)
                .await
                .unwrap_or(Err(TranscodeError::TimedOut(limit))),
            None => job.await,
        };

        // `output` drops on the error path
        asset.file.release();
        result?;

        tracing::debug!(
            path = %output.path().display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reference audio normalized"
        );

        Ok(CanonicalAudio { file: output })
    }
}
