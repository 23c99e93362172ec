use crate::error::AppError;
use crate::infrastructure::engine::EngineError;
use crate::infrastructure::fetcher::FetchError;
use crate::infrastructure::transcoder::TranscodeError;

/// Every way a synthesis request can fail. Each variant maps to exactly one
/// HTTP status; the carried detail is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("text too large: {0}")]
    PayloadTooLarge(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("fetch failed: {detail}")]
    FetchFailed { status: Option<u16>, detail: String },
    #[error("reference audio of {len} bytes is below the {min} byte minimum")]
    EmptyOrTooShort { len: u64, min: u64 },
    #[error("transcoder unavailable: {0}")]
    TranscoderUnavailable(String),
    #[error("transcoding failed: {0}")]
    TranscodingFailed(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("invalid audio shape: {0}")]
    InvalidAudioShape(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SynthesisError {
    /// Stable name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::PayloadTooLarge(_) => "PayloadTooLarge",
            Self::UnsupportedScheme(_) => "UnsupportedScheme",
            Self::FetchFailed { .. } => "FetchFailed",
            Self::EmptyOrTooShort { .. } => "EmptyOrTooShort",
            Self::TranscoderUnavailable(_) => "TranscoderUnavailable",
            Self::TranscodingFailed(_) => "TranscodingFailed",
            Self::SynthesisFailed(_) => "SynthesisFailed",
            Self::InvalidAudioShape(_) => "InvalidAudioShape",
            Self::Other(_) => "Internal",
        }
    }
}

impl From<FetchError> for SynthesisError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(msg) => SynthesisError::InvalidRequest(msg),
            FetchError::UnsupportedScheme(scheme) => SynthesisError::UnsupportedScheme(scheme),
            FetchError::Status(code) => SynthesisError::FetchFailed {
                status: Some(code),
                detail: format!("upstream status {}", code),
            },
            FetchError::TooShort { len, min } => SynthesisError::EmptyOrTooShort { len, min },
            FetchError::Transport(_) | FetchError::TooLarge { .. } => SynthesisError::FetchFailed {
                status: None,
                detail: err.to_string(),
            },
            FetchError::Io(e) => SynthesisError::Other(anyhow::Error::new(e).context("storing reference audio")),
        }
    }
}

impl From<TranscodeError> for SynthesisError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::Unavailable(name) => SynthesisError::TranscoderUnavailable(name),
            other => SynthesisError::TranscodingFailed(other.to_string()),
        }
    }
}

impl From<EngineError> for SynthesisError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MalformedOutput(msg) => SynthesisError::InvalidAudioShape(msg),
            other => SynthesisError::SynthesisFailed(other.to_string()),
        }
    }
}

/// Client-facing messages stay minimal; paths and engine output never leave
/// the process.
impl From<SynthesisError> for AppError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::InvalidRequest(msg) => AppError::BadRequest(msg),
            SynthesisError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(msg),
            SynthesisError::UnsupportedScheme(_) => {
                AppError::BadRequest("Only http/https URLs are supported".to_string())
            }
            SynthesisError::FetchFailed {
                status: Some(code), ..
            } => AppError::BadGateway(format!("Fetch audio failed: {}", code)),
            SynthesisError::FetchFailed { status: None, .. } => {
                AppError::BadGateway("Fetch audio failed".to_string())
            }
            SynthesisError::EmptyOrTooShort { .. } => {
                AppError::UnprocessableEntity("Audio content is empty or too short".to_string())
            }
            SynthesisError::TranscoderUnavailable(_) => {
                AppError::Internal("Transcoder not available, cannot convert to WAV".to_string())
            }
            SynthesisError::TranscodingFailed(_) => {
                AppError::Internal("Audio transcoding failed".to_string())
            }
            SynthesisError::SynthesisFailed(_) => {
                AppError::Internal("Audio generation failed".to_string())
            }
            SynthesisError::InvalidAudioShape(_) => {
                AppError::Internal("Invalid audio data format".to_string())
            }
            SynthesisError::Other(_) => AppError::Internal("Internal server error".to_string()),
        }
    }
}
