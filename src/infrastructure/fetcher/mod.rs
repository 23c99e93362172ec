use crate::domain::synthesis::FetchedAsset;
use crate::infrastructure::temp::TempStore;
use reqwest::{header::CONTENT_TYPE, redirect, Client, StatusCode, Url};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const FALLBACK_EXTENSION: &str = "bin";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("body of {len} bytes is below the {min} byte minimum")]
    TooShort { len: u64, min: u64 },
    #[error("body exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("failed to write temp file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub total_timeout: Duration,
    pub min_bytes: u64,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(120),
            total_timeout: Duration::from_secs(300),
            min_bytes: 16,
            max_bytes: 50 * 1024 * 1024,
            user_agent: "IndexTTS/0.1".to_string(),
        }
    }
}

/// Downloads reference audio into request-owned temp files.
pub struct AssetFetcher {
    client: Client,
    settings: FetcherSettings,
    temp: TempStore,
}

impl AssetFetcher {
    pub fn new(settings: FetcherSettings, temp: TempStore) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .timeout(settings.total_timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            temp,
        })
    }

    /// GET `url` and persist the body to a fresh temp file.
    ///
    /// The scheme is checked before any network activity. The caller owns the
    /// returned asset; dropping it deletes the file.
    pub async fn fetch(&self, url: &str) -> Result<FetchedAsset, FetchError> {
        let parsed = parse_http_url(url)?;

        let mut response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(url = %parsed, status = status.as_u16(), "Reference audio fetch rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.settings.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.settings.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.settings.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.settings.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let byte_size = body.len() as u64;
        if byte_size < self.settings.min_bytes {
            return Err(FetchError::TooShort {
                len: byte_size,
                min: self.settings.min_bytes,
            });
        }

        // The final URL after redirects is the better source for a path extension
        let extension = infer_extension(content_type.as_deref(), response.url());
        let file = self.temp.allocate("prompt", &extension);

        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(file.path())
            .await?;
        out.write_all(&body).await?;
        out.flush().await?;

        tracing::debug!(
            url = %parsed,
            content_type = content_type.as_deref().unwrap_or("-"),
            extension = %extension,
            byte_size,
            path = %file.path().display(),
            "Reference audio stored"
        );

        Ok(FetchedAsset {
            file,
            extension,
            byte_size,
        })
    }
}

/// Accept only absolute http/https URLs.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// Pick a file extension: content type first, then the URL path, then a
/// generic suffix. Returned without the leading dot.
pub fn infer_extension(content_type: Option<&str>, url: &Url) -> String {
    content_type
        .and_then(extension_for_mime)
        .map(str::to_string)
        .or_else(|| extension_from_path(url.path()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "wav",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/opus" => "opus",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/aac" | "audio/x-aac" => "aac",
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => "m4a",
        "audio/webm" | "video/webm" => "webm",
        "audio/amr" => "amr",
        "audio/x-aiff" | "audio/aiff" => "aiff",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/x-matroska" => "mkv",
        _ => return None,
    };
    Some(ext)
}

fn extension_from_path(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
