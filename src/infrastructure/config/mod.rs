use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::fetcher::FetcherSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
    // Reference audio download
    pub fetch_connect_timeout_secs: u64,
    pub fetch_read_timeout_secs: u64,
    pub fetch_total_timeout_secs: u64,
    pub fetch_min_bytes: u64,
    pub fetch_max_bytes: u64,
    pub fetch_user_agent: String,
    // External tools
    pub transcoder_bin: String,
    pub transcode_timeout_secs: Option<u64>,
    pub synthesis_timeout_secs: Option<u64>,
    pub temp_dir: PathBuf,
    pub engine_command: String,
    pub engine_script: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "6008".to_string())
                .parse()?,
            model_dir: env::var("MODEL_DIR")
                .unwrap_or_else(|_| "checkpoints".to_string())
                .into(),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .to_lowercase(),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            log_file: optional_var("LOG_FILE").map(PathBuf::from),
            fetch_connect_timeout_secs: env::var("FETCH_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            fetch_read_timeout_secs: env::var("FETCH_READ_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            fetch_total_timeout_secs: env::var("FETCH_TOTAL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            fetch_min_bytes: env::var("FETCH_MIN_BYTES")
                .unwrap_or_else(|_| "16".to_string())
                .parse()?,
            fetch_max_bytes: env::var("FETCH_MAX_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse()?,
            fetch_user_agent: env::var("FETCH_USER_AGENT")
                .unwrap_or_else(|_| "IndexTTS/0.1".to_string()),
            transcoder_bin: env::var("TRANSCODER_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            transcode_timeout_secs: optional_var("TRANSCODE_TIMEOUT_SECS")
                .map(|v| v.parse())
                .transpose()?,
            synthesis_timeout_secs: optional_var("SYNTHESIS_TIMEOUT_SECS")
                .map(|v| v.parse())
                .transpose()?,
            temp_dir: optional_var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            engine_command: env::var("ENGINE_COMMAND").unwrap_or_else(|_| "python3".to_string()),
            engine_script: Some(
                env::var("ENGINE_SCRIPT")
                    .unwrap_or_else(|_| "scripts/indextts_worker.py".to_string()),
            )
            .filter(|s| !s.is_empty())
            .map(PathBuf::from),
        };

        Ok(config)
    }

    pub fn fetcher_settings(&self) -> FetcherSettings {
        FetcherSettings {
            connect_timeout: Duration::from_secs(self.fetch_connect_timeout_secs),
            read_timeout: Duration::from_secs(self.fetch_read_timeout_secs),
            total_timeout: Duration::from_secs(self.fetch_total_timeout_secs),
            min_bytes: self.fetch_min_bytes,
            max_bytes: self.fetch_max_bytes,
            user_agent: self.fetch_user_agent.clone(),
        }
    }

    pub fn transcode_timeout(&self) -> Option<Duration> {
        self.transcode_timeout_secs.map(Duration::from_secs)
    }

    pub fn synthesis_timeout(&self) -> Option<Duration> {
        self.synthesis_timeout_secs.map(Duration::from_secs)
    }
}

/// Unset and empty are the same thing.
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
