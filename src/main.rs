use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use indextts_api::controllers::synthesis::SynthesisController;
use indextts_api::domain::synthesis::{SynthesisInvoker, SynthesisService};
use indextts_api::infrastructure::config::{Config, LogFormat};
use indextts_api::infrastructure::engine::{
    verify_model_artifacts, ProcessEngineSettings, ProcessSynthesisEngine, SynthesisEngine,
};
use indextts_api::infrastructure::fetcher::AssetFetcher;
use indextts_api::infrastructure::http::{build_router, start_http_server};
use indextts_api::infrastructure::temp::TempStore;
use indextts_api::infrastructure::transcoder::{FfmpegTranscoder, FormatNormalizer, Transcoder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config)?;

    tracing::info!(
        log_level = %config.log_level,
        log_file = ?config.log_file,
        "Starting IndexTTS API on {}:{}",
        config.host,
        config.port
    );

    // Model files must be in place before we accept traffic
    verify_model_artifacts(&config.model_dir)?;

    let temp = TempStore::new(config.temp_dir.clone());
    std::fs::create_dir_all(temp.dir())?;

    // Load the model once; every request shares this handle
    tracing::info!("Initializing synthesis engine...");
    let engine_settings = ProcessEngineSettings {
        command: config.engine_command.clone(),
        script: config.engine_script.clone(),
        model_dir: config.model_dir.clone(),
    };
    let engine_temp = temp.clone();
    let engine: Arc<dyn SynthesisEngine> = Arc::new(
        tokio::task::spawn_blocking(move || ProcessSynthesisEngine::start(engine_settings, engine_temp))
            .await??,
    );

    let transcoder: Arc<dyn Transcoder> = Arc::new(FfmpegTranscoder::new(config.transcoder_bin.clone()));
    if !transcoder.is_available() {
        tracing::warn!(
            transcoder = %config.transcoder_bin,
            "Transcoder not found; synthesis requests will fail until it is installed"
        );
    }

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    tracing::info!("Instantiating pipeline components...");
    let fetcher = Arc::new(AssetFetcher::new(config.fetcher_settings(), temp.clone())?);
    let normalizer = Arc::new(FormatNormalizer::new(
        transcoder,
        temp.clone(),
        config.transcode_timeout(),
    ));
    let invoker = Arc::new(SynthesisInvoker::new(engine, config.synthesis_timeout()));

    let synthesis_service = Arc::new(SynthesisService::new(fetcher, normalizer.clone(), invoker));
    let synthesis_controller = Arc::new(SynthesisController::new(synthesis_service));

    // Start HTTP server with all routes
    let app = build_router(synthesis_controller, normalizer);
    start_http_server(config, app).await?;

    tracing::info!("IndexTTS API shut down");

    Ok(())
}

fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = format!("indextts_api={},tower_http=info", config.log_level);

    let log_file = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(Arc::new(file))
        }
        None => None,
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .with(log_file.map(|file| {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(file)
            }))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(log_file.map(|file| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file)
            }))
            .init();
    }

    Ok(())
}
