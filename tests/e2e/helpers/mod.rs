use axum::Router;
use indextts_api::controllers::synthesis::SynthesisController;
use indextts_api::domain::synthesis::{SynthesisInvoker, SynthesisService};
use indextts_api::infrastructure::engine::SynthesisEngine;
use indextts_api::infrastructure::fetcher::{AssetFetcher, FetcherSettings};
use indextts_api::infrastructure::http::build_router;
use indextts_api::infrastructure::temp::TempStore;
use indextts_api::infrastructure::transcoder::{FormatNormalizer, Transcoder};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod asset_server;
pub mod fakes;

use api_client::TestClient;
use asset_server::AssetServer;
use fakes::{FakeEngine, FakeTranscoder};

pub struct TestContext {
    pub client: TestClient,
    /// The same router the server runs, for driving requests in-process.
    pub app: Router,
    pub assets: AssetServer,
    pub engine: Arc<FakeEngine>,
    pub transcoder: Arc<FakeTranscoder>,
    temp_dir: TempDir,
}

impl TestContext {
    /// Files currently left in the pipeline's temp directory.
    pub fn leftover_temp_files(&self) -> Vec<String> {
        list_dir(self.temp_dir.path())
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let assets = AssetServer::start().await;
            let engine = Arc::new(FakeEngine::default());
            let transcoder = Arc::new(FakeTranscoder::default());

            let app = create_app(
                TempStore::new(temp_dir.path().to_path_buf()),
                engine.clone(),
                transcoder.clone(),
            );
            let server_app = app.clone();

            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(
                    listener,
                    server_app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .await
                .unwrap();
            });

            Self {
                client: TestClient::new(&base_url),
                app,
                assets,
                engine,
                transcoder,
                temp_dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // TempDir removes itself on drop
        }
    }
}

fn create_app(
    temp: TempStore,
    engine: Arc<dyn SynthesisEngine>,
    transcoder: Arc<dyn Transcoder>,
) -> Router {
    let settings = FetcherSettings {
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(5),
        total_timeout: Duration::from_secs(10),
        ..FetcherSettings::default()
    };
    let fetcher =
        Arc::new(AssetFetcher::new(settings, temp.clone()).expect("Failed to build fetcher"));
    let normalizer = Arc::new(FormatNormalizer::new(transcoder, temp, None));
    let invoker = Arc::new(SynthesisInvoker::new(engine, None));

    let service = Arc::new(SynthesisService::new(fetcher, normalizer.clone(), invoker));
    let controller = Arc::new(SynthesisController::new(service));

    build_router(controller, normalizer)
}

fn list_dir(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
