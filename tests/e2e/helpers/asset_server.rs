use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Body the fake transcoder refuses to convert.
pub const BROKEN_MARKER: &[u8] = b"BROKEN";

/// Local HTTP server standing in for wherever reference audio is hosted.
pub struct AssetServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

impl AssetServer {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/voice.mp3", get(voice))
            .route("/broken.mp3", get(broken))
            .route("/tiny", get(tiny))
            .route("/missing", get(missing))
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind asset server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn voice(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "audio/mpeg")], vec![7u8; 256])
}

async fn broken(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let mut body = BROKEN_MARKER.to_vec();
    body.extend_from_slice(&[0u8; 64]);
    ([(header::CONTENT_TYPE, "audio/mpeg")], body)
}

async fn tiny(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "audio/wav")], vec![1u8; 5])
}

async fn missing(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}
