use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::transcoder::FormatNormalizer;

pub const SERVICE_NAME: &str = "IndexTTS API";

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

pub async fn health_ready(State(normalizer): State<Arc<FormatNormalizer>>) -> impl IntoResponse {
    if normalizer.transcoder_available() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "transcoder": "available",
                "engine": "loaded"
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "transcoder": "missing",
                "engine": "loaded"
            })),
        )
    }
}
