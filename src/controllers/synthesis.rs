use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    domain::synthesis::{
        Phase, RequestContext, SynthesisRequest, SynthesisServiceApi, SynthesizeBody,
    },
    error::{AppError, AppResult},
    infrastructure::http::RequestId,
};

pub const X_SAMPLING_RATE: &str = "x-sampling-rate";

/// `error_kind` logged for bodies axum could not deserialize.
pub const MALFORMED_BODY: &str = "MalformedBody";

pub struct SynthesisController {
    synthesis_service: Arc<dyn SynthesisServiceApi>,
}

impl SynthesisController {
    pub fn new(synthesis_service: Arc<dyn SynthesisServiceApi>) -> Self {
        Self { synthesis_service }
    }

    /// POST /synthesize - Clone the reference voice and speak `text`
    pub async fn synthesize(
        State(controller): State<Arc<SynthesisController>>,
        Extension(request_id): Extension<RequestId>,
        payload: Result<Json<SynthesizeBody>, JsonRejection>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let mut ctx = RequestContext::new(request_id.0);

        let Json(body) = match payload {
            Ok(body) => body,
            Err(rejection) => {
                tracing::warn!(
                    correlation_id = %ctx.correlation_id(),
                    error = %rejection.body_text(),
                    "Malformed synthesis request"
                );
                log_summary(&ctx, None, Some(MALFORMED_BODY));
                return Err(AppError::from(rejection));
            }
        };

        let request = match body.validate() {
            Ok(request) => request,
            Err(e) => {
                let err = ctx.fail(e);
                log_summary(&ctx, None, Some(err.kind()));
                return Err(err.into());
            }
        };

        let audio = match controller
            .synthesis_service
            .synthesize(&mut ctx, &request)
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                log_summary(&ctx, Some(&request), Some(e.kind()));
                return Err(e.into());
            }
        };

        ctx.advance(Phase::Streaming);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
        headers.insert(X_SAMPLING_RATE, HeaderValue::from(audio.sample_rate));
        let disposition = format!(
            "attachment; filename=tts_output_{}.wav",
            ctx.correlation_id()
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        );

        let wav_bytes = audio.wav.len();
        let body = Body::from(audio.wav);

        ctx.advance(Phase::Completed);
        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            wav_bytes,
            sample_rate = audio.sample_rate,
            "Synthesis request completed"
        );
        log_summary(&ctx, Some(&request), None);

        Ok((StatusCode::OK, headers, body))
    }
}

/// One line per request with everything needed to audit it afterwards.
fn log_summary(
    ctx: &RequestContext,
    request: Option<&SynthesisRequest>,
    error_kind: Option<&str>,
) {
    let phases = ctx
        .phase_durations()
        .iter()
        .map(|(phase, spent)| format!("{}={}ms", phase, spent.as_millis()))
        .collect::<Vec<_>>()
        .join(",");

    match error_kind {
        None => tracing::info!(
            correlation_id = %ctx.correlation_id(),
            received_at = %ctx.received_at().to_rfc3339(),
            text_length = request.map(|r| r.text.chars().count()).unwrap_or(0),
            inference_mode = %request.map(|r| r.inference_mode.to_string()).unwrap_or_default(),
            reference_audio_url = %request.map(|r| r.reference_audio_url.as_str()).unwrap_or("-"),
            total_ms = ctx.elapsed().as_millis() as u64,
            phases = %phases,
            success = true,
            "Synthesis summary"
        ),
        Some(kind) => tracing::error!(
            correlation_id = %ctx.correlation_id(),
            received_at = %ctx.received_at().to_rfc3339(),
            text_length = request.map(|r| r.text.chars().count()).unwrap_or(0),
            inference_mode = %request.map(|r| r.inference_mode.to_string()).unwrap_or_default(),
            reference_audio_url = %request.map(|r| r.reference_audio_url.as_str()).unwrap_or("-"),
            total_ms = ctx.elapsed().as_millis() as u64,
            phases = %phases,
            success = false,
            failed_phase = %ctx.phase(),
            error_kind = kind,
            "Synthesis summary"
        ),
    }
}
