//! Synthesis Handler - 文本合成

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::SynthesizeCommand;
use crate::domain::speech::{Language, SynthesisMode};
use crate::infrastructure::http::dto::{ApiResponse, SynthesizeRequest, SynthesizeResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 合成语音，返回音频引用
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<ApiResponse<SynthesizeResponse>>, ApiError> {
    let mode = SynthesisMode::parse(&req.mode)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let language = if req.language.trim().is_empty() {
        None
    } else {
        Some(Language::new(&req.language).map_err(|e| ApiError::BadRequest(e.to_string()))?)
    };

    let outcome = state
        .pipeline
        .synthesize(SynthesizeCommand {
            text: req.text,
            language,
            mode,
        })
        .await?;

    Ok(Json(ApiResponse::success(SynthesizeResponse {
        audio_ref: outcome.audio_ref,
        cached: outcome.cached,
        backend: outcome.backend,
        language: outcome.language.to_string(),
        degraded: outcome.degraded,
    })))
}
