//! Audio Handler - 缓存音频下载

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use crate::application::CacheKey;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 按音频引用取回缓存音频
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(audio_ref): Path<String>,
) -> Result<Response, ApiError> {
    let key = CacheKey::from_hex(audio_ref)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let Some((format, data)) = state.pipeline.read_cached_audio(&key).await? else {
        return Err(ApiError::NotFound(format!("audio not cached: {}", key)));
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(e.to_string()))?)
}
