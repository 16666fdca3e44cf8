//! Detection Handler - 语言检测

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{
    ApiResponse, DetectLanguageRequest, DetectLanguageResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 检测文本语言
pub async fn detect_language(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DetectLanguageRequest>,
) -> Result<Json<ApiResponse<DetectLanguageResponse>>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("No text provided".to_string()));
    }

    let detection = state.pipeline.detect(&req.text);

    Ok(Json(ApiResponse::success(DetectLanguageResponse {
        language: detection
            .language
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        confidence: detection.confidence,
    })))
}
