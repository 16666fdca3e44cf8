//! Upload Handler - 文档上传与文本提取
//!
//! multipart 文件直接进内存构造 InputDescriptor，不落盘

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::{ExtractionDispatcher, InputDescriptor};
use crate::infrastructure::http::dto::{ApiResponse, UploadResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传文档并提取文本
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() == Some("file") {
            filename = field.file_name().map(String::from);
            content_type = field.content_type().map(String::from);
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let media_type = ExtractionDispatcher::resolve_media_type(
        filename.as_deref(),
        content_type.as_deref(),
    )
    .ok_or_else(|| ApiError::BadRequest("Unrecognized file type".to_string()))?;

    let mut input = InputDescriptor::new(bytes, media_type);
    if let Some(name) = filename {
        input = input.with_filename(name);
    }

    let result = state.pipeline.extract(&input).await?;
    if result.is_empty() {
        return Err(ApiError::BadRequest("No text extracted".to_string()));
    }

    let method = state
        .pipeline
        .dispatcher()
        .method_for(media_type)
        .unwrap_or("Unknown");

    Ok(Json(ApiResponse::success(UploadResponse {
        text: result.text,
        media_type: result.media_type.to_string(),
        extraction_method: method.to_string(),
    })))
}
