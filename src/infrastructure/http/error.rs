//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ErrorKind, PipelineError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match &self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = errno::NOT_FOUND, error = %msg, "Resource not found");
                (
                    StatusCode::OK,
                    ErrorResponse::new(errno::NOT_FOUND, msg.clone()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = errno::BAD_REQUEST, error = %msg, "Bad request");
                (
                    StatusCode::OK,
                    ErrorResponse::new(errno::BAD_REQUEST, msg.clone()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = errno::INTERNAL_ERROR, error = %msg, "Internal server error");
                (
                    StatusCode::OK,
                    ErrorResponse::new(errno::INTERNAL_ERROR, msg.clone()),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = errno::SERVICE_UNAVAILABLE, error = %msg, "Service unavailable");
                (
                    StatusCode::OK,
                    ErrorResponse::new(errno::SERVICE_UNAVAILABLE, msg.clone()),
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let message = e.to_string();
        match e.kind {
            ErrorKind::UnsupportedFormat(_)
            | ErrorKind::CorruptInput(_)
            | ErrorKind::EmptyInput
            | ErrorKind::InputTooLarge { .. } => ApiError::BadRequest(message),
            ErrorKind::ExtractionEngineUnavailable(_)
            | ErrorKind::SynthesisUnavailable(_)
            | ErrorKind::CacheUnavailable(_) => ApiError::ServiceUnavailable(message),
            ErrorKind::Unknown(_) => ApiError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PipelineStage;

    #[test]
    fn test_rejection_errors_map_to_bad_request() {
        let err: ApiError =
            PipelineError::too_large(PipelineStage::Received, 6000, 5000).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = PipelineError::empty_input(PipelineStage::Extracting).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_synthesis_unavailable_maps_to_service_unavailable() {
        let err: ApiError = PipelineError::new(
            PipelineStage::Synthesizing,
            ErrorKind::SynthesisUnavailable("all backends down".into()),
        )
        .into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_unknown_maps_to_internal() {
        let err: ApiError =
            PipelineError::unknown(PipelineStage::Caching, "unexpected fault").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
