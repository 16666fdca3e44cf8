//! Health Handler

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// 存活检查
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
