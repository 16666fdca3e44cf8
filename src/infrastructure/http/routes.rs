//! HTTP Routes
//!
//! API Endpoints:
//! - /health                    GET   存活检查
//! - /api/upload                POST  上传文档，提取文本
//! - /api/detect-language       POST  检测文本语言
//! - /api/tts                   POST  合成语音，返回音频引用
//! - /api/audio/{audio_ref}     GET   取回缓存音频

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/detect-language", post(handlers::detect_language))
        .route("/tts", post(handlers::synthesize))
        .route("/audio/:audio_ref", get(handlers::get_audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::application::{
        BackendSelector, ExtractionDispatcher, PipelineConfig, RetryConfig, SpeechPipeline,
    };
    use crate::domain::speech::MediaType;
    use crate::infrastructure::adapters::extract::PlainTextExtractor;
    use crate::infrastructure::adapters::tts::FakeSpeechClient;
    use crate::infrastructure::adapters::WhatlangDetector;
    use crate::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};

    fn test_router(dir: &std::path::Path) -> Router {
        let cache = Arc::new(
            SledAudioCache::new(&SledCacheConfig {
                db_path: dir.join("http.sled").to_string_lossy().to_string(),
                max_size_bytes: 1024 * 1024,
            })
            .unwrap(),
        );
        let selector = Arc::new(BackendSelector::new(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            RetryConfig {
                max_retries: 0,
                backoff_ms: 0,
            },
        ));
        let dispatcher = Arc::new(
            ExtractionDispatcher::new()
                .register(MediaType::PlainText, Arc::new(PlainTextExtractor::new())),
        );
        let pipeline = Arc::new(SpeechPipeline::new(
            dispatcher,
            Arc::new(WhatlangDetector::new()),
            cache,
            selector,
            PipelineConfig::default(),
        ));

        create_routes().with_state(Arc::new(AppState::new(pipeline)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_tts_miss_then_hit_and_audio_download() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let request = r#"{"text": "Hello world", "language": "en", "mode": "online"}"#;

        let first = body_json(
            router
                .clone()
                .oneshot(json_request("/api/tts", request))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(first["errno"], 0);
        assert_eq!(first["data"]["cached"], false);
        assert_eq!(first["data"]["backend"], "online");
        assert_eq!(first["data"]["language"], "en");

        let second = body_json(
            router
                .clone()
                .oneshot(json_request("/api/tts", request))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(second["data"]["cached"], true);
        assert_eq!(second["data"]["audio_ref"], first["data"]["audio_ref"]);

        // 经音频引用取回缓存音频
        let audio_ref = first["data"]["audio_ref"].as_str().unwrap();
        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/audio/{}", audio_ref))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "audio/wav"
        );
    }

    #[tokio::test]
    async fn test_tts_rejects_bad_mode() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let body = body_json(
            router
                .oneshot(json_request(
                    "/api/tts",
                    r#"{"text": "hi", "mode": "stream"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_detect_language_rejects_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let body = body_json(
            router
                .oneshot(json_request("/api/detect-language", r#"{"text": "  "}"#))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_audio_with_invalid_ref_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let body = body_json(
            router
                .oneshot(
                    Request::builder()
                        .uri("/api/audio/not-a-digest")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_audio_miss_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let body = body_json(
            router
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/audio/{}", "a".repeat(32)))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["errno"], 404);
    }
}
