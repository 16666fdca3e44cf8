//! Lector - 文档转语音服务
//!
//! 输入（文本/文档/图片）→ 提取 → 语言检测 → 合成（在线/离线回退）
//! → 内容寻址音频缓存

use std::sync::Arc;

use lector::application::{
    BackendSelector, EvictionPolicy, ExtractionDispatcher, PipelineConfig, RetryConfig,
    SpeechPipeline,
};
use lector::config::{load_config, print_config};
use lector::domain::speech::{Language, MediaType};
use lector::infrastructure::adapters::{
    DocxExtractor, EspeakClientConfig, EspeakSpeechClient, HttpSpeechClient,
    HttpSpeechClientConfig, PdftotextConfig, PdftotextExtractor, PlainTextExtractor,
    PptxExtractor, TesseractConfig, TesseractOcrExtractor, WhatlangDetector,
};
use lector::infrastructure::http::{AppState, HttpServer, ServerConfig};
use lector::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};
use lector::infrastructure::{CacheGcConfig, CacheGcWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},lector={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Lector - 文档转语音服务");
    print_config(&config);

    // 确保缓存目录存在
    if let Some(parent) = std::path::Path::new(&config.cache.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 提取策略表（外部引擎缺失时对应类型降级为不可用）
    let dispatcher = Arc::new(
        ExtractionDispatcher::new()
            .register(MediaType::PlainText, Arc::new(PlainTextExtractor::new()))
            .register(
                MediaType::Pdf,
                Arc::new(PdftotextExtractor::new(PdftotextConfig::default())),
            )
            .register(MediaType::Word, Arc::new(DocxExtractor::new()))
            .register(MediaType::Presentation, Arc::new(PptxExtractor::new()))
            .register(
                MediaType::Image,
                Arc::new(TesseractOcrExtractor::new(TesseractConfig::default())),
            ),
    );

    // 语言检测器
    let detector = Arc::new(WhatlangDetector::new());

    // Sled 音频缓存
    let cache = Arc::new(SledAudioCache::new(&SledCacheConfig {
        db_path: config.cache.path.clone(),
        max_size_bytes: config.cache.max_size_bytes,
    })?);

    // 在线合成后端
    let online = Arc::new(HttpSpeechClient::new(HttpSpeechClientConfig {
        base_url: config.synthesis.online.url.clone(),
        timeout_secs: config.synthesis.online.timeout_secs,
        identity: "online".to_string(),
    })?);

    // 离线合成后端 (espeak-ng)
    let offline = Arc::new(EspeakSpeechClient::new(EspeakClientConfig {
        executable: config.synthesis.offline.executable.clone(),
        voices: config.synthesis.offline.voices.clone(),
        speed_wpm: config.synthesis.offline.speed_wpm,
        identity: "offline".to_string(),
    }));

    // 后端选择器（在线重试 + 离线回退）
    let selector = Arc::new(BackendSelector::new(
        online,
        offline,
        RetryConfig {
            max_retries: config.synthesis.online.max_retries,
            backoff_ms: config.synthesis.online.backoff_ms,
        },
    ));

    // 默认回退语言
    let default_language = Language::new(&config.detection.default_language)
        .unwrap_or_else(|_| Language::english());

    // 管线编排器
    let pipeline = Arc::new(SpeechPipeline::new(
        dispatcher,
        detector,
        cache.clone(),
        selector,
        PipelineConfig {
            max_text_chars: config.synthesis.max_text_chars,
            default_language,
            min_confidence: config.detection.min_confidence,
        },
    ));

    // 缓存淘汰定时任务
    if config.cache.gc_enabled {
        let gc_worker = CacheGcWorker::new(
            CacheGcConfig {
                interval_secs: config.cache.gc_interval_secs,
                policy: EvictionPolicy {
                    max_age_secs: config.cache.max_age_secs,
                    max_total_bytes: config.cache.max_size_bytes,
                },
            },
            cache.clone(),
        );
        tokio::spawn(gc_worker.run());
    }

    // HTTP 服务器
    let server_config = ServerConfig::new(
        &config.server.host,
        config.server.port,
        config.server.max_upload_bytes,
    );
    let state = AppState::new(pipeline);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
