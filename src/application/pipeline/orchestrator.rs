//! Pipeline Orchestrator - 请求编排
//!
//! 状态机: Received → Extracted → LanguageResolved → KeyComputed →
//! CacheChecked → (命中 → Done) | (未命中 → Synthesizing → Cached → Done) | Failed
//!
//! 编排器只读取提取/检测/合成端口，所有写入经由缓存的原子 get_or_create；
//! 除 §后端重试外任何阶段失败直接转入 Failed 并携带阶段与错误类别

use std::sync::Arc;

use crate::application::error::{ErrorKind, PipelineError, PipelineStage};
use crate::application::extraction::ExtractionDispatcher;
use crate::application::ports::{
    AudioCachePort, AudioProducer, CacheError, CacheKey, Detection, ExtractError,
    ExtractionResult, InputDescriptor, LanguageDetectorPort,
};
use crate::domain::speech::{AudioFormat, Language, SpeechText, SynthesisMode};

use super::selector::BackendSelector;

/// 管线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 合成文本长度上限（字符）
    pub max_text_chars: usize,
    /// 检测置信度不足时的回退语言
    pub default_language: Language,
    /// 采纳检测结果所需的最小置信度
    pub min_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 5000,
            default_language: Language::english(),
            min_confidence: 0.5,
        }
    }
}

/// 合成命令
#[derive(Debug, Clone)]
pub struct SynthesizeCommand {
    pub text: String,
    /// 调用方指定的语言；None 则走检测 + 回退
    pub language: Option<Language>,
    pub mode: SynthesisMode,
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    /// 音频引用（缓存 key 的十六进制摘要）
    pub audio_ref: String,
    /// 是否命中缓存（含等到他人生产的情况）
    pub cached: bool,
    /// 实际产出音频的后端标识
    pub backend: String,
    /// 最终采用的语言
    pub language: Language,
    /// 在线请求被降级到离线
    pub degraded: bool,
    pub format: AudioFormat,
    /// 仅缓存不可用降级时携带音频字节（正常路径音频归缓存独占）
    pub uncached_audio: Option<Vec<u8>>,
}

/// 管线编排器
pub struct SpeechPipeline {
    dispatcher: Arc<ExtractionDispatcher>,
    detector: Arc<dyn LanguageDetectorPort>,
    cache: Arc<dyn AudioCachePort>,
    selector: Arc<BackendSelector>,
    config: PipelineConfig,
}

impl SpeechPipeline {
    pub fn new(
        dispatcher: Arc<ExtractionDispatcher>,
        detector: Arc<dyn LanguageDetectorPort>,
        cache: Arc<dyn AudioCachePort>,
        selector: Arc<BackendSelector>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            dispatcher,
            detector,
            cache,
            selector,
            config,
        }
    }

    pub fn dispatcher(&self) -> &ExtractionDispatcher {
        &self.dispatcher
    }

    /// Extract 操作: InputDescriptor -> ExtractionResult
    ///
    /// 空文本是合法结果，由合成阶段以 EmptyInput 拒绝
    pub async fn extract(
        &self,
        input: &InputDescriptor,
    ) -> Result<ExtractionResult, PipelineError> {
        self.dispatcher
            .dispatch(input)
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Extracting, map_extract_error(e)))
    }

    /// DetectLanguage 操作: text -> (languageTag, confidence)
    pub fn detect(&self, text: &str) -> Detection {
        self.detector.detect(text)
    }

    /// Synthesize 操作: (text, language?, mode) -> 音频引用
    pub async fn synthesize(
        &self,
        command: SynthesizeCommand,
    ) -> Result<SynthesisOutcome, PipelineError> {
        // Received: 长度与空文本校验，归一化
        let text = SpeechText::new(&command.text, self.config.max_text_chars)
            .map_err(|e| PipelineError::from_text_error(PipelineStage::Received, e))?;

        // LanguageResolved
        let language = self.resolve_language(&text, command.language);

        // KeyComputed: key 绑定该模式的首选后端标识
        let primary = self.selector.primary_identity(command.mode).to_string();
        let key = CacheKey::compute(&text, &language, command.mode, &primary);

        let request_id = uuid::Uuid::new_v4();
        tracing::debug!(
            request_id = %request_id,
            key = %key,
            language = %language,
            mode = %command.mode,
            chars = text.char_count(),
            "Synthesis request resolved"
        );

        // CacheChecked → Synthesizing → Cached，全部经由原子 get_or_create
        let producer = self.make_producer(&text, &language, command.mode);

        match self.cache.get_or_create(&key, producer).await {
            Ok(outcome) => {
                let cached = outcome.was_hit();
                let entry = outcome.into_entry();
                // 降级判定: 条目由非首选后端产出
                let degraded = entry.backend != primary;
                Ok(SynthesisOutcome {
                    audio_ref: key.to_string(),
                    cached,
                    backend: entry.backend,
                    language,
                    degraded,
                    format: entry.format,
                    uncached_audio: None,
                })
            }
            Err(CacheError::ProducerFailed(err)) => {
                tracing::error!(key = %key, error = %err, "All synthesis paths exhausted");
                Err(PipelineError::new(
                    PipelineStage::Synthesizing,
                    ErrorKind::SynthesisUnavailable(err.to_string()),
                ))
            }
            // 缓存故障按策略降级: 直接合成并返回未缓存产物，不让整个请求失败
            Err(cache_err) => {
                tracing::warn!(
                    key = %key,
                    error = %cache_err,
                    "Cache unavailable, serving uncached synthesis"
                );
                let selection = self
                    .selector
                    .synthesize(text.as_str(), &language, command.mode)
                    .await
                    .map_err(|e| {
                        PipelineError::new(
                            PipelineStage::Synthesizing,
                            ErrorKind::SynthesisUnavailable(e.to_string()),
                        )
                    })?;
                Ok(SynthesisOutcome {
                    audio_ref: key.to_string(),
                    cached: false,
                    backend: selection.audio.backend.clone(),
                    language,
                    degraded: selection.degraded,
                    format: selection.audio.format,
                    uncached_audio: Some(selection.audio.data),
                })
            }
        }
    }

    /// 整文档操作: 上传字节 → 提取 → 语言解析 → 合成
    pub async fn process(
        &self,
        input: &InputDescriptor,
        language: Option<Language>,
        mode: SynthesisMode,
    ) -> Result<SynthesisOutcome, PipelineError> {
        let extraction = self.extract(input).await?;
        if extraction.is_empty() {
            return Err(PipelineError::empty_input(PipelineStage::Extracting));
        }
        self.synthesize(SynthesizeCommand {
            text: extraction.text,
            language,
            mode,
        })
        .await
    }

    /// 读取缓存音频（供下载接口使用）
    pub async fn read_cached_audio(
        &self,
        key: &CacheKey,
    ) -> Result<Option<(AudioFormat, Vec<u8>)>, PipelineError> {
        let entry = self.cache.lookup(key).await.map_err(cache_to_pipeline)?;
        let Some(entry) = entry else {
            return Ok(None);
        };
        let audio = self.cache.read_audio(key).await.map_err(cache_to_pipeline)?;
        Ok(audio.map(|data| (entry.format, data)))
    }

    /// 检测失败永不致命: 置信度不足回退到调用方指定语言或系统默认
    fn resolve_language(&self, text: &SpeechText, supplied: Option<Language>) -> Language {
        if let Some(lang) = supplied {
            return lang;
        }

        let detection = self.detector.detect(text.as_str());
        match detection.language {
            Some(lang) if detection.confidence >= self.config.min_confidence => {
                tracing::debug!(
                    language = %lang,
                    confidence = detection.confidence,
                    "Language detected"
                );
                lang
            }
            _ => {
                tracing::debug!(
                    confidence = detection.confidence,
                    fallback = %self.config.default_language,
                    "Language undetected, using default"
                );
                self.config.default_language.clone()
            }
        }
    }

    /// 构造 'static 生产者: 在独立任务中运行，等待者断开不影响共享生产
    fn make_producer(
        &self,
        text: &SpeechText,
        language: &Language,
        mode: SynthesisMode,
    ) -> AudioProducer {
        let selector = self.selector.clone();
        let text = text.as_str().to_string();
        let language = language.clone();
        Box::pin(async move {
            selector
                .synthesize(&text, &language, mode)
                .await
                .map(|selection| selection.audio)
        })
    }
}

fn map_extract_error(err: ExtractError) -> ErrorKind {
    match err {
        ExtractError::UnsupportedFormat(msg) => ErrorKind::UnsupportedFormat(msg),
        ExtractError::CorruptInput(msg) => ErrorKind::CorruptInput(msg),
        ExtractError::EngineUnavailable(msg) => ErrorKind::ExtractionEngineUnavailable(msg),
    }
}

fn cache_to_pipeline(err: CacheError) -> PipelineError {
    PipelineError::new(
        PipelineStage::CheckingCache,
        ErrorKind::CacheUnavailable(err.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::application::extraction::ExtractionDispatcher;
    use crate::application::pipeline::selector::{BackendSelector, RetryConfig};
    use crate::application::ports::{
        AudioCachePort, CacheEntry, CacheOutcome, CacheStats, EvictionPolicy, EvictionReport,
        ExtractorPort,
    };
    use crate::domain::speech::MediaType;
    use crate::infrastructure::adapters::tts::FakeSpeechClient;
    use crate::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};

    /// 固定返回检测结果的检测器
    struct FixedDetector {
        detection: Detection,
    }

    impl LanguageDetectorPort for FixedDetector {
        fn detect(&self, _text: &str) -> Detection {
            self.detection.clone()
        }
    }

    fn sled_cache(dir: &std::path::Path) -> Arc<SledAudioCache> {
        let config = SledCacheConfig {
            db_path: dir.join("cache.sled").to_string_lossy().to_string(),
            max_size_bytes: 64 * 1024 * 1024,
        };
        Arc::new(SledAudioCache::new(&config).unwrap())
    }

    struct TestRig {
        pipeline: Arc<SpeechPipeline>,
        online: Arc<FakeSpeechClient>,
        offline: Arc<FakeSpeechClient>,
        _dir: tempfile::TempDir,
    }

    fn rig_with(
        online: Arc<FakeSpeechClient>,
        offline: Arc<FakeSpeechClient>,
        detection: Detection,
        config: PipelineConfig,
    ) -> TestRig {
        let dir = tempfile::tempdir().unwrap();
        let cache = sled_cache(dir.path());
        let selector = Arc::new(BackendSelector::new(
            online.clone(),
            offline.clone(),
            RetryConfig {
                max_retries: 1,
                backoff_ms: 0,
            },
        ));
        let dispatcher = Arc::new(
            ExtractionDispatcher::new()
                .register(MediaType::PlainText, Arc::new(EchoExtractor)),
        );
        let detector = Arc::new(FixedDetector { detection });
        let pipeline = Arc::new(SpeechPipeline::new(
            dispatcher,
            detector,
            cache,
            selector,
            config,
        ));
        TestRig {
            pipeline,
            online,
            offline,
            _dir: dir,
        }
    }

    fn rig() -> TestRig {
        rig_with(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::new(Language::english(), 0.9),
            PipelineConfig::default(),
        )
    }

    struct EchoExtractor;

    #[async_trait]
    impl ExtractorPort for EchoExtractor {
        async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
            Ok(String::from_utf8_lossy(bytes).to_string())
        }

        fn method(&self) -> &'static str {
            "echo"
        }
    }

    fn online_command(text: &str) -> SynthesizeCommand {
        SynthesizeCommand {
            text: text.to_string(),
            language: None,
            mode: SynthesisMode::Online,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_miss_then_hit() {
        let rig = rig();

        let first = rig
            .pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap();
        assert!(!first.cached);
        assert_eq!(first.backend, "online");
        assert_eq!(first.language, Language::english());
        assert!(!first.degraded);

        let second = rig
            .pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.audio_ref, first.audio_ref);

        // 幂等: 第二次调用不触发后端
        assert_eq!(rig.online.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_synthesize_once() {
        let rig = rig();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pipeline = rig.pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline.synthesize(online_command("Hello world")).await
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(rig.online.call_count(), 1);
        let first_ref = &outcomes[0].audio_ref;
        assert!(outcomes.iter().all(|o| &o.audio_ref == first_ref));
        // 只有实际触发生产的那次调用报告未命中
        assert_eq!(outcomes.iter().filter(|o| !o.cached).count(), 1);

        // 所有等待者都能读到完整产物
        let key = CacheKey::from_hex(first_ref.clone()).unwrap();
        let audio = rig.pipeline.read_cached_audio(&key).await.unwrap();
        assert!(audio.is_some());
    }

    #[tokio::test]
    async fn test_online_failure_degrades_to_offline() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::failing("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::new(Language::english(), 0.9),
            PipelineConfig::default(),
        );

        let outcome = rig
            .pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.backend, "offline");
        assert!(!outcome.cached);
        assert_eq!(rig.offline.call_count(), 1);

        // 降级产物缓存于请求身份之下，重复请求命中且仍报告降级
        let again = rig
            .pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap();
        assert!(again.cached);
        assert!(again.degraded);
        assert_eq!(again.backend, "offline");
        assert_eq!(rig.offline.call_count(), 1);
    }

    #[tokio::test]
    async fn test_both_backends_failing_is_synthesis_unavailable() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::failing("online")),
            Arc::new(FakeSpeechClient::failing("offline")),
            Detection::new(Language::english(), 0.9),
            PipelineConfig::default(),
        );

        let err = rig
            .pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Synthesizing);
        assert!(matches!(err.kind, ErrorKind::SynthesisUnavailable(_)));
    }

    #[tokio::test]
    async fn test_oversized_text_rejected_before_backend() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::new(Language::english(), 0.9),
            PipelineConfig {
                max_text_chars: 10,
                ..PipelineConfig::default()
            },
        );

        let err = rig
            .pipeline
            .synthesize(online_command("this text is longer than ten characters"))
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Received);
        assert!(matches!(err.kind, ErrorKind::InputTooLarge { .. }));
        assert_eq!(rig.online.call_count(), 0);
        assert_eq!(rig.offline.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let rig = rig();

        let err = rig
            .pipeline
            .synthesize(online_command("   \n  "))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::EmptyInput));
        assert_eq!(rig.online.call_count(), 0);
    }

    #[tokio::test]
    async fn test_undetected_language_uses_default() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::unknown(),
            PipelineConfig::default(),
        );

        let outcome = rig
            .pipeline
            .synthesize(online_command("???!!!"))
            .await
            .unwrap();

        assert_eq!(outcome.language, Language::english());
    }

    #[tokio::test]
    async fn test_low_confidence_detection_uses_default() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::new(Language::urdu(), 0.2),
            PipelineConfig::default(),
        );

        let outcome = rig
            .pipeline
            .synthesize(online_command("some text"))
            .await
            .unwrap();

        assert_eq!(outcome.language, Language::english());
    }

    #[tokio::test]
    async fn test_supplied_language_skips_detection() {
        let rig = rig_with(
            Arc::new(FakeSpeechClient::new("online")),
            Arc::new(FakeSpeechClient::new("offline")),
            Detection::new(Language::english(), 0.9),
            PipelineConfig::default(),
        );

        let outcome = rig
            .pipeline
            .synthesize(SynthesizeCommand {
                text: "کچھ متن".to_string(),
                language: Some(Language::urdu()),
                mode: SynthesisMode::Online,
            })
            .await
            .unwrap();

        assert_eq!(outcome.language, Language::urdu());
    }

    #[tokio::test]
    async fn test_process_document_end_to_end() {
        let rig = rig();
        let input = InputDescriptor::new(b"A short document.".to_vec(), MediaType::PlainText)
            .with_filename("doc.txt");

        let outcome = rig
            .pipeline
            .process(&input, None, SynthesisMode::Online)
            .await
            .unwrap();

        assert!(!outcome.cached);
        assert_eq!(outcome.backend, "online");
    }

    #[tokio::test]
    async fn test_process_empty_document_rejected() {
        let rig = rig();
        let input = InputDescriptor::new(b"   ".to_vec(), MediaType::PlainText);

        let err = rig
            .pipeline
            .process(&input, None, SynthesisMode::Online)
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::Extracting);
        assert!(matches!(err.kind, ErrorKind::EmptyInput));
    }

    #[tokio::test]
    async fn test_process_unsupported_format() {
        let rig = rig();
        let input = InputDescriptor::new(vec![0xFF], MediaType::Pdf);

        let err = rig
            .pipeline
            .process(&input, None, SynthesisMode::Online)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::UnsupportedFormat(_)));
    }

    /// 始终不可用的缓存，用于验证降级路径
    struct BrokenCache;

    #[async_trait]
    impl AudioCachePort for BrokenCache {
        async fn lookup(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        async fn read_audio(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        async fn get_or_create(
            &self,
            _key: &CacheKey,
            _producer: AudioProducer,
        ) -> Result<CacheOutcome, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        async fn evict(&self, _policy: &EvictionPolicy) -> Result<EvictionReport, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        async fn purge(&self, _key: &CacheKey) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    #[tokio::test]
    async fn test_cache_unavailable_degrades_to_uncached() {
        let online = Arc::new(FakeSpeechClient::new("online"));
        let offline = Arc::new(FakeSpeechClient::new("offline"));
        let selector = Arc::new(BackendSelector::new(
            online.clone(),
            offline,
            RetryConfig::default(),
        ));
        let dispatcher = Arc::new(ExtractionDispatcher::new());
        let detector = Arc::new(FixedDetector {
            detection: Detection::new(Language::english(), 0.9),
        });
        let pipeline = SpeechPipeline::new(
            dispatcher,
            detector,
            Arc::new(BrokenCache),
            selector,
            PipelineConfig::default(),
        );

        let outcome = pipeline
            .synthesize(online_command("Hello world"))
            .await
            .unwrap();

        assert!(!outcome.cached);
        assert_eq!(outcome.backend, "online");
        assert!(outcome.uncached_audio.is_some());
        assert_eq!(online.call_count(), 1);
    }
}
