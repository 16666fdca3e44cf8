//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Extractor、LanguageDetector、AudioCache、SpeechBackend）
//! - extraction: 提取策略分发器
//! - pipeline: 后端选择器与管线编排器
//! - error: 管线错误定义（阶段 + 类别）

pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod ports;

pub use error::{ErrorKind, PipelineError, PipelineStage};
pub use extraction::ExtractionDispatcher;
pub use pipeline::{
    BackendSelector, PipelineConfig, RetryConfig, SpeechPipeline, SynthesisOutcome,
    SynthesizeCommand,
};
pub use ports::{
    AudioCachePort, AudioProducer, CacheEntry, CacheError, CacheKey, CacheOutcome, CacheStats,
    Detection, EvictionPolicy, EvictionReport, ExtractError, ExtractionResult, ExtractorPort,
    InputDescriptor, LanguageDetectorPort, ProducedAudio, SpeechBackendPort, SynthesisError,
};
