//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod extractor;
mod language_detector;
mod speech_backend;

pub use audio_cache::{
    AudioCachePort, AudioProducer, CacheEntry, CacheError, CacheKey, CacheOutcome, CacheStats,
    EvictionPolicy, EvictionReport,
};
pub use extractor::{ExtractError, ExtractionResult, ExtractorPort, InputDescriptor};
pub use language_detector::{Detection, LanguageDetectorPort};
pub use speech_backend::{ProducedAudio, SpeechBackendPort, SynthesisError};
