//! Speech Backend Port - 合成后端抽象
//!
//! 在线（联网、高音质）与离线（本地、保底）两个变体实现同一能力

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::speech::{AudioFormat, Language};

/// 合成错误
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Quota exceeded")]
    QuotaExceeded,

    #[error("Remote service error: {0}")]
    Service(String),

    #[error("No voice for language: {0}")]
    VoiceUnavailable(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SynthesisError {
    /// 是否为瞬时故障（值得重试/回退）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network(_) | Self::QuotaExceeded | Self::Service(_)
        )
    }
}

/// 合成产物
#[derive(Debug, Clone)]
pub struct ProducedAudio {
    /// 音频字节
    pub data: Vec<u8>,
    /// 音频格式
    pub format: AudioFormat,
    /// 实际执行合成的后端标识
    pub backend: String,
}

/// Speech Backend Port
#[async_trait]
pub trait SpeechBackendPort: Send + Sync {
    /// 合成语音
    async fn synthesize(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError>;

    /// 该后端是否有此语言的音色
    fn supports_language(&self, language: &Language) -> bool;

    /// 后端标识（参与缓存 key，变更即失效旧缓存）
    fn identity(&self) -> &str;

    /// 检查后端是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
