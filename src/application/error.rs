//! 应用层错误定义
//!
//! 管线错误 = 失败阶段 + 错误类别，所有失败路径可枚举

use thiserror::Error;

use crate::domain::speech::SpeechTextError;

/// 管线阶段
///
/// 请求状态机: Received → Extracted → LanguageResolved → KeyComputed →
/// CacheChecked → (命中 → Done) | (未命中 → Synthesizing → Cached → Done) | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Extracting,
    ResolvingLanguage,
    ComputingKey,
    CheckingCache,
    Synthesizing,
    Caching,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Extracting => "extracting",
            Self::ResolvingLanguage => "resolving_language",
            Self::ComputingKey => "computing_key",
            Self::CheckingCache => "checking_cache",
            Self::Synthesizing => "synthesizing",
            Self::Caching => "caching",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 错误类别
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// 不支持的输入格式
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 输入损坏，无法解析
    #[error("Corrupt input: {0}")]
    CorruptInput(String),

    /// 提取引擎不可用（未安装外部程序等）
    #[error("Extraction engine unavailable: {0}")]
    ExtractionEngineUnavailable(String),

    /// 提取结果为空
    #[error("Empty input: nothing to synthesize")]
    EmptyInput,

    /// 文本超出长度上限
    #[error("Input too large: {len} chars, maximum {max}")]
    InputTooLarge { len: usize, max: usize },

    /// 所有合成路径均已失败
    #[error("Synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// 缓存存储不可用
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// 未预期的内部故障
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 管线错误
///
/// 携带起源阶段，保证内部故障不会脱离上下文向外传播
#[derive(Debug, Clone, Error)]
#[error("pipeline failed at {stage}: {kind}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, kind: ErrorKind) -> Self {
        Self { stage, kind }
    }

    pub fn empty_input(stage: PipelineStage) -> Self {
        Self::new(stage, ErrorKind::EmptyInput)
    }

    pub fn too_large(stage: PipelineStage, len: usize, max: usize) -> Self {
        Self::new(stage, ErrorKind::InputTooLarge { len, max })
    }

    pub fn unknown(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::new(stage, ErrorKind::Unknown(message.into()))
    }

    pub fn from_text_error(stage: PipelineStage, err: SpeechTextError) -> Self {
        match err {
            SpeechTextError::Empty => Self::empty_input(stage),
            SpeechTextError::TooLong { len, max } => Self::too_large(stage, len, max),
        }
    }
}
