//! Extractor Port - 文本提取抽象
//!
//! 每种媒体类型一个提取策略，具体实现在 infrastructure/adapters/extract 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::speech::MediaType;

/// 提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt input: {0}")]
    CorruptInput(String),

    #[error("Extraction engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// 输入描述符
///
/// 由上传处理器构造，构造后不可变
#[derive(Debug, Clone)]
pub struct InputDescriptor {
    /// 原始字节
    pub bytes: Vec<u8>,
    /// 声明的媒体类型
    pub media_type: MediaType,
    /// 原始文件名（可选，仅用于日志）
    pub filename: Option<String>,
}

impl InputDescriptor {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self {
            bytes,
            media_type,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// 提取结果
///
/// 提取成功但文本为空是合法结果，由下游以 EmptyInput 拒绝；
/// 失败路径通过 ExtractError 表达
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// 来源媒体类型
    pub media_type: MediaType,
    /// 提取出的纯文本（可能为空）
    pub text: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extractor Port
///
/// 单一能力: bytes -> text。纯转换，不触碰任何共享存储
#[async_trait]
pub trait ExtractorPort: Send + Sync {
    /// 从原始字节提取纯文本
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;

    /// 引擎是否可用（外部程序未安装时返回 false）
    fn is_available(&self) -> bool {
        true
    }

    /// 提取方式的人类可读描述
    fn method(&self) -> &'static str;
}
