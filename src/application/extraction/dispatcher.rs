//! Extraction Dispatcher - 提取策略分发
//!
//! 按媒体类型查表分发到具体提取策略，输出统一为纯文本

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{ExtractError, ExtractionResult, ExtractorPort, InputDescriptor};
use crate::domain::speech::MediaType;

/// 提取分发器
///
/// 显式查找表: MediaType -> 策略。封闭集合，不做运行时类型探测
pub struct ExtractionDispatcher {
    strategies: HashMap<MediaType, Arc<dyn ExtractorPort>>,
}

impl ExtractionDispatcher {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// 注册一个提取策略
    pub fn register(mut self, media_type: MediaType, extractor: Arc<dyn ExtractorPort>) -> Self {
        self.strategies.insert(media_type, extractor);
        self
    }

    /// 已注册的媒体类型
    pub fn supported_types(&self) -> Vec<MediaType> {
        self.strategies.keys().copied().collect()
    }

    /// 某媒体类型的提取方式描述
    pub fn method_for(&self, media_type: MediaType) -> Option<&'static str> {
        self.strategies.get(&media_type).map(|s| s.method())
    }

    /// 从文件名或 Content-Type 解析声明的媒体类型
    pub fn resolve_media_type(
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Option<MediaType> {
        if let Some(name) = filename {
            if let Some(ext) = name.rsplit('.').next().filter(|e| *e != name) {
                if let Some(mt) = MediaType::from_extension(ext) {
                    return Some(mt);
                }
            }
        }
        content_type.and_then(MediaType::from_mime)
    }

    /// 分发提取
    ///
    /// 无副作用的纯转换；空文本是合法结果，由下游拒绝
    pub async fn dispatch(
        &self,
        input: &InputDescriptor,
    ) -> Result<ExtractionResult, ExtractError> {
        let strategy = self.strategies.get(&input.media_type).ok_or_else(|| {
            ExtractError::UnsupportedFormat(input.media_type.to_string())
        })?;

        if !strategy.is_available() {
            return Err(ExtractError::EngineUnavailable(format!(
                "no engine for {}",
                input.media_type
            )));
        }

        tracing::debug!(
            media_type = %input.media_type,
            filename = ?input.filename,
            size = input.bytes.len(),
            method = strategy.method(),
            "Dispatching extraction"
        );

        let text = strategy.extract(&input.bytes).await?;

        Ok(ExtractionResult {
            media_type: input.media_type,
            text: text.trim().to_string(),
        })
    }
}

impl Default for ExtractionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
