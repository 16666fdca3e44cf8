//! Language Detector Port - 语言检测抽象

use crate::domain::speech::Language;

/// 检测结果
///
/// 信号不足时 language 为 None、confidence 为 0，检测永不失败
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub language: Option<Language>,
    pub confidence: f64,
}

impl Detection {
    pub fn unknown() -> Self {
        Self {
            language: None,
            confidence: 0.0,
        }
    }

    pub fn new(language: Language, confidence: f64) -> Self {
        Self {
            language: Some(language),
            confidence,
        }
    }
}

/// Language Detector Port
///
/// 对相同输入结果必须确定
pub trait LanguageDetectorPort: Send + Sync {
    /// 检测文本语言
    fn detect(&self, text: &str) -> Detection;
}
