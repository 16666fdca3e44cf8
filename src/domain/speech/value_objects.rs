//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

/// 语言标签
///
/// 不变量:
/// - 非空，1-8 个 ASCII 字母
/// - 统一小写存储
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Result<Self, &'static str> {
        let tag = tag.into().trim().to_lowercase();
        if tag.is_empty() {
            return Err("语言标签不能为空");
        }
        if tag.len() > 8 || !tag.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err("无效的语言标签");
        }
        Ok(Self(tag))
    }

    /// 系统默认语言（英语）
    pub fn english() -> Self {
        Self("en".to_string())
    }

    pub fn urdu() -> Self {
        Self("ur".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 合成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// 在线合成（联网，高音质）
    Online,
    /// 离线合成（本地，无需网络）
    Offline,
}

impl SynthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Result<Self, &'static str> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err("合成模式只能是 online 或 offline"),
        }
    }
}

impl std::fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 输入媒体类型
///
/// 提取策略按此封闭集合分发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    PlainText,
    Pdf,
    /// Word 文档 (.docx)
    Word,
    /// 演示文稿 (.pptx)
    Presentation,
    /// 图片（走 OCR）
    Image,
}

impl MediaType {
    /// 根据文件扩展名识别媒体类型
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" | "md" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Word),
            "pptx" => Some(Self::Presentation),
            "jpg" | "jpeg" | "png" | "bmp" | "tif" | "tiff" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    /// 根据 MIME 类型识别媒体类型
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match mime.as_str() {
            "text/plain" | "text/markdown" => Some(Self::PlainText),
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/msword" => Some(Self::Word),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(Self::Presentation)
            }
            _ if mime.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Pdf => "pdf",
            Self::Word => "word",
            Self::Presentation => "presentation",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
        }
    }
}

/// 待合成文本
///
/// 不变量:
/// - 归一化后非空
/// - 长度不超过 max_chars（按字符计）
///
/// 归一化规则: 空白折叠、乌尔都语标点映射（original 管线的预处理）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechText(String);

impl SpeechText {
    pub fn new(raw: &str, max_chars: usize) -> Result<Self, SpeechTextError> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(SpeechTextError::Empty);
        }
        let len = normalized.chars().count();
        if len > max_chars {
            return Err(SpeechTextError::TooLong { len, max: max_chars });
        }
        Ok(Self(normalized))
    }

    /// 空白折叠 + 乌尔都语标点映射
    fn normalize(raw: &str) -> String {
        let mapped: String = raw
            .chars()
            .map(|c| match c {
                '۔' => '.',
                '،' => ',',
                '\n' | '\r' | '\t' => ' ',
                c => c,
            })
            .collect();

        mapped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for SpeechText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 文本校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechTextError {
    Empty,
    TooLong { len: usize, max: usize },
}
