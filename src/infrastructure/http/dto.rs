//! Data Transfer Objects

use serde::{Deserialize, Serialize};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Upload DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// 提取出的纯文本
    pub text: String,
    /// 识别到的媒体类型
    pub media_type: String,
    /// 提取方式
    pub extraction_method: String,
}

// ============================================================================
// Detection DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DetectLanguageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectLanguageResponse {
    /// 检测到的语言标签，信号不足时为 "unknown"
    pub language: String,
    pub confidence: f64,
}

// ============================================================================
// Synthesis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    /// 语言标签，空串表示交给检测
    #[serde(default)]
    pub language: String,
    /// "online" | "offline"，默认 online
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "online".to_string()
}

#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    /// 音频引用，经 /api/audio/{audio_ref} 取回
    pub audio_ref: String,
    /// 是否命中缓存
    pub cached: bool,
    /// 实际产出音频的后端
    pub backend: String,
    /// 最终采用的语言
    pub language: String,
    /// 在线请求被降级到离线
    pub degraded: bool,
}
