//! Audio Cache Port - 音频缓存管理
//!
//! 内容寻址缓存: 同一 (文本, 语言, 模式, 后端) 的重复请求不重复合成。
//! get_or_create 是核心并发原语，保证每个 key 全局至多一个生产者

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::domain::speech::{AudioFormat, Language, SpeechText, SynthesisMode};

use super::speech_backend::{ProducedAudio, SynthesisError};

/// Audio Cache 错误
///
/// Clone 用于 single-flight: 同一 key 的所有等待者共享同一个失败结果
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Producer failed: {0}")]
    ProducerFailed(SynthesisError),
}

/// 缓存 key
///
/// 基于 (归一化文本, 语言, 模式, 后端标识) 的 md5 摘要。
/// 字段间以 US 分隔符拼接，避免不同字段组合串接后碰撞
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compute(
        text: &SpeechText,
        language: &Language,
        mode: SynthesisMode,
        backend_identity: &str,
    ) -> Self {
        const SEP: &str = "\u{1f}";
        let material = format!(
            "{}{SEP}{}{SEP}{}{SEP}{}",
            text.as_str(),
            language.as_str(),
            mode.as_str(),
            backend_identity
        );
        let digest = md5::compute(material.as_bytes());
        Self(format!("{:x}", digest))
    }

    /// 从已有的十六进制摘要恢复（如 HTTP 路径参数）
    pub fn from_hex(hex: impl Into<String>) -> Result<Self, &'static str> {
        let hex = hex.into();
        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("无效的缓存 key");
        }
        Ok(Self(hex.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 缓存条目元数据
///
/// 创建后不可变，只能被淘汰或清除，不会原地修改
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub size_bytes: u64,
    pub created_at: i64,
    /// 实际产出该音频的后端标识
    pub backend: String,
    pub format: AudioFormat,
}

/// get_or_create 的结果
#[derive(Debug, Clone)]
pub enum CacheOutcome {
    /// 已有条目（包括等到了他人正在进行的生产）
    Hit(CacheEntry),
    /// 本次调用触发了生产
    Created(CacheEntry),
}

impl CacheOutcome {
    pub fn entry(&self) -> &CacheEntry {
        match self {
            Self::Hit(e) | Self::Created(e) => e,
        }
    }

    pub fn into_entry(self) -> CacheEntry {
        match self {
            Self::Hit(e) | Self::Created(e) => e,
        }
    }

    pub fn was_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// 淘汰策略
///
/// 先按最大年龄清理，再按 LRU 收缩到总大小预算
#[derive(Debug, Clone)]
pub struct EvictionPolicy {
    /// 条目最大保留时间（秒），0 表示不按年龄淘汰
    pub max_age_secs: u64,
    /// 缓存总大小上限（字节），0 表示不限制
    pub max_total_bytes: u64,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_age_secs: 7 * 24 * 3600,
            max_total_bytes: 512 * 1024 * 1024,
        }
    }
}

/// 淘汰结果
#[derive(Debug, Clone, Default)]
pub struct EvictionReport {
    pub evicted_entries: u64,
    pub freed_bytes: u64,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// 音频生产者
///
/// 'static + detach: 生产在独立任务中运行，等待者断开不会取消
/// 其他等待者依赖的生产
pub type AudioProducer = BoxFuture<'static, Result<ProducedAudio, SynthesisError>>;

/// Audio Cache Port
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 查询条目元数据
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// 读取音频字节
    async fn read_audio(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// 核心并发原语: 命中直接返回，未命中则全局至多运行一次 producer。
    ///
    /// - 同 key 并发调用共享同一次生产及其结果
    /// - 条目仅在 producer 成功后原子可见，失败不留半成品
    async fn get_or_create(
        &self,
        key: &CacheKey,
        producer: AudioProducer,
    ) -> Result<CacheOutcome, CacheError>;

    /// 按策略淘汰，绝不移除正在生产中的 key
    async fn evict(&self, policy: &EvictionPolicy) -> Result<EvictionReport, CacheError>;

    /// 手动清除单个条目
    async fn purge(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SpeechText {
        SpeechText::new(s, 5000).unwrap()
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::compute(&text("Hello world"), &Language::english(), SynthesisMode::Online, "online");
        let b = CacheKey::compute(&text("Hello world"), &Language::english(), SynthesisMode::Online, "online");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_changes_with_every_field() {
        let base = CacheKey::compute(&text("Hello"), &Language::english(), SynthesisMode::Online, "online");

        let other_text =
            CacheKey::compute(&text("Hello!"), &Language::english(), SynthesisMode::Online, "online");
        let other_lang =
            CacheKey::compute(&text("Hello"), &Language::urdu(), SynthesisMode::Online, "online");
        let other_mode =
            CacheKey::compute(&text("Hello"), &Language::english(), SynthesisMode::Offline, "online");
        let other_backend =
            CacheKey::compute(&text("Hello"), &Language::english(), SynthesisMode::Online, "online-v2");

        assert_ne!(base, other_text);
        assert_ne!(base, other_lang);
        assert_ne!(base, other_mode);
        assert_ne!(base, other_backend);
    }

    #[test]
    fn test_key_separator_prevents_concat_collision() {
        // "ab" + "c" 与 "a" + "bc" 串接相同，分隔后必须不同
        let a = CacheKey::compute(&text("ab"), &Language::new("c").unwrap(), SynthesisMode::Online, "x");
        let b = CacheKey::compute(&text("a"), &Language::new("bc").unwrap(), SynthesisMode::Online, "x");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_from_hex_validation() {
        let key = CacheKey::compute(&text("hi"), &Language::english(), SynthesisMode::Online, "o");
        assert_eq!(CacheKey::from_hex(key.as_str()).unwrap(), key);
        assert!(CacheKey::from_hex("not-a-digest").is_err());
        assert!(CacheKey::from_hex("abc123").is_err());
    }
}
