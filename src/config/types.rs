//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 语言检测配置
    #[serde(default)]
    pub detection: DetectionConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            synthesis: SynthesisConfig::default(),
            detection: DetectionConfig::default(),
            cache: CacheConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传文件最大大小（字节）
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 合成文本长度上限（字符）
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// 在线后端配置
    #[serde(default)]
    pub online: OnlineBackendConfig,

    /// 离线后端配置
    #[serde(default)]
    pub offline: OfflineBackendConfig,
}

fn default_max_text_chars() -> usize {
    5000
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            online: OnlineBackendConfig::default(),
            offline: OfflineBackendConfig::default(),
        }
    }
}

/// 在线后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct OnlineBackendConfig {
    /// 合成服务基础 URL
    #[serde(default = "default_online_url")]
    pub url: String,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_online_timeout")]
    pub timeout_secs: u64,

    /// 瞬时故障最大重试次数
    #[serde(default = "default_online_retries")]
    pub max_retries: u32,

    /// 线性退避基数（毫秒）
    #[serde(default = "default_online_backoff")]
    pub backoff_ms: u64,
}

fn default_online_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_online_timeout() -> u64 {
    60
}

fn default_online_retries() -> u32 {
    2
}

fn default_online_backoff() -> u64 {
    500
}

impl Default for OnlineBackendConfig {
    fn default() -> Self {
        Self {
            url: default_online_url(),
            timeout_secs: default_online_timeout(),
            max_retries: default_online_retries(),
            backoff_ms: default_online_backoff(),
        }
    }
}

/// 离线后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct OfflineBackendConfig {
    /// espeak-ng 可执行文件
    #[serde(default = "default_offline_executable")]
    pub executable: String,

    /// 有音色的语言标签
    #[serde(default = "default_offline_voices")]
    pub voices: Vec<String>,

    /// 语速（每分钟词数）
    #[serde(default = "default_offline_speed")]
    pub speed_wpm: u32,
}

fn default_offline_executable() -> String {
    "espeak-ng".to_string()
}

fn default_offline_voices() -> Vec<String> {
    vec!["en".to_string(), "ur".to_string()]
}

fn default_offline_speed() -> u32 {
    140
}

impl Default for OfflineBackendConfig {
    fn default() -> Self {
        Self {
            executable: default_offline_executable(),
            voices: default_offline_voices(),
            speed_wpm: default_offline_speed(),
        }
    }
}

/// 语言检测配置
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// 采纳检测结果所需的最小置信度
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// 检测不可用时的回退语言
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            default_language: default_language(),
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// 缓存总大小上限（字节），0 表示不限制
    #[serde(default = "default_cache_max_bytes")]
    pub max_size_bytes: u64,

    /// 条目最大保留时间（秒），0 表示不按年龄淘汰
    #[serde(default = "default_cache_max_age")]
    pub max_age_secs: u64,

    /// 是否启用自动淘汰
    #[serde(default = "default_gc_enabled")]
    pub gc_enabled: bool,

    /// 淘汰间隔（秒）
    #[serde(default = "default_gc_interval")]
    pub gc_interval_secs: u64,
}

fn default_cache_path() -> String {
    "data/cache.sled".to_string()
}

fn default_cache_max_bytes() -> u64 {
    512 * 1024 * 1024 // 512 MiB
}

fn default_cache_max_age() -> u64 {
    7 * 24 * 3600 // 7 天
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    3600 // 1 小时
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_size_bytes: default_cache_max_bytes(),
            max_age_secs: default_cache_max_age(),
            gc_enabled: default_gc_enabled(),
            gc_interval_secs: default_gc_interval(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
