//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `LECTOR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `LECTOR_SERVER__PORT=8080`
/// - `LECTOR_SYNTHESIS__ONLINE__URL=http://speech:8000`
/// - `LECTOR_CACHE__PATH=/data/cache.sled`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("server.max_upload_bytes", 10 * 1024 * 1024)?
        .set_default("synthesis.max_text_chars", 5000)?
        .set_default("synthesis.online.url", "http://localhost:8000")?
        .set_default("synthesis.online.timeout_secs", 60)?
        .set_default("synthesis.online.max_retries", 2)?
        .set_default("synthesis.online.backoff_ms", 500)?
        .set_default("synthesis.offline.executable", "espeak-ng")?
        .set_default("synthesis.offline.voices", vec!["en", "ur"])?
        .set_default("synthesis.offline.speed_wpm", 140)?
        .set_default("detection.min_confidence", 0.5)?
        .set_default("detection.default_language", "en")?
        .set_default("cache.path", "data/cache.sled")?
        .set_default("cache.max_size_bytes", 512_u64 * 1024 * 1024)?
        .set_default("cache.max_age_secs", 7_u64 * 24 * 3600)?
        .set_default("cache.gc_enabled", true)?
        .set_default("cache.gc_interval_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    builder = builder.add_source(
        Environment::with_prefix("LECTOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.synthesis.max_text_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Max text length cannot be 0".to_string(),
        ));
    }

    if config.synthesis.online.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Online backend URL cannot be empty".to_string(),
        ));
    }

    if config.cache.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache path cannot be empty".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.detection.min_confidence) {
        return Err(ConfigError::ValidationError(
            "Detection confidence threshold must be within [0, 1]".to_string(),
        ));
    }

    if config.cache.gc_enabled && config.cache.gc_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Upload: {} bytes", config.server.max_upload_bytes);
    tracing::info!("Max Text: {} chars", config.synthesis.max_text_chars);
    tracing::info!("Online Backend: {}", config.synthesis.online.url);
    tracing::info!(
        "Online Timeout: {}s, Retries: {}",
        config.synthesis.online.timeout_secs,
        config.synthesis.online.max_retries
    );
    tracing::info!(
        "Offline Voices: {}",
        config.synthesis.offline.voices.join(", ")
    );
    tracing::info!("Default Language: {}", config.detection.default_language);
    tracing::info!("Cache: {}", config.cache.path);
    tracing::info!("Cache GC Enabled: {}", config.cache.gc_enabled);
    if config.cache.gc_enabled {
        tracing::info!("Cache GC Interval: {}s", config.cache.gc_interval_secs);
        tracing::info!("Cache Max Age: {}s", config.cache.max_age_secs);
        tracing::info!("Cache Max Size: {} bytes", config.cache.max_size_bytes);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_text_cap() {
        let mut config = AppConfig::default();
        config.synthesis.max_text_chars = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_online_url() {
        let mut config = AppConfig::default();
        config.synthesis.online.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_confidence() {
        let mut config = AppConfig::default();
        config.detection.min_confidence = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 7070

[synthesis]
max_text_chars = 1234

[synthesis.offline]
voices = ["en"]
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.synthesis.max_text_chars, 1234);
        assert_eq!(config.synthesis.offline.voices, vec!["en"]);
        // 未覆盖的字段保持默认值
        assert_eq!(config.cache.gc_interval_secs, 3600);
    }
}
