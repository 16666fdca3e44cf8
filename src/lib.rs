//! Lector - 文档转语音服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Speech Context: 语言、模式、媒体类型、待合成文本等值对象
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Extractor, LanguageDetector, AudioCache, SpeechBackend）
//! - Extraction: 提取策略分发器
//! - Pipeline: 后端选择器（在线/离线回退）与管线编排器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 提取策略、语言检测、合成后端
//! - Persistence: Sled 音频缓存（single-flight get_or_create + LRU 淘汰）
//! - Worker: 缓存淘汰定时任务
//! - HTTP: RESTful API

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
