//! Persistence Layer - 数据持久化
//!
//! Sled 音频缓存存储

pub mod sled;

pub use self::sled::{SledAudioCache, SledCacheConfig};
