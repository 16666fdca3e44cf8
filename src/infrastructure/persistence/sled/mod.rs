//! Sled Persistence - 音频缓存存储

mod audio_cache;

pub use audio_cache::{SledAudioCache, SledCacheConfig};
