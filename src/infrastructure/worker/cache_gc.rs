//! Cache GC Worker - 缓存淘汰后台任务
//!
//! 按固定间隔执行淘汰策略（年龄上限 + LRU 大小预算）。
//! 正常运行期音频目录只增不改，唯一的删除入口就是这里

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{AudioCachePort, EvictionPolicy};

/// GC Worker 配置
#[derive(Debug, Clone)]
pub struct CacheGcConfig {
    /// 淘汰间隔（秒）
    pub interval_secs: u64,
    /// 淘汰策略
    pub policy: EvictionPolicy,
}

impl Default for CacheGcConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            policy: EvictionPolicy::default(),
        }
    }
}

/// 缓存 GC Worker
pub struct CacheGcWorker {
    config: CacheGcConfig,
    cache: Arc<dyn AudioCachePort>,
}

impl CacheGcWorker {
    pub fn new(config: CacheGcConfig, cache: Arc<dyn AudioCachePort>) -> Self {
        Self { config, cache }
    }

    /// 启动定时循环
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            max_age_secs = self.config.policy.max_age_secs,
            max_total_bytes = self.config.policy.max_total_bytes,
            "CacheGcWorker started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        // 首次 tick 立即返回，跳过它让第一轮清理等满一个间隔
        interval.tick().await;

        loop {
            interval.tick().await;
            self.sweep_once().await;
        }
    }

    /// 执行一轮淘汰
    pub async fn sweep_once(&self) {
        match self.cache.evict(&self.config.policy).await {
            Ok(report) => {
                if report.evicted_entries > 0 {
                    tracing::info!(
                        evicted = report.evicted_entries,
                        freed_bytes = report.freed_bytes,
                        "Cache GC sweep completed"
                    );
                } else {
                    tracing::debug!("Cache GC sweep: nothing to evict");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache GC sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::application::ports::{AudioProducer, CacheKey, ProducedAudio};
    use crate::domain::speech::{AudioFormat, Language, SpeechText, SynthesisMode};
    use crate::infrastructure::persistence::sled::{SledAudioCache, SledCacheConfig};

    fn producer(data: Vec<u8>) -> AudioProducer {
        Box::pin(async move {
            Ok(ProducedAudio {
                data,
                format: AudioFormat::Wav,
                backend: "test".to_string(),
            })
        })
    }

    #[tokio::test]
    async fn test_sweep_shrinks_cache_to_budget() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(
            SledAudioCache::new(&SledCacheConfig {
                db_path: dir.path().join("gc.sled").to_string_lossy().to_string(),
                max_size_bytes: 0,
            })
            .unwrap(),
        );

        for i in 0..4u8 {
            let text = SpeechText::new(&format!("entry {}", i), 100).unwrap();
            let key =
                CacheKey::compute(&text, &Language::english(), SynthesisMode::Online, "test");
            cache.get_or_create(&key, producer(vec![0; 100])).await.unwrap();
        }
        assert_eq!(cache.stats().await.total_size_bytes, 400);

        let worker = CacheGcWorker::new(
            CacheGcConfig {
                interval_secs: 3600,
                policy: EvictionPolicy {
                    max_age_secs: 0,
                    max_total_bytes: 250,
                },
            },
            cache.clone(),
        );
        worker.sweep_once().await;

        assert!(cache.stats().await.total_size_bytes <= 250);
    }
}
