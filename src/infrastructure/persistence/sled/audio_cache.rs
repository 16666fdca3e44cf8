//! Sled-based Audio Cache Implementation
//!
//! 内容寻址 + single-flight:
//! - 条目以 bincode 序列化存入 sled，仅在生产成功后一次性写入（原子可见）
//! - 同 key 并发 get_or_create 通过共享 future 合并为一次生产，
//!   生产在独立任务中运行，等待者断开不会取消共享生产
//! - 淘汰: 先按最大年龄清理，再按 LRU 收缩到大小预算，跳过生产中的 key

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    AudioCachePort, AudioProducer, CacheEntry, CacheError, CacheKey, CacheOutcome, CacheStats,
    EvictionPolicy, EvictionReport,
};
use crate::domain::speech::AudioFormat;

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节），0 表示不限制
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cache.sled".to_string(),
            max_size_bytes: 512 * 1024 * 1024,
        }
    }
}

/// 内部缓存条目（元数据 + 音频字节一并序列化，单次 insert 原子可见）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    backend: String,
    format: AudioFormat,
    created_at: i64,
    last_accessed: i64,
}

impl StoredEntry {
    fn to_entry(&self, key: &CacheKey) -> CacheEntry {
        CacheEntry {
            key: key.clone(),
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            backend: self.backend.clone(),
            format: self.format,
        }
    }
}

/// bool = 本次 flight 是否真正执行了生产
/// （flight 起跑时二次确认存储，落在 lookup 与入列之间的竞态窗口不会重复生产）
type FlightResult = Result<(CacheEntry, bool), CacheError>;
type Flight = Shared<BoxFuture<'static, FlightResult>>;

/// Sled 音频缓存
pub struct SledAudioCache {
    db: Db,
    max_size_bytes: u64,
    current_size: Arc<AtomicU64>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    /// 进行中的生产，key 十六进制 -> 共享 flight
    inflight: Arc<DashMap<String, Flight>>,
}

impl SledAudioCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledAudioCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: Arc::new(AtomicU64::new(current_size)),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            inflight: Arc::new(DashMap::new()),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix("cache:") {
            let (_, value) = item.map_err(|e| CacheError::Database(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    fn tree_key(key: &CacheKey) -> String {
        format!("cache:{}", key)
    }

    /// 读取条目，不更新访问时间
    fn load(db: &Db, key: &CacheKey) -> Result<Option<StoredEntry>, CacheError> {
        let Some(data) = db
            .get(Self::tree_key(key))
            .map_err(|e| CacheError::Database(e.to_string()))?
        else {
            return Ok(None);
        };
        let entry: StoredEntry = bincode::deserialize(&data)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Some(entry))
    }

    /// 读取并 touch（更新 last_accessed，LRU 依据）
    fn load_touch(&self, key: &CacheKey) -> Result<Option<StoredEntry>, CacheError> {
        let tree_key = Self::tree_key(key);
        let Some(data) = self
            .db
            .get(&tree_key)
            .map_err(|e| CacheError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut entry: StoredEntry = bincode::deserialize(&data)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        entry.last_accessed = Utc::now().timestamp();
        let bytes = bincode::serialize(&entry)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.db
            .insert(&tree_key, bytes)
            .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(Some(entry))
    }

    /// 将生产结果一次性写入（成功前对 lookup 不可见）
    fn store(
        db: &Db,
        current_size: &AtomicU64,
        key: &CacheKey,
        audio_data: Vec<u8>,
        backend: String,
        format: AudioFormat,
    ) -> Result<CacheEntry, CacheError> {
        let size = audio_data.len() as u64;
        let now = Utc::now().timestamp();
        let stored = StoredEntry {
            audio_data,
            size_bytes: size,
            backend,
            format,
            created_at: now,
            last_accessed: now,
        };

        let bytes = bincode::serialize(&stored)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        db.insert(Self::tree_key(key), bytes)
            .map_err(|e| CacheError::Database(e.to_string()))?;

        current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            key = %key,
            size_bytes = size,
            backend = %stored.backend,
            "Audio cached"
        );

        Ok(stored.to_entry(key))
    }

    /// 构造共享 flight
    ///
    /// 惰性: 首次 poll 时才 spawn 生产任务，保证 inflight 表项先于任务存在；
    /// spawn 之后生产独立于所有等待者运行，任务尾部自行摘除 inflight 表项
    fn make_flight(&self, key: CacheKey, producer: AudioProducer) -> Flight {
        let db = self.db.clone();
        let current_size = self.current_size.clone();
        let inflight = self.inflight.clone();
        let key_str = key.as_str().to_string();

        let fut: BoxFuture<'static, FlightResult> = async move {
            let handle = tokio::spawn(async move {
                // 二次确认: 另一次生产可能已在本 flight 入列前完成落库
                let result = match Self::load(&db, &key) {
                    Ok(Some(stored)) => Ok((stored.to_entry(&key), false)),
                    _ => match producer.await {
                        Ok(produced) => Self::store(
                            &db,
                            &current_size,
                            &key,
                            produced.data,
                            produced.backend,
                            produced.format,
                        )
                        .map(|entry| (entry, true)),
                        Err(e) => Err(CacheError::ProducerFailed(e)),
                    },
                };
                inflight.remove(&key_str);
                result
            });

            match handle.await {
                Ok(result) => result,
                Err(e) => Err(CacheError::Database(format!("producer task panicked: {e}"))),
            }
        }
        .boxed();

        fut.shared()
    }

    /// 淘汰最久未访问的一个条目，跳过生产中的 key
    ///
    /// 返回释放的字节数，无可淘汰条目时返回 None
    fn evict_lru_once(&self) -> Result<Option<u64>, CacheError> {
        let mut oldest: Option<(String, i64, u64)> = None;

        for item in self.db.scan_prefix("cache:") {
            let (key, value) = item.map_err(|e| CacheError::Database(e.to_string()))?;
            let key_str = String::from_utf8(key.to_vec())
                .map_err(|e| CacheError::Serialization(e.to_string()))?;

            let hex = key_str.trim_start_matches("cache:");
            if self.inflight.contains_key(hex) {
                continue;
            }

            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, accessed, _)| entry.last_accessed < *accessed)
                    .unwrap_or(true);
                if is_older {
                    oldest = Some((key_str, entry.last_accessed, entry.size_bytes));
                }
            }
        }

        let Some((key, _, size)) = oldest else {
            return Ok(None);
        };

        self.db
            .remove(&key)
            .map_err(|e| CacheError::Database(e.to_string()))?;
        self.current_size.fetch_sub(size, Ordering::Relaxed);

        tracing::debug!(key = %key, size_bytes = size, "LRU evicted cache entry");
        Ok(Some(size))
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AudioCachePort for SledAudioCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.load_touch(key)?.map(|stored| stored.to_entry(key)))
    }

    async fn read_audio(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.load_touch(key)?.map(|stored| stored.audio_data))
    }

    async fn get_or_create(
        &self,
        key: &CacheKey,
        producer: AudioProducer,
    ) -> Result<CacheOutcome, CacheError> {
        // 快路径: 已有条目
        if let Some(stored) = self.load_touch(key)? {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheOutcome::Hit(stored.to_entry(key)));
        }

        // 慢路径: single-flight 合并并发生产
        let key_str = key.as_str().to_string();
        let (flight, is_producer) = match self.inflight.entry(key_str) {
            dashmap::mapref::entry::Entry::Occupied(e) => (e.get().clone(), false),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                let flight = self.make_flight(key.clone(), producer);
                v.insert(flight.clone());
                (flight, true)
            }
        };

        let (entry, produced) = flight.await?;

        if is_producer && produced {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            Ok(CacheOutcome::Created(entry))
        } else {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            Ok(CacheOutcome::Hit(entry))
        }
    }

    async fn evict(&self, policy: &EvictionPolicy) -> Result<EvictionReport, CacheError> {
        let mut report = EvictionReport::default();

        // 1. 按最大年龄清理
        if policy.max_age_secs > 0 {
            let cutoff = Utc::now().timestamp() - policy.max_age_secs as i64;
            let mut expired = Vec::new();

            for item in self.db.scan_prefix("cache:") {
                let (key, value) = item.map_err(|e| CacheError::Database(e.to_string()))?;
                let key_str = String::from_utf8(key.to_vec())
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;

                let hex = key_str.trim_start_matches("cache:");
                if self.inflight.contains_key(hex) {
                    continue;
                }

                if let Ok(entry) = bincode::deserialize::<StoredEntry>(&value) {
                    if entry.created_at < cutoff {
                        expired.push((key_str, entry.size_bytes));
                    }
                }
            }

            for (key, size) in expired {
                self.db
                    .remove(&key)
                    .map_err(|e| CacheError::Database(e.to_string()))?;
                self.current_size.fetch_sub(size, Ordering::Relaxed);
                report.evicted_entries += 1;
                report.freed_bytes += size;
            }
        }

        // 2. LRU 收缩到大小预算
        if policy.max_total_bytes > 0 {
            while self.current_size.load(Ordering::Relaxed) > policy.max_total_bytes {
                match self.evict_lru_once()? {
                    Some(freed) => {
                        report.evicted_entries += 1;
                        report.freed_bytes += freed;
                    }
                    None => break,
                }
            }
        }

        if report.evicted_entries > 0 {
            tracing::info!(
                evicted = report.evicted_entries,
                freed_bytes = report.freed_bytes,
                "Cache eviction completed"
            );
        }

        Ok(report)
    }

    async fn purge(&self, key: &CacheKey) -> Result<(), CacheError> {
        if let Some(data) = self
            .db
            .remove(Self::tree_key(key))
            .map_err(|e| CacheError::Database(e.to_string()))?
        {
            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&data) {
                self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let total_entries = self.db.scan_prefix("cache:").count();

        CacheStats {
            total_entries,
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
