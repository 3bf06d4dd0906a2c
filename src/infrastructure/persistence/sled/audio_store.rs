//! Sled-based LRU Audio Store Implementation
//!
//! - `audio_entries`: `key → bincode(InternalCacheEntry)`
//! - `audio_lru`: `be(last_access) ++ key → be(size_bytes)`，按字节序即按时间升序
//!
//! 每次变更都在一个 sled 事务里同时更新两棵树；写操作之间由 `write_lock` 串行化，
//! 淘汰计划和随后的写入之间不会插入别的写。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::transaction::{TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::ports::{
    AudioStorePort, CacheError, EvictionReport, StoreUsage, StoredAudio,
};
use crate::domain::audio::{
    estimate_encoded_bytes, AccessClock, AudioPayload, CacheKey, EvictionCandidate, EvictionPlan,
};

const ENTRIES_TREE: &str = "audio_entries";
const LRU_TREE: &str = "audio_lru";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: PathBuf,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/audio-cache.sled"),
        }
    }
}

/// 打开 sled 数据库（音频与设置共用）
pub fn open_database(config: &SledCacheConfig) -> Result<Db, CacheError> {
    sled::open(&config.db_path).map_err(|e| CacheError::DatabaseError(e.to_string()))
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    /// base64 编码的音频
    payload: String,
    last_access: i64,
    created_at: i64,
}

impl InternalCacheEntry {
    fn size_bytes(&self) -> u64 {
        estimate_encoded_bytes(self.payload.len())
    }
}

/// Sled 音频缓存
pub struct SledAudioStore {
    db: Db,
    entries: Tree,
    lru: Tree,
    clock: AccessClock,
    write_lock: Mutex<()>,
}

impl SledAudioStore {
    /// 在已打开的数据库上创建
    pub fn new(db: Db) -> Result<Self, CacheError> {
        let entries = db.open_tree(ENTRIES_TREE).map_err(db_error)?;
        let lru = db.open_tree(LRU_TREE).map_err(db_error)?;

        // 时钟从索引里最新的时间戳之后继续
        let newest = match lru.last().map_err(db_error)? {
            Some((raw, _)) => decode_lru_key(&raw)?.0,
            None => 0,
        };

        let store = Self {
            db,
            entries,
            lru,
            clock: AccessClock::starting_after(newest),
            write_lock: Mutex::new(()),
        };

        let usage = store.scan_usage()?;
        tracing::info!(
            entries = usage.count,
            current_size = usage.bytes,
            "SledAudioStore initialized"
        );

        Ok(store)
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_path_buf(),
        };
        Self::new(open_database(&config)?)
    }

    fn read_entry(&self, key: &CacheKey) -> Result<Option<InternalCacheEntry>, CacheError> {
        match self.entries.get(key.as_str()).map_err(db_error)? {
            Some(data) => Ok(Some(deserialize_entry(&data)?)),
            None => Ok(None),
        }
    }

    /// 按 last_access 升序读出整个索引
    fn index_records(&self) -> Result<Vec<EvictionCandidate>, CacheError> {
        self.lru
            .iter()
            .map(|item| item.map_err(db_error).and_then(decode_lru_item))
            .collect()
    }

    /// 用量以索引为准，和淘汰使用同一份体积
    fn scan_usage(&self) -> Result<StoreUsage, CacheError> {
        let mut usage = StoreUsage::default();
        for record in self.index_records()? {
            usage.bytes += record.size_bytes;
            usage.count += 1;
        }
        Ok(usage)
    }

    /// 读取旧条目；无法反序列化的行视为可覆盖
    fn read_replaceable(&self, key: &CacheKey) -> Result<Option<InternalCacheEntry>, CacheError> {
        match self.read_entry(key) {
            Err(CacheError::SerializationError(e)) => {
                tracing::warn!(cache_key = %key, error = %e, "Replacing unreadable cache entry");
                Ok(None)
            }
            other => other,
        }
    }

    fn put_entry(
        &self,
        key: &CacheKey,
        payload: &AudioPayload,
        max_bytes: u64,
    ) -> Result<EvictionReport, CacheError> {
        let _guard = self.write_lock.lock().map_err(|_| CacheError::LockPoisoned)?;

        let incoming = payload.estimated_bytes();
        let existing = self.read_replaceable(key)?;

        // 同 key 的旧索引记录会被替换掉，不计入当前用量，也不作为淘汰候选
        let (stale, candidates): (Vec<_>, Vec<_>) = self
            .index_records()?
            .into_iter()
            .partition(|record| &record.key == key);
        let usage_bytes: u64 = candidates.iter().map(|c| c.size_bytes).sum();
        let plan = EvictionPlan::compute(usage_bytes, incoming, max_bytes, candidates);

        let now = self.clock.tick();
        let entry = InternalCacheEntry {
            payload: payload.as_base64().to_string(),
            last_access: now,
            created_at: existing.as_ref().map(|e| e.created_at).unwrap_or(now),
        };
        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let result: TransactionResult<(), CacheError> =
            (&self.entries, &self.lru).transaction(|(entries, lru)| {
                for victim in &plan.victims {
                    entries.remove(victim.key.as_str())?;
                    lru.remove(encode_lru_key(victim.last_access, &victim.key))?;
                }
                for record in &stale {
                    lru.remove(encode_lru_key(record.last_access, key))?;
                }
                entries.insert(key.as_str(), entry_bytes.as_slice())?;
                lru.insert(encode_lru_key(now, key), &incoming.to_be_bytes()[..])?;
                Ok(())
            });
        result.map_err(transaction_error)?;

        if plan.is_exhausted() {
            tracing::warn!(
                cache_key = %key,
                size_bytes = incoming,
                max_bytes = max_bytes,
                "Entry larger than remaining budget, cache emptied"
            );
        }
        for victim in &plan.victims {
            tracing::debug!(
                key = %victim.key,
                size_bytes = victim.size_bytes,
                last_access = victim.last_access,
                "LRU evicted cache entry"
            );
        }

        Ok(EvictionReport {
            freed_bytes: plan.freed_bytes,
            evicted: plan.victims.into_iter().map(|c| c.key).collect(),
        })
    }

    fn touch_entry(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let _guard = self.write_lock.lock().map_err(|_| CacheError::LockPoisoned)?;

        let Some(mut entry) = self.read_entry(key)? else {
            return Ok(false);
        };
        let previous = entry.last_access;
        entry.last_access = self.clock.tick();
        let size = entry.size_bytes();
        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let result: TransactionResult<(), CacheError> =
            (&self.entries, &self.lru).transaction(|(entries, lru)| {
                entries.insert(key.as_str(), entry_bytes.as_slice())?;
                lru.remove(encode_lru_key(previous, key))?;
                lru.insert(encode_lru_key(entry.last_access, key), &size.to_be_bytes()[..])?;
                Ok(())
            });
        result.map_err(transaction_error)?;

        Ok(true)
    }

    fn remove_entry(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let _guard = self.write_lock.lock().map_err(|_| CacheError::LockPoisoned)?;

        let present = self.entries.contains_key(key.as_str()).map_err(db_error)?;
        let records: Vec<_> = self
            .index_records()?
            .into_iter()
            .filter(|record| &record.key == key)
            .collect();
        if !present && records.is_empty() {
            return Ok(false);
        }

        let result: TransactionResult<(), CacheError> =
            (&self.entries, &self.lru).transaction(|(entries, lru)| {
                entries.remove(key.as_str())?;
                for record in &records {
                    lru.remove(encode_lru_key(record.last_access, key))?;
                }
                Ok(())
            });
        result.map_err(transaction_error)?;

        let size_bytes: u64 = records.iter().map(|r| r.size_bytes).sum();
        tracing::debug!(cache_key = %key, size_bytes = size_bytes, "Cache entry removed");
        Ok(true)
    }

    fn clear_all(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().map_err(|_| CacheError::LockPoisoned)?;
        self.entries.clear().map_err(db_error)?;
        self.lru.clear().map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl AudioStorePort for SledAudioStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<StoredAudio>, CacheError> {
        let Some(entry) = self.read_entry(key)? else {
            return Ok(None);
        };
        let payload = AudioPayload::from_base64(entry.payload)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        Ok(Some(StoredAudio {
            payload,
            last_access: entry.last_access,
            created_at: entry.created_at,
        }))
    }

    async fn put(
        &self,
        key: &CacheKey,
        payload: &AudioPayload,
        max_bytes: u64,
    ) -> Result<EvictionReport, CacheError> {
        self.put_entry(key, payload, max_bytes)
    }

    async fn touch(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.touch_entry(key)
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.remove_entry(key)
    }

    async fn usage(&self) -> Result<StoreUsage, CacheError> {
        self.scan_usage()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.clear_all()
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.db.flush_async().await.map_err(db_error)?;
        Ok(())
    }
}

fn db_error(e: sled::Error) -> CacheError {
    CacheError::DatabaseError(e.to_string())
}

fn transaction_error(e: TransactionError<CacheError>) -> CacheError {
    match e {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => db_error(e),
    }
}

fn deserialize_entry(data: &[u8]) -> Result<InternalCacheEntry, CacheError> {
    bincode::deserialize(data).map_err(|e| CacheError::SerializationError(e.to_string()))
}

fn encode_lru_key(last_access: i64, key: &CacheKey) -> Vec<u8> {
    // 时间戳为非负毫秒数，转成 u64 大端后字节序即时间序
    let mut raw = Vec::with_capacity(8 + key.as_str().len());
    raw.extend_from_slice(&(last_access.max(0) as u64).to_be_bytes());
    raw.extend_from_slice(key.as_str().as_bytes());
    raw
}

fn decode_lru_key(raw: &[u8]) -> Result<(i64, CacheKey), CacheError> {
    if raw.len() < 8 {
        return Err(CacheError::SerializationError(
            "LRU index key too short".to_string(),
        ));
    }
    let (ts, key) = raw.split_at(8);
    let mut ts_bytes = [0u8; 8];
    ts_bytes.copy_from_slice(ts);
    let key = String::from_utf8(key.to_vec())
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    Ok((u64::from_be_bytes(ts_bytes) as i64, CacheKey::from_stored(key)))
}

fn decode_lru_item((raw_key, raw_size): (sled::IVec, sled::IVec)) -> Result<EvictionCandidate, CacheError> {
    let (last_access, key) = decode_lru_key(&raw_key)?;
    let size_bytes = <[u8; 8]>::try_from(raw_size.as_ref())
        .map(u64::from_be_bytes)
        .map_err(|_| CacheError::SerializationError("LRU index value malformed".to_string()))?;
    Ok(EvictionCandidate {
        key,
        size_bytes,
        last_access,
    })
}
