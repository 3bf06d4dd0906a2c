//! Audio Store Port - 持久层音频缓存
//!
//! 定义持久层的抽象接口，具体实现使用 Sled（见 infrastructure/persistence/sled）
//!
//! 表结构: `{key (主键), payload, last_access}`，另有按 last_access 升序的索引

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::{AudioPayload, CacheKey};

/// 持久层错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// 持久层中的一条缓存
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub payload: AudioPayload,
    pub last_access: i64,
    pub created_at: i64,
}

/// 用量（按 LRU 索引统计）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreUsage {
    pub bytes: u64,
    pub count: usize,
}

/// 一次写入触发的淘汰结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: Vec<CacheKey>,
    pub freed_bytes: u64,
}

/// Audio Store Port
///
/// 每个写操作都是自包含的事务：淘汰 + 写入要么全部生效，要么全部失败
#[async_trait]
pub trait AudioStorePort: Send + Sync {
    /// 读取条目，不存在返回 `None`（不更新时间戳）
    async fn get(&self, key: &CacheKey) -> Result<Option<StoredAudio>, CacheError>;

    /// 写入（upsert）并把 last_access 设为当前时间
    ///
    /// 写入前按 `max_bytes` 执行 LRU 淘汰，返回时预算不变式已成立
    async fn put(
        &self,
        key: &CacheKey,
        payload: &AudioPayload,
        max_bytes: u64,
    ) -> Result<EvictionReport, CacheError>;

    /// 只更新 last_access，条目不存在时返回 `false`
    async fn touch(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// 删除单个条目，返回是否存在
    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// 全表扫描，累加估算体积
    async fn usage(&self) -> Result<StoreUsage, CacheError>;

    /// 清空所有条目
    async fn clear(&self) -> Result<(), CacheError>;

    /// 刷盘
    async fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
