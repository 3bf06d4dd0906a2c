//! Settings Store Port - 持久化的运行时设置

use async_trait::async_trait;

use super::CacheError;

/// 缓存预算的持久化
#[async_trait]
pub trait SettingsStorePort: Send + Sync {
    /// 读取已保存的预算（字节），未保存过返回 `None`
    async fn load_max_bytes(&self) -> Result<Option<u64>, CacheError>;

    /// 保存预算（字节）
    async fn save_max_bytes(&self, max_bytes: u64) -> Result<(), CacheError>;
}
