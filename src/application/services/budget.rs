//! 缓存预算
//!
//! 进程内的预算值由 `CacheBudget` 持有，通过 `SettingsStorePort` 持久化。
//! 调低预算不会立即淘汰，下一次写入时才按新预算执行。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::error::AudioCacheError;
use crate::application::ports::SettingsStorePort;

pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const DEFAULT_MAX_MB: u64 = 80;

pub struct CacheBudget {
    max_bytes: AtomicU64,
    default_max_bytes: u64,
    settings: Arc<dyn SettingsStorePort>,
}

impl CacheBudget {
    /// 读取已保存的预算，没有或读取失败时使用默认值
    pub async fn load(
        settings: Arc<dyn SettingsStorePort>,
        default_max_bytes: u64,
    ) -> Result<Self, AudioCacheError> {
        if default_max_bytes == 0 {
            return Err(AudioCacheError::invalid_request(
                "default cache budget must be greater than 0",
            ));
        }

        let budget = Self {
            max_bytes: AtomicU64::new(default_max_bytes),
            default_max_bytes,
            settings,
        };
        budget.reload().await;
        Ok(budget)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes.load(Ordering::Relaxed)
    }

    pub fn max_megabytes(&self) -> u64 {
        (self.max_bytes() + BYTES_PER_MB / 2) / BYTES_PER_MB
    }

    pub fn default_max_bytes(&self) -> u64 {
        self.default_max_bytes
    }

    /// 修改预算并持久化
    ///
    /// 持久化失败只记录日志，进程内的新值仍然生效
    pub async fn set_max_bytes(&self, max_bytes: u64) -> Result<(), AudioCacheError> {
        if max_bytes == 0 {
            return Err(AudioCacheError::invalid_request(
                "cache budget must be greater than 0",
            ));
        }

        let previous = self.max_bytes.swap(max_bytes, Ordering::Relaxed);
        if let Err(e) = self.settings.save_max_bytes(max_bytes).await {
            tracing::warn!(max_bytes = max_bytes, error = %e, "Failed to persist cache budget");
        }

        tracing::info!(previous = previous, max_bytes = max_bytes, "Cache budget updated");
        Ok(())
    }

    pub async fn set_max_megabytes(&self, megabytes: u64) -> Result<(), AudioCacheError> {
        let max_bytes = megabytes.checked_mul(BYTES_PER_MB).ok_or_else(|| {
            AudioCacheError::invalid_request(format!("cache budget too large: {} MB", megabytes))
        })?;
        self.set_max_bytes(max_bytes).await
    }

    /// 从设置存储重新加载，返回生效的预算
    pub async fn reload(&self) -> u64 {
        let max_bytes = match self.settings.load_max_bytes().await {
            Ok(Some(value)) if value > 0 => value,
            Ok(Some(_)) | Ok(None) => self.default_max_bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load cache budget, using default");
                self.default_max_bytes
            }
        };
        self.max_bytes.store(max_bytes, Ordering::Relaxed);
        max_bytes
    }
}
