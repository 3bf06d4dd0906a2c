//! In-flight 请求合并
//!
//! 每个缓存 key 对应一把异步锁。同一 key 的并发请求排队等待，
//! 第一个请求完成写回后，后续请求会在内存层命中。不同 key 互不阻塞。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct InFlightRegistry {
    flights: DashMap<String, Arc<Mutex<()>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 key 的独占权，持有期间同 key 的其他请求等待
    pub async fn acquire(&self, key: &str) -> InFlightGuard<'_> {
        let lock = self
            .flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        InFlightGuard {
            registry: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// 当前登记的 key 数量
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

/// 释放时如果没有其他等待者，顺带清理登记项
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // 只剩表里这一份引用时说明没人在等
        self.registry
            .flights
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
