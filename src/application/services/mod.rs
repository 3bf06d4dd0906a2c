//! Application Services
//!
//! - TieredAudioCache: 内存层 → 持久层 → 提供方
//! - CacheBudget: 持久层字节预算（可持久化、可重新加载）
//! - InFlightRegistry: 同一 key 的并发请求合并为一次提供方调用

mod budget;
mod in_flight;
mod tiered_cache;

pub use budget::{CacheBudget, BYTES_PER_MB, DEFAULT_MAX_MB};
pub use in_flight::InFlightRegistry;
pub use tiered_cache::{CacheStats, TieredAudioCache};
