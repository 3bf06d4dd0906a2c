//! Sled 持久层
//!
//! 同一个 sled 数据库里放三棵树：
//! - `audio_entries`: key → 缓存条目
//! - `audio_lru`: last_access 升序索引
//! - `settings`: 运行时设置（缓存预算）

mod audio_store;
mod settings_store;

pub use audio_store::{open_database, SledAudioStore, SledCacheConfig};
pub use settings_store::SledSettingsStore;
