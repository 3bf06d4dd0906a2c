//! Domain Layer - 领域层
//!
//! Audio Context: 合成请求、缓存 key、音频负载、LRU 淘汰计划

pub mod audio;
