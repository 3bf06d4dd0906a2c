//! suomen-audio - 两级 TTS 音频缓存
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Audio Context: 合成请求、缓存 key、负载、LRU 淘汰计划、访问时钟
//!
//! 应用层 (application/):
//! - Ports: AudioStore, SettingsStore, TtsEngine, AudioDecoder
//! - Services: TieredAudioCache（内存层 → 持久层 → 提供方）、CacheBudget、InFlightRegistry
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: sled 持久层与设置
//! - Adapters: Google TTS / Fake TTS 客户端、symphonia 解码器
//! - HTTP: RESTful API

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
