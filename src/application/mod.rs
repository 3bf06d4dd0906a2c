//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AudioStore、SettingsStore、TtsEngine、AudioDecoder）
//! - services: 两级缓存编排、预算、in-flight 请求合并
//! - error: 应用层错误定义

pub mod error;
pub mod ports;
pub mod services;

pub use error::AudioCacheError;

pub use ports::{
    // Persistent store
    AudioStorePort,
    CacheError,
    EvictionReport,
    SettingsStorePort,
    StoreUsage,
    StoredAudio,
    // Decoder
    AudioDecoderPort,
    DecodeError,
    DecodedAudio,
    PlayableAudio,
    // TTS engine
    TtsEnginePort,
    TtsError,
};

pub use services::{CacheBudget, CacheStats, InFlightRegistry, TieredAudioCache};
