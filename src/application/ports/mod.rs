//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_decoder;
mod audio_store;
mod settings_store;
mod tts_engine;

pub use audio_decoder::{AudioDecoderPort, DecodeError, DecodedAudio, PlayableAudio};
pub use audio_store::{AudioStorePort, CacheError, EvictionReport, StoreUsage, StoredAudio};
pub use settings_store::SettingsStorePort;
pub use tts_engine::{TtsEnginePort, TtsError};
