//! Audio Context - 语音缓存限界上下文
//!
//! 职责:
//! - 合成请求校验 (text, language, rate)
//! - 缓存 key 组合 (Key Composer)
//! - 编码音频负载与体积估算 (Size Estimator)
//! - LRU 淘汰计划 (Eviction Policy)

mod clock;
mod errors;
mod eviction;
mod value_objects;

pub use clock::AccessClock;
pub use errors::AudioDomainError;
pub use eviction::{EvictionCandidate, EvictionPlan};
pub use value_objects::{estimate_encoded_bytes, AudioPayload, CacheKey, SynthesisRequest};
