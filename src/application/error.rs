//! 应用层错误定义
//!
//! 只有"拿不到负载"才会作为错误返回给调用方；
//! 缓存读写失败在服务内部降级处理，不出现在这里的取数路径上。

use thiserror::Error;

use crate::application::ports::{CacheError, DecodeError, TtsError};
use crate::domain::audio::AudioDomainError;

/// 音频缓存错误
#[derive(Debug, Error)]
pub enum AudioCacheError {
    /// 请求参数或预算值无效
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 未配置提供方凭据
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 全部未命中且提供方调用失败
    #[error("Provider error: {0}")]
    Provider(#[source] TtsError),

    /// 负载解码失败（缓存状态不受影响）
    #[error("Decode error: {0}")]
    Decode(String),

    /// 诊断接口（统计、清空）上的存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] CacheError),
}

impl AudioCacheError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<TtsError> for AudioCacheError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::MissingCredential => Self::Configuration(err.to_string()),
            other => Self::Provider(other),
        }
    }
}

impl From<AudioDomainError> for AudioCacheError {
    fn from(err: AudioDomainError) -> Self {
        match err {
            AudioDomainError::InvalidPayload(msg) => Self::Decode(msg),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

impl From<DecodeError> for AudioCacheError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}
