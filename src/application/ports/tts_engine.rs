//! TTS Engine Port - 语音合成提供方抽象
//!
//! 定义外部 TTS 服务的抽象接口，具体实现在 infrastructure/adapters 层。
//! 提供方按次计费且有限流，只应在缓存全部未命中时调用。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::{AudioPayload, SynthesisRequest};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    /// 未配置凭据，在发出任何网络请求之前判定
    #[error("TTS credential is not configured")]
    MissingCredential,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TtsError {
    /// 可以重试的错误（网络、超时、5xx/429）
    pub fn is_transient(&self) -> bool {
        match self {
            TtsError::NetworkError(_) | TtsError::Timeout => true,
            TtsError::ServiceError(msg) => {
                msg.starts_with("HTTP 5") || msg.starts_with("HTTP 429")
            }
            TtsError::MissingCredential | TtsError::InvalidResponse(_) => false,
        }
    }
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成语音，返回编码后的音频负载
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioPayload, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
