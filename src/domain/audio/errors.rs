//! Audio Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioDomainError {
    #[error("合成文本不能为空")]
    EmptyText,

    #[error("语言标签不能为空")]
    EmptyLanguage,

    #[error("无效的语速: {0}")]
    InvalidRate(f64),

    #[error("无效的音频负载: {0}")]
    InvalidPayload(String),
}
