//! Audio Context - Value Objects

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

use super::AudioDomainError;

/// 语音合成请求
///
/// 构造时完成校验，之后的 key 组合是全函数
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    text: String,
    language: String,
    rate: f64,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        language: impl Into<String>,
        rate: f64,
    ) -> Result<Self, AudioDomainError> {
        let text = text.into();
        let language = language.into();

        if text.is_empty() {
            return Err(AudioDomainError::EmptyText);
        }
        if language.trim().is_empty() {
            return Err(AudioDomainError::EmptyLanguage);
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AudioDomainError::InvalidRate(rate));
        }

        Ok(Self {
            text,
            language,
            rate,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// 组合缓存 key
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::compose(self)
    }
}

/// 缓存 key
///
/// 格式: `{len(lang)}:{lang}|{rate}|{len(text)}:{text}`
///
/// 语言和文本都带字节长度前缀，文本里出现 `|` 或 `:` 也不会和别的请求撞 key。
/// rate 使用 f64 的最短往返十进制表示，不同的值一定得到不同的字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compose(request: &SynthesisRequest) -> Self {
        Self(format!(
            "{}:{}|{}|{}:{}",
            request.language.len(),
            request.language,
            request.rate,
            request.text.len(),
            request.text
        ))
    }

    /// 从已存储的 key 字符串恢复（持久层读取索引时使用）
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 编码后的音频负载
///
/// 保存提供方返回的 base64 文本（MP3 帧流），写入后不可变。
/// 内部使用 `Arc<str>`，在内存层与调用方之间克隆不复制数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload(Arc<str>);

impl AudioPayload {
    pub fn from_base64(encoded: impl Into<String>) -> Result<Self, AudioDomainError> {
        let encoded = encoded.into();
        if encoded.is_empty() {
            return Err(AudioDomainError::InvalidPayload(
                "audio content is empty".to_string(),
            ));
        }
        Ok(Self(Arc::from(encoded)))
    }

    /// 将原始音频字节编码为负载
    pub fn from_audio_bytes(bytes: &[u8]) -> Self {
        Self(Arc::from(STANDARD.encode(bytes)))
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    /// 编码后的长度（字节）
    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }

    /// 估算的二进制体积，淘汰与用量统计都使用这个值
    pub fn estimated_bytes(&self) -> u64 {
        estimate_encoded_bytes(self.0.len())
    }

    /// 解码为原始音频字节
    pub fn decode_bytes(&self) -> Result<Vec<u8>, AudioDomainError> {
        STANDARD
            .decode(self.0.as_bytes())
            .map_err(|e| AudioDomainError::InvalidPayload(e.to_string()))
    }
}

/// base64 长度 × 3/4，向上取整
pub fn estimate_encoded_bytes(encoded_len: usize) -> u64 {
    (encoded_len as u64 * 3).div_ceil(4)
}
