//! Audio Decoder Port - 音频解码抽象
//!
//! 把编码后的音频（MP3 等）解码为交错排列的 PCM f32 样本

use async_trait::async_trait;
use thiserror::Error;

/// 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 解码后的音频
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// 交错排列的样本
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u8,
    pub duration_ms: u64,
}

impl DecodedAudio {
    /// 每声道的帧数
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// 可直接交给播放端的音频（不解码）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableAudio {
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Audio Decoder Port
#[async_trait]
pub trait AudioDecoderPort: Send + Sync {
    async fn decode(&self, data: &[u8]) -> Result<DecodedAudio, DecodeError>;
}
