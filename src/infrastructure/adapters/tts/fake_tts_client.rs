//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 始终返回固定的音频文件，不实际调用 TTS 服务

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::application::ports::{TtsEnginePort, TtsError};
use crate::domain::audio::{AudioPayload, SynthesisRequest};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 固定返回的音频文件路径
    pub audio_file_path: PathBuf,
    /// 模拟的合成延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            audio_file_path: PathBuf::from("data/fake.mp3"),
            latency_ms: 200,
        }
    }
}

/// Fake TTS Client
///
/// 记录调用次数，可以切换为失败模式，用来验证缓存是否真的挡住了提供方
pub struct FakeTtsClient {
    payload: AudioPayload,
    latency_ms: u64,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeTtsClient {
    /// 从配置的文件创建
    pub fn new(config: FakeTtsClientConfig) -> Result<Self, std::io::Error> {
        let audio_data = std::fs::read(&config.audio_file_path)?;
        tracing::info!(
            path = %config.audio_file_path.display(),
            size = audio_data.len(),
            latency_ms = config.latency_ms,
            "FakeTtsClient initialized"
        );
        Ok(Self::from_audio(&audio_data).with_latency(config.latency_ms))
    }

    /// 直接使用内存中的音频字节
    pub fn from_audio(audio_data: &[u8]) -> Self {
        Self {
            payload: AudioPayload::from_audio_bytes(audio_data),
            latency_ms: 0,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// 已收到的合成请求次数（包括失败的）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioPayload, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            text_len = request.text().len(),
            language = %request.language(),
            rate = request.rate(),
            "FakeTtsClient: returning fixed audio"
        );

        if self.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(TtsError::NetworkError("fake provider is offline".to_string()));
        }

        Ok(self.payload.clone())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}
