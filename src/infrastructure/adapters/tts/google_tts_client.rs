//! Google TTS Client - 调用 Google Cloud Text-to-Speech REST API
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! POST https://texttospeech.googleapis.com/v1/text:synthesize?key={api_key}
//! Request: {"input": {"text"}, "voice": {"languageCode", "name"}, "audioConfig": {"audioEncoding": "MP3", "speakingRate"}}
//! Response: {"audioContent": "<base64 MP3>"}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::application::ports::{TtsEnginePort, TtsError};
use crate::domain::audio::{AudioPayload, SynthesisRequest};

const AUDIO_ENCODING: &str = "MP3";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

/// 默认的语言 → 音色映射
pub fn default_voices() -> HashMap<String, String> {
    HashMap::from([
        ("fi-FI".to_string(), "fi-FI-Wavenet-A".to_string()),
        ("cmn-CN".to_string(), "cmn-CN-Wavenet-A".to_string()),
    ])
}

/// Google TTS 客户端配置
#[derive(Debug, Clone)]
pub struct GoogleTtsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// API key，未配置时所有请求直接失败
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 瞬时错误的重试次数
    pub max_retries: u32,
    /// 重试间隔基数（毫秒），第 n 次重试等待 n 倍
    pub retry_backoff_ms: u64,
    /// 语言 → 音色名称
    pub voices: HashMap<String, String>,
}

impl Default for GoogleTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://texttospeech.googleapis.com".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            voices: default_voices(),
        }
    }
}

impl GoogleTtsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }
}

/// Google TTS 客户端
pub struct GoogleTtsClient {
    client: Client,
    config: GoogleTtsClientConfig,
}

impl GoogleTtsClient {
    /// 创建新的客户端
    pub fn new(config: GoogleTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        if config.api_key.as_deref().map_or(true, str::is_empty) {
            tracing::warn!("Google TTS API key is not configured, synthesis requests will fail");
        }

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/v1/text:synthesize", self.config.base_url.trim_end_matches('/'))
    }

    fn voices_url(&self) -> String {
        format!("{}/v1/voices", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, TtsError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(TtsError::MissingCredential)
    }

    fn build_body<'a>(&'a self, request: &'a SynthesisRequest) -> SynthesizeBody<'a> {
        SynthesizeBody {
            input: SynthesisInput {
                text: request.text(),
            },
            voice: VoiceSelection {
                language_code: request.language(),
                name: self.config.voices.get(request.language()).map(String::as_str),
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING,
                speaking_rate: request.rate(),
            },
        }
    }

    async fn send_once(
        &self,
        api_key: &str,
        body: &SynthesizeBody<'_>,
    ) -> Result<AudioPayload, TtsError> {
        let response = self
            .client
            .post(self.synthesize_url())
            .query(&[("key", api_key)])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(TtsError::ServiceError(format!("HTTP {}: {}", status, text)));
        }

        parse_synthesize_response(&text)
    }
}

/// 解析合成响应，要求 audioContent 存在且为合法 base64
fn parse_synthesize_response(body: &str) -> Result<AudioPayload, TtsError> {
    let response: SynthesizeResponse = serde_json::from_str(body)
        .map_err(|e| TtsError::InvalidResponse(format!("Malformed JSON: {}", e)))?;

    let content = response
        .audio_content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| TtsError::InvalidResponse("Missing audioContent".to_string()))?;

    let payload =
        AudioPayload::from_base64(content).map_err(|e| TtsError::InvalidResponse(e.to_string()))?;
    payload
        .decode_bytes()
        .map_err(|e| TtsError::InvalidResponse(format!("audioContent is not base64: {}", e)))?;

    Ok(payload)
}

#[async_trait]
impl TtsEnginePort for GoogleTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioPayload, TtsError> {
        let api_key = self.api_key()?;
        let body = self.build_body(request);

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text().len(),
            language = %request.language(),
            voice = ?body.voice.name,
            rate = request.rate(),
            "Sending TTS synthesize request"
        );

        let mut attempt = 0u32;
        loop {
            match self.send_once(api_key, &body).await {
                Ok(payload) => {
                    tracing::info!(
                        language = %request.language(),
                        audio_size = payload.estimated_bytes(),
                        attempts = attempt + 1,
                        "TTS synthesis completed"
                    );
                    return Ok(payload);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "TTS request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(
                        self.config.retry_backoff_ms * attempt as u64,
                    ))
                    .await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        match self
            .client
            .get(self.voices_url())
            .query(&[("key", api_key), ("languageCode", "fi-FI")])
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
