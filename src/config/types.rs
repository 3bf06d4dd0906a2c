//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::application::services::DEFAULT_MAX_MB;
use crate::infrastructure::adapters::default_voices;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 提供方配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TTS 提供方类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    Google,
    /// 返回固定音频文件，用于本地开发
    Fake,
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsProvider::Google => write!(f, "google"),
            TtsProvider::Fake => write!(f, "fake"),
        }
    }
}

/// TTS 提供方配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// Google TTS 基础 URL
    #[serde(default = "default_tts_url")]
    pub base_url: String,

    /// Google API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 瞬时错误的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 语言 → 音色名称
    #[serde(default = "default_voices")]
    pub voices: HashMap<String, String>,

    /// fake 提供方返回的音频文件
    #[serde(default = "default_fake_audio_path")]
    pub fake_audio_path: PathBuf,
}

fn default_tts_url() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_fake_audio_path() -> PathBuf {
    PathBuf::from("data/fake.mp3")
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            base_url: default_tts_url(),
            api_key: None,
            timeout_secs: default_tts_timeout(),
            max_retries: default_max_retries(),
            voices: default_voices(),
            fake_audio_path: default_fake_audio_path(),
        }
    }
}

impl TtsConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// sled 数据库目录
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// 未持久化预算时使用的默认值（MB）
    #[serde(default = "default_max_mb")]
    pub default_max_mb: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/audio-cache.sled")
}

fn default_max_mb() -> u64 {
    DEFAULT_MAX_MB
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_max_mb: default_max_mb(),
        }
    }
}

impl CacheConfig {
    pub fn default_max_bytes(&self) -> u64 {
        self.default_max_mb.saturating_mul(crate::application::services::BYTES_PER_MB)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.tts.provider, TtsProvider::Google);
        assert_eq!(config.tts.base_url, "https://texttospeech.googleapis.com");
        assert_eq!(config.cache.default_max_mb, 80);
        assert_eq!(config.cache.default_max_bytes(), 80 * 1024 * 1024);
        assert!(!config.tts.has_api_key());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        let config = TtsConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!config.has_api_key());
    }
}
