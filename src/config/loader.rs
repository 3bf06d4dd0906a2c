//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 未通过配置提供 API key 时读取的环境变量
const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SUOMEN_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SUOMEN_SERVER__PORT=8080`
/// - `SUOMEN_TTS__PROVIDER=fake`
/// - `SUOMEN_TTS__API_KEY=...`（也可以用 `GOOGLE_TTS_API_KEY`）
/// - `SUOMEN_CACHE__DEFAULT_MAX_MB=200`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.provider", "google")?
        .set_default("tts.base_url", "https://texttospeech.googleapis.com")?
        .set_default("tts.timeout_secs", 30)?
        .set_default("tts.max_retries", 2)?
        .set_default("tts.fake_audio_path", "data/fake.mp3")?
        .set_default("cache.db_path", "data/audio-cache.sled")?
        .set_default("cache.default_max_mb", 80)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: SUOMEN_TTS__BASE_URL=http://localhost:9000
    builder = builder.add_source(
        Environment::with_prefix("SUOMEN")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    if !app_config.tts.has_api_key() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            app_config.tts.api_key = Some(key);
        }
    }

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
///
/// 缺少 API key 不算错误：服务照常启动，未命中缓存的请求返回配置错误
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.provider == TtsProvider::Google && config.tts.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS base URL cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    if config.cache.db_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache database path cannot be empty".to_string(),
        ));
    }

    if config.cache.default_max_mb == 0 {
        return Err(ConfigError::ValidationError(
            "Default cache budget must be at least 1 MB".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），不输出 API key
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS Provider: {}", config.tts.provider);
    match config.tts.provider {
        TtsProvider::Google => {
            tracing::info!("TTS Base URL: {}", config.tts.base_url);
            tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
            tracing::info!("TTS Max Retries: {}", config.tts.max_retries);
            tracing::info!(
                "TTS API Key: {}",
                if config.tts.has_api_key() { "configured" } else { "missing" }
            );
        }
        TtsProvider::Fake => {
            tracing::info!("Fake Audio: {:?}", config.tts.fake_audio_path);
        }
    }
    tracing::info!("Cache Database: {:?}", config.cache.db_path);
    tracing::info!("Cache Default Budget: {} MB", config.cache.default_max_mb);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_base_url() {
        let mut config = AppConfig::default();
        config.tts.base_url = String::new();
        assert!(validate_config(&config).is_err());

        // fake 提供方不需要 URL
        config.tts.provider = TtsProvider::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_budget() {
        let mut config = AppConfig::default();
        config.cache.default_max_mb = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_api_key_is_not_fatal() {
        let mut config = AppConfig::default();
        config.tts.api_key = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suomen.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[tts]
provider = "fake"
fake_audio_path = "/tmp/moi.mp3"

[cache]
default_max_mb = 16
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.tts.provider, TtsProvider::Fake);
        assert_eq!(config.tts.fake_audio_path, std::path::PathBuf::from("/tmp/moi.mp3"));
        assert_eq!(config.cache.default_max_mb, 16);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suomen.toml");
        std::fs::write(&path, "[tts]\nprovider = \"azure\"\n").unwrap();

        assert!(matches!(
            load_config_from_path(Some(&path)),
            Err(ConfigError::ParseError(_))
        ));
    }
}
