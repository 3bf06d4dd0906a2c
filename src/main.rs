//! suomen-audio - 两级 TTS 音频缓存服务
//!
//! 内存层 → sled 持久层 → Google TTS，通过 HTTP 对外提供音频

use std::sync::Arc;

use suomen_audio::application::{CacheBudget, TieredAudioCache, TtsEnginePort};
use suomen_audio::config::{load_config, print_config, AppConfig, TtsProvider};
use suomen_audio::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, GoogleTtsClient, GoogleTtsClientConfig, SymphoniaDecoder,
};
use suomen_audio::infrastructure::http::{AppState, HttpServer};
use suomen_audio::infrastructure::persistence::{
    open_database, SledAudioStore, SledCacheConfig, SledSettingsStore,
};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},suomen_audio={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn create_tts_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    let engine: Arc<dyn TtsEnginePort> = match config.tts.provider {
        TtsProvider::Google => {
            let tts_config = GoogleTtsClientConfig {
                base_url: config.tts.base_url.clone(),
                api_key: config.tts.api_key.clone(),
                timeout_secs: config.tts.timeout_secs,
                max_retries: config.tts.max_retries,
                voices: config.tts.voices.clone(),
                ..Default::default()
            };
            Arc::new(GoogleTtsClient::new(tts_config)?)
        }
        TtsProvider::Fake => {
            let tts_config = FakeTtsClientConfig {
                audio_file_path: config.tts.fake_audio_path.clone(),
                ..Default::default()
            };
            Arc::new(FakeTtsClient::new(tts_config)?)
        }
    };
    Ok(engine)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("suomen-audio - tiered TTS audio cache");
    print_config(&config);

    if let Some(parent) = config.cache.db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 持久层与预算设置共用一个 sled 数据库
    let db = open_database(&SledCacheConfig {
        db_path: config.cache.db_path.clone(),
    })?;
    let store = Arc::new(SledAudioStore::new(db.clone())?);
    let settings = Arc::new(SledSettingsStore::new(&db)?);
    let budget = CacheBudget::load(settings, config.cache.default_max_bytes()).await?;

    let tts_engine = create_tts_engine(&config)?;
    if !tts_engine.health_check().await {
        tracing::warn!(provider = %config.tts.provider, "TTS provider is not reachable, only cached audio will be served");
    }

    let cache = TieredAudioCache::new(store, tts_engine, Arc::new(SymphoniaDecoder::new()), budget).arc();

    let server = HttpServer::new(config.server.clone(), AppState::new(cache.clone()));

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    cache.flush().await?;
    tracing::info!("Server shutdown complete");

    Ok(())
}
