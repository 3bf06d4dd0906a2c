//! Tiered Audio Cache - 两级语音缓存
//!
//! 取数顺序: 内存层 → 持久层 → 提供方
//!
//! - 内存层命中直接返回，不更新时间戳（内存层不参与 LRU）
//! - 持久层命中后 touch 时间戳，并回填内存层
//! - 全部未命中才调用提供方，成功后写入两层（持久层写入时淘汰）
//!
//! 持久层的任何读写失败都只记录日志：读失败当作未命中，写失败当作本次没缓存。
//! 只有提供方失败（或未配置凭据）会返回错误。

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{CacheBudget, InFlightRegistry};
use crate::application::error::AudioCacheError;
use crate::application::ports::{
    AudioDecoderPort, AudioStorePort, DecodedAudio, PlayableAudio, TtsEnginePort,
};
use crate::domain::audio::{AudioPayload, CacheKey, SynthesisRequest};

/// 播放端使用的 MIME 类型（提供方固定返回 MP3）
const PLAYABLE_CONTENT_TYPE: &str = "audio/mpeg";

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 持久层估算体积
    pub bytes: u64,
    /// 持久层条目数
    pub count: usize,
    /// 持久层预算
    pub max: u64,
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub misses: u64,
    pub provider_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    misses: AtomicU64,
    provider_failures: AtomicU64,
}

pub struct TieredAudioCache {
    memory: DashMap<CacheKey, AudioPayload>,
    store: Arc<dyn AudioStorePort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    decoder: Arc<dyn AudioDecoderPort>,
    budget: CacheBudget,
    in_flight: InFlightRegistry,
    counters: Counters,
}

impl TieredAudioCache {
    pub fn new(
        store: Arc<dyn AudioStorePort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        decoder: Arc<dyn AudioDecoderPort>,
        budget: CacheBudget,
    ) -> Self {
        tracing::info!(max_bytes = budget.max_bytes(), "TieredAudioCache initialized");
        Self {
            memory: DashMap::new(),
            store,
            tts_engine,
            decoder,
            budget,
            in_flight: InFlightRegistry::new(),
            counters: Counters::default(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 获取编码后的音频负载
    pub async fn fetch_payload(
        &self,
        text: &str,
        language: &str,
        rate: f64,
    ) -> Result<AudioPayload, AudioCacheError> {
        let request = SynthesisRequest::new(text, language, rate)?;
        self.fetch(&request).await
    }

    /// 获取并解码为 PCM 样本
    pub async fn fetch_decoded(
        &self,
        text: &str,
        language: &str,
        rate: f64,
    ) -> Result<DecodedAudio, AudioCacheError> {
        let payload = self.fetch_payload(text, language, rate).await?;
        let bytes = payload.decode_bytes()?;
        Ok(self.decoder.decode(&bytes).await?)
    }

    /// 获取可直接播放的音频（只做 base64 解码，不解码成样本）
    pub async fn fetch_playable(
        &self,
        text: &str,
        language: &str,
        rate: f64,
    ) -> Result<PlayableAudio, AudioCacheError> {
        let payload = self.fetch_payload(text, language, rate).await?;
        Ok(PlayableAudio {
            data: payload.decode_bytes()?,
            content_type: PLAYABLE_CONTENT_TYPE,
        })
    }

    /// 按已校验的请求取数
    pub async fn fetch(&self, request: &SynthesisRequest) -> Result<AudioPayload, AudioCacheError> {
        let key = request.cache_key();

        if let Some(payload) = self.memory_lookup(&key) {
            return Ok(payload);
        }

        let _flight = self.in_flight.acquire(key.as_str()).await;

        // 等待期间同 key 的请求可能已经写回
        if let Some(payload) = self.memory_lookup(&key) {
            return Ok(payload);
        }

        if let Some(payload) = self.persistent_lookup(&key).await {
            self.memory.insert(key, payload.clone());
            return Ok(payload);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            cache_key = %key,
            language = %request.language(),
            rate = request.rate(),
            "Cache miss, calling TTS provider"
        );

        let payload = match self.tts_engine.synthesize(request).await {
            Ok(payload) => payload,
            Err(e) => {
                self.counters.provider_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(cache_key = %key, error = %e, "TTS provider call failed");
                return Err(e.into());
            }
        };

        self.memory.insert(key.clone(), payload.clone());
        self.populate_store(&key, &payload).await;

        Ok(payload)
    }

    fn memory_lookup(&self, key: &CacheKey) -> Option<AudioPayload> {
        let payload = self.memory.get(key).map(|entry| entry.value().clone())?;
        self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(cache_key = %key, "Memory tier hit");
        Some(payload)
    }

    async fn persistent_lookup(&self, key: &CacheKey) -> Option<AudioPayload> {
        match self.store.get(key).await {
            Ok(Some(stored)) => {
                if let Err(e) = self.store.touch(key).await {
                    tracing::warn!(cache_key = %key, error = %e, "Failed to touch cache entry");
                }
                self.counters.persistent_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    cache_key = %key,
                    size_bytes = stored.payload.estimated_bytes(),
                    "Persistent tier hit"
                );
                Some(stored.payload)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Persistent tier read failed, treating as miss");
                None
            }
        }
    }

    async fn populate_store(&self, key: &CacheKey, payload: &AudioPayload) {
        let max_bytes = self.budget.max_bytes();
        match self.store.put(key, payload, max_bytes).await {
            Ok(report) if !report.evicted.is_empty() => {
                tracing::info!(
                    cache_key = %key,
                    evicted = report.evicted.len(),
                    freed_bytes = report.freed_bytes,
                    max_bytes = max_bytes,
                    "Audio cached with eviction"
                );
            }
            Ok(_) => {
                tracing::debug!(
                    cache_key = %key,
                    size_bytes = payload.estimated_bytes(),
                    "Audio cached"
                );
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Failed to cache audio");
            }
        }
    }

    // ========== 诊断 ==========

    pub async fn stats(&self) -> Result<CacheStats, AudioCacheError> {
        let usage = self.store.usage().await?;
        Ok(CacheStats {
            bytes: usage.bytes,
            count: usage.count,
            max: self.budget.max_bytes(),
            memory_entries: self.memory.len(),
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.counters.persistent_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            provider_failures: self.counters.provider_failures.load(Ordering::Relaxed),
        })
    }

    /// 清空两层缓存
    pub async fn clear(&self) -> Result<(), AudioCacheError> {
        self.memory.clear();
        self.store.clear().await?;
        tracing::info!("Audio cache cleared");
        Ok(())
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn memory_contains(&self, key: &CacheKey) -> bool {
        self.memory.contains_key(key)
    }

    /// 从内存层移除单个 key，持久层不受影响
    pub fn evict_memory(&self, key: &CacheKey) -> bool {
        self.memory.remove(key).is_some()
    }

    pub async fn flush(&self) -> Result<(), AudioCacheError> {
        Ok(self.store.flush().await?)
    }

    // ========== 预算 ==========

    pub fn budget(&self) -> &CacheBudget {
        &self.budget
    }

    pub fn max_bytes(&self) -> u64 {
        self.budget.max_bytes()
    }

    pub async fn set_max_bytes(&self, max_bytes: u64) -> Result<(), AudioCacheError> {
        self.budget.set_max_bytes(max_bytes).await
    }

    pub async fn set_max_megabytes(&self, megabytes: u64) -> Result<(), AudioCacheError> {
        self.budget.set_max_megabytes(megabytes).await
    }

    pub async fn reload_budget(&self) -> u64 {
        self.budget.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CacheError, DecodeError, EvictionReport, SettingsStorePort, StoreUsage, StoredAudio,
        TtsError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// 所有操作都失败的持久层
    struct BrokenStore;

    #[async_trait]
    impl AudioStorePort for BrokenStore {
        async fn get(&self, _key: &CacheKey) -> Result<Option<StoredAudio>, CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
        async fn put(
            &self,
            _key: &CacheKey,
            _payload: &AudioPayload,
            _max_bytes: u64,
        ) -> Result<EvictionReport, CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
        async fn touch(&self, _key: &CacheKey) -> Result<bool, CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
        async fn remove(&self, _key: &CacheKey) -> Result<bool, CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
        async fn usage(&self) -> Result<StoreUsage, CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Err(CacheError::DatabaseError("disk gone".into()))
        }
    }

    /// 能读出条目但刷新访问时间失败的持久层
    struct TouchFailingStore {
        payload: AudioPayload,
    }

    #[async_trait]
    impl AudioStorePort for TouchFailingStore {
        async fn get(&self, _key: &CacheKey) -> Result<Option<StoredAudio>, CacheError> {
            Ok(Some(StoredAudio {
                payload: self.payload.clone(),
                last_access: 1,
                created_at: 1,
            }))
        }
        async fn put(
            &self,
            _key: &CacheKey,
            _payload: &AudioPayload,
            _max_bytes: u64,
        ) -> Result<EvictionReport, CacheError> {
            Ok(EvictionReport::default())
        }
        async fn touch(&self, _key: &CacheKey) -> Result<bool, CacheError> {
            Err(CacheError::DatabaseError("read-only".into()))
        }
        async fn remove(&self, _key: &CacheKey) -> Result<bool, CacheError> {
            Ok(false)
        }
        async fn usage(&self) -> Result<StoreUsage, CacheError> {
            Ok(StoreUsage::default())
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    struct NoSettings;

    #[async_trait]
    impl SettingsStorePort for NoSettings {
        async fn load_max_bytes(&self) -> Result<Option<u64>, CacheError> {
            Ok(None)
        }
        async fn save_max_bytes(&self, _max_bytes: u64) -> Result<(), CacheError> {
            Ok(())
        }
    }

    struct CountingEngine {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TtsEnginePort for CountingEngine {
        async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioPayload, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TtsError::NetworkError("connection refused".into()));
            }
            Ok(AudioPayload::from_audio_bytes(request.text().as_bytes()))
        }
    }

    struct NullDecoder;

    #[async_trait]
    impl AudioDecoderPort for NullDecoder {
        async fn decode(&self, _data: &[u8]) -> Result<DecodedAudio, DecodeError> {
            Err(DecodeError::InvalidInput("not audio".into()))
        }
    }

    async fn cache_with(engine: Arc<CountingEngine>) -> TieredAudioCache {
        let budget = CacheBudget::load(Arc::new(NoSettings), 1000).await.unwrap();
        TieredAudioCache::new(Arc::new(BrokenStore), engine, Arc::new(NullDecoder), budget)
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_to_provider() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = cache_with(engine.clone()).await;

        let payload = cache.fetch_payload("kissa", "fi-FI", 1.0).await.unwrap();
        assert_eq!(payload.decode_bytes().unwrap(), b"kissa");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        // 持久层写入失败，但内存层仍然生效
        cache.fetch_payload("kissa", "fi-FI", 1.0).await.unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_surfaced() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = cache_with(engine).await;

        let err = cache.fetch_payload("koira", "fi-FI", 1.0).await.unwrap_err();
        assert!(matches!(err, AudioCacheError::Provider(TtsError::NetworkError(_))));
        assert_eq!(cache.memory_len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_provider() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = cache_with(engine.clone()).await;

        let err = cache.fetch_payload("", "fi-FI", 1.0).await.unwrap_err();
        assert!(matches!(err, AudioCacheError::InvalidRequest(_)));
        let err = cache.fetch_payload("moi", "fi-FI", 0.0).await.unwrap_err();
        assert!(matches!(err, AudioCacheError::InvalidRequest(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_cache_intact() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = cache_with(engine.clone()).await;

        let err = cache.fetch_decoded("talo", "fi-FI", 1.0).await.unwrap_err();
        assert!(matches!(err, AudioCacheError::Decode(_)));
        assert_eq!(cache.memory_len(), 1);

        let playable = cache.fetch_playable("talo", "fi-FI", 1.0).await.unwrap();
        assert_eq!(playable.data, b"talo");
        assert_eq!(playable.content_type, "audio/mpeg");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stats_surface_storage_errors() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = cache_with(engine).await;
        assert!(matches!(cache.stats().await, Err(AudioCacheError::Storage(_))));
    }

    #[tokio::test]
    async fn test_touch_failure_still_serves_persistent_hit() {
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let stored = AudioPayload::from_audio_bytes(b"stored audio");
        let store = Arc::new(TouchFailingStore {
            payload: stored.clone(),
        });
        let budget = CacheBudget::load(Arc::new(NoSettings), 1000).await.unwrap();
        let cache = TieredAudioCache::new(store, engine.clone(), Arc::new(NullDecoder), budget);

        let payload = cache.fetch_payload("lintu", "fi-FI", 1.0).await.unwrap();
        assert_eq!(payload, stored);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.persistent_hits, 1);
        assert_eq!(stats.misses, 0);
    }
}
