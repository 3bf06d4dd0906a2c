//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                 GET   健康检查
//! - /api/audio                POST  获取音频（audio/mpeg）
//! - /api/audio/decoded        POST  获取音频并解码，返回流参数
//! - /api/cache/stats          GET   缓存统计
//! - /api/cache/clear          POST  清空两层缓存
//! - /api/cache/budget         GET   查看预算
//! - /api/cache/budget         POST  修改预算（max_bytes 或 max_mb）
//! - /api/cache/budget/reload  POST  重新加载持久化的预算

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/audio", post(handlers::get_audio))
        .route("/audio/decoded", post(handlers::get_decoded_audio))
        .nest("/cache", cache_routes())
}

/// Cache 路由
fn cache_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(handlers::cache_stats))
        .route("/clear", post(handlers::clear_cache))
        .route("/budget", get(handlers::get_budget).post(handlers::set_budget))
        .route("/budget/reload", post(handlers::reload_budget))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CacheBudget, TieredAudioCache};
    use crate::infrastructure::adapters::{FakeTtsClient, SymphoniaDecoder};
    use crate::infrastructure::persistence::{SledAudioStore, SledSettingsStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    const FAKE_MP3: &[u8] = b"ID3\x04\x00fake mp3 frames";

    struct TestApp {
        router: Router,
        engine: Arc<FakeTtsClient>,
        _dir: tempfile::TempDir,
    }

    async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path().join("cache.sled")).unwrap();
        let store = Arc::new(SledAudioStore::new(db.clone()).unwrap());
        let settings = Arc::new(SledSettingsStore::new(&db).unwrap());
        let budget = CacheBudget::load(settings, 1024 * 1024).await.unwrap();

        let engine = Arc::new(FakeTtsClient::from_audio(FAKE_MP3));
        let cache = TieredAudioCache::new(store, engine.clone(), Arc::new(SymphoniaDecoder::new()), budget);

        let router = create_routes().with_state(Arc::new(AppState::new(cache.arc())));
        TestApp {
            router,
            engine,
            _dir: dir,
        }
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let response = app
            .router
            .oneshot(empty_request(Method::GET, "/api/ping"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_audio_returns_mpeg_and_caches() {
        let app = test_app().await;

        for _ in 0..2 {
            let response = app
                .router
                .clone()
                .oneshot(json_request(Method::POST, "/api/audio", json!({"text": "Hyvää yötä"})))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], FAKE_MP3);
        }
        assert_eq!(app.engine.calls(), 1);

        let response = app
            .router
            .oneshot(empty_request(Method::GET, "/api/cache/stats"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["misses"], 1);
        assert_eq!(body["data"]["memory_hits"], 1);
    }

    #[tokio::test]
    async fn test_audio_rejects_empty_text() {
        let app = test_app().await;
        let response = app
            .router
            .oneshot(json_request(Method::POST, "/api/audio", json!({"text": "", "lang": "fi-FI"})))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["errno"], 400);
        assert_eq!(app.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_unavailable() {
        let app = test_app().await;
        app.engine.set_failing(true);

        let response = app
            .router
            .oneshot(json_request(Method::POST, "/api/audio", json!({"text": "moi"})))
            .await
            .unwrap();

        assert_eq!(body_json(response).await["errno"], 503);
    }

    #[tokio::test]
    async fn test_decode_failure_maps_to_internal() {
        let app = test_app().await;
        let response = app
            .router
            .oneshot(json_request(Method::POST, "/api/audio/decoded", json!({"text": "moi"})))
            .await
            .unwrap();

        // 假数据不是合法 MP3
        assert_eq!(body_json(response).await["errno"], 500);
    }

    #[tokio::test]
    async fn test_budget_roundtrip_and_clear() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request(Method::POST, "/api/cache/budget", json!({"max_mb": 2})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["max_bytes"], 2 * 1024 * 1024);

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/cache/budget",
                json!({"max_mb": 2, "max_bytes": 10}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["errno"], 400);

        let response = app
            .router
            .clone()
            .oneshot(empty_request(Method::POST, "/api/cache/budget/reload"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"]["max_bytes"], 2 * 1024 * 1024);

        app.router
            .clone()
            .oneshot(json_request(Method::POST, "/api/audio", json!({"text": "kiitos"})))
            .await
            .unwrap();
        let response = app
            .router
            .clone()
            .oneshot(empty_request(Method::POST, "/api/cache/clear"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["errno"], 0);

        let response = app
            .router
            .oneshot(empty_request(Method::GET, "/api/cache/stats"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["bytes"], 0);
        assert_eq!(body["data"]["count"], 0);
        assert_eq!(body["data"]["memory_entries"], 0);
    }
}
