//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码错误日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 超过该耗时的成功请求记录为 info（通常意味着调用了提供方）
const SLOW_REQUEST_MS: u128 = 500;

/// 请求日志中间件
///
/// 4xx/5xx 记录 warn/error；业务错误（errno != 0）在 ApiError::into_response() 中记录
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms,
            "HTTP client error"
        );
    } else if elapsed_ms >= SLOW_REQUEST_MS {
        tracing::info!(method = %method, uri = %uri, elapsed_ms = elapsed_ms, "Slow request");
    } else {
        tracing::debug!(method = %method, uri = %uri, elapsed_ms = elapsed_ms, "Request completed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    fn create_test_router() -> Router {
        Router::new()
            .route("/api/ping", get(|| async { "pong" }))
            .route("/api/audio", post(|| async { StatusCode::UNPROCESSABLE_ENTITY }))
            .route("/api/cache/stats", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_middleware_passes_responses_through() {
        assert_eq!(status_of("GET", "/api/ping").await, StatusCode::OK);
        assert_eq!(status_of("POST", "/api/audio").await, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_of("GET", "/api/cache/stats").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of("GET", "/missing").await, StatusCode::NOT_FOUND);
    }
}
