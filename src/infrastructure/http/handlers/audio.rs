//! Audio Handlers

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::infrastructure::http::dto::{ApiResponse, AudioRequest, DecodedAudioResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取音频（MP3 原样返回）
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AudioRequest>,
) -> Result<Response, ApiError> {
    let audio = state
        .cache
        .fetch_playable(&req.text, &req.lang, req.rate)
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, audio.content_type)
        .header(header::CONTENT_LENGTH, audio.data.len())
        .body(Body::from(audio.data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// 获取音频并解码，只返回流参数
pub async fn get_decoded_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AudioRequest>,
) -> Result<Json<ApiResponse<DecodedAudioResponse>>, ApiError> {
    let decoded = state
        .cache
        .fetch_decoded(&req.text, &req.lang, req.rate)
        .await?;

    Ok(Json(ApiResponse::success(DecodedAudioResponse {
        sample_rate: decoded.sample_rate,
        channels: decoded.channels,
        frames: decoded.frames(),
        duration_ms: decoded.duration_ms,
    })))
}
