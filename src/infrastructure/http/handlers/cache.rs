//! Cache Handlers - 诊断与预算

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::{
    ApiResponse, BudgetResponse, CacheStatsResponse, Empty, SetBudgetRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CacheStatsResponse>>, ApiError> {
    let stats = state.cache.stats().await?;
    Ok(Json(ApiResponse::success(stats.into())))
}

pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.cache.clear().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn get_budget(State(state): State<Arc<AppState>>) -> Json<ApiResponse<BudgetResponse>> {
    Json(ApiResponse::success(state.cache.budget().into()))
}

pub async fn set_budget(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetBudgetRequest>,
) -> Result<Json<ApiResponse<BudgetResponse>>, ApiError> {
    match (req.max_bytes, req.max_mb) {
        (Some(bytes), None) => state.cache.set_max_bytes(bytes).await?,
        (None, Some(mb)) => state.cache.set_max_megabytes(mb).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of max_bytes or max_mb is required".to_string(),
            ))
        }
    }
    Ok(Json(ApiResponse::success(state.cache.budget().into())))
}

/// 从持久化设置重新读取预算
pub async fn reload_budget(State(state): State<Arc<AppState>>) -> Json<ApiResponse<BudgetResponse>> {
    state.cache.reload_budget().await;
    Json(ApiResponse::success(state.cache.budget().into()))
}
