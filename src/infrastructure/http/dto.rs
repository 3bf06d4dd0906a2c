//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::services::BYTES_PER_MB;
use crate::application::{CacheBudget, CacheStats};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Audio DTOs
// ============================================================================

fn default_lang() -> String {
    "fi-FI".to_string()
}

fn default_rate() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct AudioRequest {
    pub text: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_rate")]
    pub rate: f64,
}

#[derive(Debug, Serialize)]
pub struct DecodedAudioResponse {
    pub sample_rate: u32,
    pub channels: u8,
    pub frames: usize,
    pub duration_ms: u64,
}

// ============================================================================
// Cache DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub bytes: u64,
    pub count: usize,
    pub max: u64,
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub misses: u64,
    pub provider_failures: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            bytes: stats.bytes,
            count: stats.count,
            max: stats.max,
            memory_entries: stats.memory_entries,
            memory_hits: stats.memory_hits,
            persistent_hits: stats.persistent_hits,
            misses: stats.misses,
            provider_failures: stats.provider_failures,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub max_bytes: u64,
    pub max_mb: f64,
    pub default_max_bytes: u64,
}

impl From<&CacheBudget> for BudgetResponse {
    fn from(budget: &CacheBudget) -> Self {
        let max_bytes = budget.max_bytes();
        Self {
            max_bytes,
            max_mb: max_bytes as f64 / BYTES_PER_MB as f64,
            default_max_bytes: budget.default_max_bytes(),
        }
    }
}

/// 设置预算，`max_bytes` 与 `max_mb` 二选一
#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    #[serde(default)]
    pub max_bytes: Option<u64>,
    #[serde(default)]
    pub max_mb: Option<u64>,
}
