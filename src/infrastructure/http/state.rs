//! Application State

use std::sync::Arc;

use crate::application::TieredAudioCache;

/// 应用状态
pub struct AppState {
    pub cache: Arc<TieredAudioCache>,
}

impl AppState {
    pub fn new(cache: Arc<TieredAudioCache>) -> Self {
        Self { cache }
    }
}
