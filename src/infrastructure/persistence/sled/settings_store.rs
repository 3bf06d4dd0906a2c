//! Sled Settings Store - 运行时设置的持久化

use async_trait::async_trait;
use sled::{Db, Tree};

use crate::application::ports::{CacheError, SettingsStorePort};

const SETTINGS_TREE: &str = "settings";
const MAX_BYTES_KEY: &str = "audio_cache_max_bytes";

pub struct SledSettingsStore {
    tree: Tree,
}

impl SledSettingsStore {
    pub fn new(db: &Db) -> Result<Self, CacheError> {
        let tree = db
            .open_tree(SETTINGS_TREE)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(Self { tree })
    }
}

#[async_trait]
impl SettingsStorePort for SledSettingsStore {
    async fn load_max_bytes(&self) -> Result<Option<u64>, CacheError> {
        let Some(raw) = self
            .tree
            .get(MAX_BYTES_KEY)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes = <[u8; 8]>::try_from(raw.as_ref()).map_err(|_| {
            CacheError::SerializationError(format!("{} is not a u64", MAX_BYTES_KEY))
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    async fn save_max_bytes(&self, max_bytes: u64) -> Result<(), CacheError> {
        self.tree
            .insert(MAX_BYTES_KEY, &max_bytes.to_be_bytes()[..])
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.tree
            .flush_async()
            .await
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
