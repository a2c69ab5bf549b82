//! Layout storage adapters.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sheetwright_domain::EntityId;

use crate::infrastructure::ports::{ClockPort, LayoutRepo, RepoError, StoredLayout};

/// In-process layout storage. Layouts are lost when the process exits.
pub struct InMemoryLayoutRepo {
    layouts: DashMap<EntityId, StoredLayout>,
    clock: Arc<dyn ClockPort>,
}

impl InMemoryLayoutRepo {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            layouts: DashMap::new(),
            clock,
        }
    }
}

#[async_trait]
impl LayoutRepo for InMemoryLayoutRepo {
    async fn load(&self, entity_id: EntityId) -> Result<Option<StoredLayout>, RepoError> {
        Ok(self.layouts.get(&entity_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, entity_id: EntityId, layout: &Value) -> Result<StoredLayout, RepoError> {
        let stored = StoredLayout {
            entity_id,
            layout: layout.clone(),
            saved_at: self.clock.now(),
        };
        self.layouts.insert(entity_id, stored.clone());
        tracing::debug!(entity_id = %entity_id, "Layout saved in memory");
        Ok(stored)
    }

    async fn delete(&self, entity_id: EntityId) -> Result<(), RepoError> {
        self.layouts
            .remove(&entity_id)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("Layout", entity_id))
    }
}

/// One JSON file per entity under a directory.
pub struct JsonFileLayoutRepo {
    dir: PathBuf,
    clock: Arc<dyn ClockPort>,
}

impl JsonFileLayoutRepo {
    /// Opens (and creates if needed) the layout directory.
    pub async fn new(dir: impl AsRef<Path>, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RepoError::storage("open_layout_dir", e))?;
        Ok(Self { dir, clock })
    }

    fn path_for(&self, entity_id: EntityId) -> PathBuf {
        self.dir.join(format!("{}.json", entity_id))
    }
}

#[async_trait]
impl LayoutRepo for JsonFileLayoutRepo {
    async fn load(&self, entity_id: EntityId) -> Result<Option<StoredLayout>, RepoError> {
        let path = self.path_for(entity_id);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepoError::storage("load_layout", e)),
        };
        let stored = serde_json::from_str(&json).map_err(RepoError::serialization)?;
        tracing::debug!(entity_id = %entity_id, path = %path.display(), "Layout loaded");
        Ok(Some(stored))
    }

    async fn save(&self, entity_id: EntityId, layout: &Value) -> Result<StoredLayout, RepoError> {
        let stored = StoredLayout {
            entity_id,
            layout: layout.clone(),
            saved_at: self.clock.now(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(RepoError::serialization)?;

        // Write then rename so readers never see a half-written layout.
        let path = self.path_for(entity_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RepoError::storage("save_layout", e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| RepoError::storage("save_layout", e))?;

        tracing::debug!(entity_id = %entity_id, path = %path.display(), "Layout saved");
        Ok(stored)
    }

    async fn delete(&self, entity_id: EntityId) -> Result<(), RepoError> {
        match tokio::fs::remove_file(self.path_for(entity_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RepoError::not_found("Layout", entity_id))
            }
            Err(e) => Err(RepoError::storage("delete_layout", e)),
        }
    }
}
