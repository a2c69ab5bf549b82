//! Repository port traits for layout storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetwright_domain::EntityId;

use super::error::RepoError;

/// A persisted sheet layout, as stored on its owning entity or template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLayout {
    pub entity_id: EntityId,
    /// Root component document of the layout tree.
    pub layout: Value,
    pub saved_at: DateTime<Utc>,
}

// =============================================================================
// Layout Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LayoutRepo: Send + Sync {
    async fn load(&self, entity_id: EntityId) -> Result<Option<StoredLayout>, RepoError>;
    /// Replaces the whole layout of `entity_id`. Returns the stored record.
    async fn save(&self, entity_id: EntityId, layout: &Value) -> Result<StoredLayout, RepoError>;
    async fn delete(&self, entity_id: EntityId) -> Result<(), RepoError>;
}
