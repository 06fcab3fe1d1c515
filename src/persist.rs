use crate::models::item::{BaseLocation, ItemLocation};
use crate::models::types::{InstanceId, OwnerId, TemplateId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("row not found: {0}")]
    NotFound(InstanceId),

    #[error("row corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Durable row for one item instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub instance_id: InstanceId,
    pub owner_id: OwnerId,
    pub template_id: TemplateId,
    pub count: u32,
    pub enchant: u32,
    pub location: ItemLocation,
    pub custom: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Persistence port the container family writes through.
///
/// Upserts are fire-and-forget from the engine's point of view: a failure is
/// logged and the in-memory instance stays authoritative. Deletes are
/// synchronous and their result propagates, because un-deleting a removed
/// item on crash recovery is not acceptable.
pub trait ItemPersistence: Send + Sync {
    fn upsert(&self, record: &ItemRecord) -> PersistResult<()>;

    fn delete(&self, instance_id: InstanceId) -> PersistResult<()>;

    /// All rows for one owner whose location sits in the given container
    /// family. Called once at owner activation.
    fn restore(&self, owner_id: OwnerId, base: BaseLocation) -> PersistResult<Vec<ItemRecord>>;
}

/// In-memory persistence backend for tests and standalone tooling.
#[derive(Default)]
pub struct MemoryPersistence {
    rows: DashMap<InstanceId, ItemRecord>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<ItemRecord> {
        self.rows.get(&instance_id).map(|r| r.clone())
    }
}

impl ItemPersistence for MemoryPersistence {
    fn upsert(&self, record: &ItemRecord) -> PersistResult<()> {
        let mut row = record.clone();
        if let Some(existing) = self.rows.get(&record.instance_id) {
            row.created_at = existing.created_at;
        }
        self.rows.insert(row.instance_id, row);
        Ok(())
    }

    fn delete(&self, instance_id: InstanceId) -> PersistResult<()> {
        self.rows.remove(&instance_id);
        Ok(())
    }

    fn restore(&self, owner_id: OwnerId, base: BaseLocation) -> PersistResult<Vec<ItemRecord>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.owner_id == owner_id && r.location.base() == Some(base))
            .map(|r| r.clone())
            .collect())
    }
}
