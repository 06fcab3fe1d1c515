use crate::models::types::{InstanceId, TemplateId};
use crate::persist::PersistError;
use thiserror::Error;

pub type InvResult<T> = Result<T, InventoryError>;

/// Failure taxonomy of the container/equip engine. Every variant is
/// recoverable: callers translate a failed result into their own messaging,
/// nothing here crosses the API boundary as a panic.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Destroy/transfer asked for more than the stack holds.
    #[error("insufficient quantity: have {have}, need {need}")]
    InsufficientQuantity { have: u32, need: u32 },

    /// The owner's slot budget (general or quest) is full.
    #[error("capacity exceeded: {used}/{limit} slots used")]
    CapacityExceeded { used: u32, limit: u32 },

    #[error("weight exceeded: {current} + {added} over limit {limit}")]
    WeightExceeded { current: u64, added: u64, limit: u64 },

    /// Template's body-part mask maps to no known paperdoll slot.
    #[error("no equip slot for template {0}")]
    InvalidSlotForTemplate(TemplateId),

    /// Instance vanished between lookup and lock acquisition.
    #[error("concurrent removal of instance {0}")]
    ConcurrentRemoval(InstanceId),

    /// Block-list mode, all-dress slot lock, or an equipped stack that must
    /// be unequipped first.
    #[error("blocked by policy: {0}")]
    BlockedByPolicy(&'static str),

    #[error("unknown template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Persistence(#[from] PersistError),
}
