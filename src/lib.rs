pub mod catalog;
pub mod config;
pub mod containers;
pub mod error;
pub mod models;
pub mod persist;

// Convenient re-exports (so call sites can do `itemvault::PlayerInventory`, etc.)
pub use catalog::{StaticCatalog, TemplateCatalog};
pub use config::InventoryConfig;
pub use containers::{
    Container, EquipmentContainer, PaperdollListener, PetInventory, PlayerInventory,
    RemoteStorage,
};
pub use error::{InvResult, InventoryError};
pub use models::item::{BaseLocation, ItemLocation, ItemStack};
pub use models::template::{BodyPart, ItemTemplate, Slot, TemplateKind, WornSet};
pub use models::types::{BranchId, InstanceId, OwnerId, TemplateId};
pub use persist::{ItemPersistence, ItemRecord, MemoryPersistence, PersistError};
