pub mod base;
pub mod freight;
pub mod paperdoll;
pub mod pet;
pub mod player;
pub mod policy;

pub use base::Container;
pub use freight::RemoteStorage;
pub use paperdoll::{EquipmentContainer, PaperdollListener};
pub use pet::PetInventory;
pub use player::{BlockMode, PlayerInventory};
pub use policy::{CapacityPolicy, OwnerPolicy, PetLimits, PlayerLimits, WarehouseLimits};
