use crate::catalog::TemplateCatalog;
use crate::containers::base::Container;
use crate::containers::paperdoll::EquipmentContainer;
use crate::containers::player::PlayerInventory;
use crate::containers::policy::{OwnerPolicy, PetLimits};
use crate::error::{InvResult, InventoryError};
use crate::models::item::{BaseLocation, ItemStack};
use crate::models::types::{InstanceId, OwnerId, TemplateId};
use crate::persist::ItemPersistence;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Equipment container carried by a summoned pet. Ceilings come from the
/// pet's own template via [`PetLimits`]; on release the whole content moves
/// back to the owning player.
pub struct PetInventory {
    equipment: EquipmentContainer,
    released: AtomicBool,
}

impl PetInventory {
    pub fn new(
        pet_id: OwnerId,
        limits: PetLimits,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> Self {
        Self {
            equipment: EquipmentContainer::new(
                pet_id,
                BaseLocation::PetInventory,
                OwnerPolicy::Pet(limits),
                catalog,
                persist,
            ),
            released: AtomicBool::new(false),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.equipment.owner_id()
    }

    pub fn container(&self) -> &Container {
        self.equipment.container()
    }

    pub fn equipment(&self) -> &EquipmentContainer {
        &self.equipment
    }

    pub fn restore(&self) -> InvResult<Vec<Arc<ItemStack>>> {
        self.equipment.restore()
    }

    pub fn add_item(
        &self,
        reason: &str,
        template_id: TemplateId,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.container().add_item(reason, template_id, count, actor)
    }

    pub fn destroy_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.equipment.destroy_item(reason, stack, count, actor)
    }

    pub fn transfer_item(
        &self,
        reason: &str,
        instance_id: InstanceId,
        count: u32,
        dest: &Container,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.container()
            .transfer_item(reason, instance_id, count, dest, actor)
    }

    /// Release teardown: unequips everything, then moves every stack into the
    /// owning player's container. Runs at most once even under concurrent
    /// release requests; a failed move re-arms the guard so the caller can
    /// retry after freeing space, with the unmoved stacks still held here.
    pub fn delete_me(&self, reason: &str, owner: &PlayerInventory) -> InvResult<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.equipment.unequip_all();

        for item in self.container().items().iter() {
            let count = item.count();
            if count == 0 {
                continue;
            }
            match self.container().transfer_item(
                reason,
                item.instance_id(),
                count,
                owner.container(),
                Some(owner.owner_id()),
            ) {
                Ok(_) => {}
                Err(InventoryError::ConcurrentRemoval(_)) => {}
                Err(err) => {
                    self.released.store(false, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
