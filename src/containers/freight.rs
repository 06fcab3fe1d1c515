use crate::catalog::TemplateCatalog;
use crate::config::InventoryConfig;
use crate::containers::base::Container;
use crate::containers::policy::{OwnerPolicy, WarehouseLimits};
use crate::error::{InvResult, InventoryError};
use crate::models::item::{BaseLocation, ItemLocation, ItemStack};
use crate::models::types::{BranchId, InstanceId, OwnerId};
use crate::persist::ItemPersistence;
use std::sync::Arc;

/// Branch-partitioned remote storage. One container holds the owner's rows
/// for every branch; only the active branch is visible or reachable, and
/// deposits tag each stack with the branch it went in at.
pub struct RemoteStorage {
    container: Container,
}

impl RemoteStorage {
    pub fn new(
        owner_id: OwnerId,
        cfg: &InventoryConfig,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> Self {
        Self {
            container: Container::new(
                owner_id,
                BaseLocation::Freight,
                OwnerPolicy::Warehouse(WarehouseLimits {
                    slots: cfg.warehouse_slot_limit,
                }),
                catalog,
                persist,
            ),
        }
    }

    /// Load-and-return construction for flows that need the stored rows
    /// without a live owner session, such as delivery fees or offline audits.
    pub fn quick_restore(
        owner_id: OwnerId,
        cfg: &InventoryConfig,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> InvResult<Self> {
        let storage = Self::new(owner_id, cfg, catalog, persist);
        storage.container.restore()?;
        Ok(storage)
    }

    pub fn owner_id(&self) -> OwnerId {
        self.container.owner_id()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn restore(&self) -> InvResult<Vec<Arc<ItemStack>>> {
        self.container.restore()
    }

    pub fn set_branch(&self, branch: BranchId) {
        self.container.set_active_branch(Some(branch));
    }

    pub fn clear_branch(&self) {
        self.container.set_active_branch(None);
    }

    pub fn branch(&self) -> Option<BranchId> {
        self.container.active_branch()
    }

    /// Stacks stored at the active branch. Empty when no branch is selected.
    pub fn items(&self) -> Vec<Arc<ItemStack>> {
        let Some(branch) = self.container.active_branch() else {
            return Vec::new();
        };
        self.container
            .items()
            .iter()
            .filter(|e| {
                e.count() > 0
                    && e.location() == ItemLocation::Remote(BaseLocation::Freight, branch)
            })
            .cloned()
            .collect()
    }

    pub fn size(&self) -> usize {
        self.items().len()
    }

    pub fn deposit(
        &self,
        reason: &str,
        from: &Container,
        instance_id: InstanceId,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        if self.container.active_branch().is_none() {
            return Err(InventoryError::BlockedByPolicy("no branch selected"));
        }
        from.transfer_item(reason, instance_id, count, &self.container, actor)
    }

    pub fn withdraw(
        &self,
        reason: &str,
        instance_id: InstanceId,
        count: u32,
        dest: &Container,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        let Some(branch) = self.container.active_branch() else {
            return Err(InventoryError::BlockedByPolicy("no branch selected"));
        };
        let Some(item) = self.container.item_by_instance(instance_id) else {
            return Err(InventoryError::ConcurrentRemoval(instance_id));
        };
        if item.location() != ItemLocation::Remote(BaseLocation::Freight, branch) {
            return Err(InventoryError::BlockedByPolicy(
                "item stored at another branch",
            ));
        }
        self.container.transfer_item(reason, instance_id, count, dest, actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::testkit as tk;

    const BRANCH_A: BranchId = BranchId(1);
    const BRANCH_B: BranchId = BranchId(2);

    #[test]
    fn deposit_requires_a_selected_branch() {
        let (owner, persist) = tk::player();
        let storage = RemoteStorage::new(
            owner.owner_id(),
            &InventoryConfig::default(),
            tk::catalog(),
            persist,
        );
        let potion = owner.add_item("test", tk::POTION, 5, None).unwrap();
        let err = storage
            .deposit("test", owner.container(), potion.instance_id(), 5, None)
            .unwrap_err();
        assert!(matches!(err, InventoryError::BlockedByPolicy(_)));
        assert_eq!(owner.container().count_of(tk::POTION), 5);
    }

    #[test]
    fn only_the_active_branch_is_visible() {
        let (owner, persist) = tk::player();
        let storage = RemoteStorage::new(
            owner.owner_id(),
            &InventoryConfig::default(),
            tk::catalog(),
            persist,
        );
        let potion = owner.add_item("test", tk::POTION, 5, None).unwrap();
        storage.set_branch(BRANCH_A);
        storage
            .deposit("test", owner.container(), potion.instance_id(), 5, None)
            .unwrap();
        assert_eq!(storage.size(), 1);

        storage.set_branch(BRANCH_B);
        assert_eq!(storage.size(), 0);
        storage.clear_branch();
        assert!(storage.items().is_empty());
    }

    #[test]
    fn deposits_do_not_merge_across_branches() {
        let (owner, persist) = tk::player();
        let storage = RemoteStorage::new(
            owner.owner_id(),
            &InventoryConfig::default(),
            tk::catalog(),
            persist,
        );
        let potion = owner.add_item("test", tk::POTION, 8, None).unwrap();
        storage.set_branch(BRANCH_A);
        storage
            .deposit("test", owner.container(), potion.instance_id(), 5, None)
            .unwrap();
        storage.set_branch(BRANCH_B);
        let remaining = owner.container().item_by_template(tk::POTION).unwrap();
        storage
            .deposit("test", owner.container(), remaining.instance_id(), 3, None)
            .unwrap();

        assert_eq!(storage.container().items().len(), 2);
        assert_eq!(storage.size(), 1);
        assert_eq!(storage.items()[0].count(), 3);
    }

    #[test]
    fn withdraw_is_branch_exact() {
        let (owner, persist) = tk::player();
        let storage = RemoteStorage::new(
            owner.owner_id(),
            &InventoryConfig::default(),
            tk::catalog(),
            persist,
        );
        let potion = owner.add_item("test", tk::POTION, 5, None).unwrap();
        storage.set_branch(BRANCH_A);
        let stored = storage
            .deposit("test", owner.container(), potion.instance_id(), 5, None)
            .unwrap();

        storage.set_branch(BRANCH_B);
        let err = storage
            .withdraw("test", stored.instance_id(), 5, owner.container(), None)
            .unwrap_err();
        assert!(matches!(err, InventoryError::BlockedByPolicy(_)));

        storage.set_branch(BRANCH_A);
        storage
            .withdraw("test", stored.instance_id(), 5, owner.container(), None)
            .unwrap();
        assert_eq!(owner.container().count_of(tk::POTION), 5);
        assert_eq!(storage.container().items().len(), 0);
    }

    #[test]
    fn quick_restore_loads_rows_without_a_session() {
        let (owner, persist) = tk::player();
        let cfg = InventoryConfig::default();
        let storage = RemoteStorage::new(owner.owner_id(), &cfg, tk::catalog(), persist.clone());
        let potion = owner.add_item("test", tk::POTION, 5, None).unwrap();
        storage.set_branch(BRANCH_A);
        storage
            .deposit("test", owner.container(), potion.instance_id(), 5, None)
            .unwrap();

        let reloaded =
            RemoteStorage::quick_restore(owner.owner_id(), &cfg, tk::catalog(), persist).unwrap();
        assert_eq!(reloaded.container().items().len(), 1);
        reloaded.set_branch(BRANCH_A);
        assert_eq!(reloaded.size(), 1);
        assert_eq!(reloaded.items()[0].count(), 5);
    }
}
