use crate::catalog::TemplateCatalog;
use crate::config::InventoryConfig;
use crate::containers::base::Container;
use crate::containers::paperdoll::EquipmentContainer;
use crate::containers::policy::{OwnerPolicy, PlayerLimits};
use crate::error::{InvResult, InventoryError};
use crate::models::item::{BaseLocation, ItemStack};
use crate::models::template::Slot;
use crate::models::types::{InstanceId, OwnerId, TemplateId};
use crate::persist::ItemPersistence;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Constrained-UI gating over which templates may currently be manipulated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockMode {
    /// No gating.
    Off,
    /// Only the listed templates may be manipulated.
    Allow,
    /// Everything but the listed templates may be manipulated.
    Deny,
}

struct BlockList {
    mode: BlockMode,
    templates: HashSet<TemplateId>,
}

struct CurrencyRefs {
    primary: Option<Arc<ItemStack>>,
    secondary: Option<Arc<ItemStack>>,
}

/// The player-owned equipment container: currency fast path, quest slot
/// sub-budget, block-list gating, and de-duplicated listings on top of the
/// generic mechanics.
pub struct PlayerInventory {
    equipment: EquipmentContainer,
    currencies: [TemplateId; 2],
    currency: RwLock<CurrencyRefs>,
    block: RwLock<BlockList>,
}

impl PlayerInventory {
    pub fn new(
        owner_id: OwnerId,
        cfg: &InventoryConfig,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> Self {
        let limits = PlayerLimits::from_config(cfg);
        let currencies = limits.currencies;
        Self {
            equipment: EquipmentContainer::new(
                owner_id,
                BaseLocation::Inventory,
                OwnerPolicy::Player(limits),
                catalog,
                persist,
            ),
            currencies,
            currency: RwLock::new(CurrencyRefs {
                primary: None,
                secondary: None,
            }),
            block: RwLock::new(BlockList {
                mode: BlockMode::Off,
                templates: HashSet::new(),
            }),
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
        let restored = self.equipment.restore()?;
        self.refresh_currency();
        Ok(restored)
    }

    /// Full flush at teardown; catches rows the currency throttle skipped.
    pub fn close(&self) {
        self.container().flush_all();
    }

    // ========================================================================
    // MUTATIONS (block-list gated)
    // ========================================================================

    pub fn add_item(
        &self,
        reason: &str,
        template_id: TemplateId,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.ensure_unblocked(template_id)?;
        let stack = self.container().add_item(reason, template_id, count, actor)?;
        if self.currencies.contains(&template_id) {
            self.refresh_currency();
        }
        Ok(stack)
    }

    pub fn destroy_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.ensure_unblocked(stack.template_id())?;
        let result = self.equipment.destroy_item(reason, stack, count, actor)?;
        if self.currencies.contains(&stack.template_id()) {
            self.refresh_currency();
        }
        Ok(result)
    }

    pub fn drop_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        self.ensure_unblocked(stack.template_id())?;
        self.container().drop_item(reason, stack, count, actor)
    }

    pub fn transfer_item(
        &self,
        reason: &str,
        instance_id: InstanceId,
        count: u32,
        dest: &Container,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        if let Some(stack) = self.container().item_by_instance(instance_id) {
            self.ensure_unblocked(stack.template_id())?;
        }
        let result = self
            .container()
            .transfer_item(reason, instance_id, count, dest, actor)?;
        if self.currencies.contains(&result.template_id()) {
            self.refresh_currency();
        }
        Ok(result)
    }

    pub fn equip(&self, stack: &Arc<ItemStack>) -> InvResult<Vec<Arc<ItemStack>>> {
        self.equipment.equip(stack)
    }

    pub fn unequip(&self, slot: Slot) -> Option<Arc<ItemStack>> {
        self.equipment.unequip(slot)
    }

    // ========================================================================
    // CURRENCY FAST PATH
    // ========================================================================

    /// O(1) balance read off the cached currency reference.
    pub fn primary_balance(&self) -> u64 {
        self.currency
            .read()
            .primary
            .as_ref()
            .map(|s| u64::from(s.count()))
            .unwrap_or(0)
    }

    pub fn secondary_balance(&self) -> u64 {
        self.currency
            .read()
            .secondary
            .as_ref()
            .map(|s| u64::from(s.count()))
            .unwrap_or(0)
    }

    pub fn primary_currency(&self) -> Option<Arc<ItemStack>> {
        self.currency.read().primary.clone()
    }

    pub fn secondary_currency(&self) -> Option<Arc<ItemStack>> {
        self.currency.read().secondary.clone()
    }

    fn refresh_currency(&self) {
        let snapshot = self.container().items();
        let mut refs = self.currency.write();
        refs.primary = snapshot
            .iter()
            .find(|e| e.template_id() == self.currencies[0] && e.count() > 0)
            .cloned();
        refs.secondary = snapshot
            .iter()
            .find(|e| e.template_id() == self.currencies[1] && e.count() > 0)
            .cloned();
    }

    // ========================================================================
    // BLOCK LIST
    // ========================================================================

    pub fn set_block_list<I>(&self, mode: BlockMode, templates: I)
    where
        I: IntoIterator<Item = TemplateId>,
    {
        let mut block = self.block.write();
        block.mode = mode;
        block.templates = templates.into_iter().collect();
    }

    pub fn clear_block_list(&self) {
        let mut block = self.block.write();
        block.mode = BlockMode::Off;
        block.templates.clear();
    }

    pub fn can_manipulate(&self, template_id: TemplateId) -> bool {
        let block = self.block.read();
        match block.mode {
            BlockMode::Off => true,
            BlockMode::Allow => block.templates.contains(&template_id),
            BlockMode::Deny => !block.templates.contains(&template_id),
        }
    }

    fn ensure_unblocked(&self, template_id: TemplateId) -> InvResult<()> {
        if self.can_manipulate(template_id) {
            Ok(())
        } else {
            Err(InventoryError::BlockedByPolicy(
                "template blocked in current ui state",
            ))
        }
    }

    // ========================================================================
    // LISTINGS
    // ========================================================================

    /// One entry per template, excluding untradable and (by default)
    /// currently worn items.
    pub fn unique_items(&self, include_equipped: bool) -> Vec<Arc<ItemStack>> {
        let mut seen = HashSet::new();
        self.container()
            .items()
            .iter()
            .filter(|e| e.template().tradable && e.count() > 0)
            .filter(|e| include_equipped || !e.is_equipped())
            .filter(|e| seen.insert(e.template_id()))
            .cloned()
            .collect()
    }

    /// One entry per (template, enchant level) pair, same exclusions as
    /// [`unique_items`](Self::unique_items).
    pub fn unique_items_by_enchant(&self, include_equipped: bool) -> Vec<Arc<ItemStack>> {
        let mut seen = HashSet::new();
        self.container()
            .items()
            .iter()
            .filter(|e| e.template().tradable && e.count() > 0)
            .filter(|e| include_equipped || !e.is_equipped())
            .filter(|e| seen.insert((e.template_id(), e.enchant())))
            .cloned()
            .collect()
    }

    pub fn quest_slots_used(&self) -> usize {
        self.container().quest_size()
    }
}
