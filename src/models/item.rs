use crate::models::template::{ItemTemplate, Slot};
use crate::models::types::{BranchId, InstanceId, OwnerId, TemplateId};
use crate::persist::ItemRecord;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Container family an item can reside in. Together with the owner id this
/// identifies the one container an instance belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseLocation {
    Inventory,
    PetInventory,
    Warehouse,
    Freight,
}

/// Where an item instance currently is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemLocation {
    /// Owned by no container (freshly created, dropped to the world, or
    /// mid-transfer).
    Void,
    /// Loose in a container.
    Stored(BaseLocation),
    /// Held by a container and referenced from a paperdoll slot.
    Equipped(BaseLocation, Slot),
    /// In remote storage, tagged with the branch it was deposited at.
    Remote(BaseLocation, BranchId),
}

impl ItemLocation {
    pub fn base(&self) -> Option<BaseLocation> {
        match self {
            ItemLocation::Void => None,
            ItemLocation::Stored(base)
            | ItemLocation::Equipped(base, _)
            | ItemLocation::Remote(base, _) => Some(*base),
        }
    }

    pub fn is_equipped(&self) -> bool {
        matches!(self, ItemLocation::Equipped(_, _))
    }

    pub fn slot(&self) -> Option<Slot> {
        match self {
            ItemLocation::Equipped(_, slot) => Some(*slot),
            _ => None,
        }
    }
}

/// Mutable state of one item instance, guarded by the instance lock.
#[derive(Debug, Clone)]
pub struct StackState {
    pub owner_id: OwnerId,
    pub enchant: u32,
    pub location: ItemLocation,
    /// Opaque instance data (charges, augment rolls, ...) persisted verbatim.
    pub custom: Option<serde_json::Value>,
}

/// One owned quantity of a single item type.
///
/// Every instance is its own mutual-exclusion domain: all mutations of its
/// count, location, or enchant level serialize through [`ItemStack::lock`],
/// independent of any other instance. The count is mirrored in an atomic so
/// listings and weight scans never need the lock; it is only ever written
/// while the state lock is held.
pub struct ItemStack {
    instance_id: InstanceId,
    template: Arc<ItemTemplate>,
    count: AtomicU32,
    state: Mutex<StackState>,
}

impl ItemStack {
    pub fn new(template: Arc<ItemTemplate>, owner_id: OwnerId, count: u32) -> Arc<Self> {
        Arc::new(Self {
            instance_id: InstanceId::new(),
            template,
            count: AtomicU32::new(count),
            state: Mutex::new(StackState {
                owner_id,
                enchant: 0,
                location: ItemLocation::Void,
                custom: None,
            }),
        })
    }

    pub fn from_record(template: Arc<ItemTemplate>, record: &ItemRecord) -> Arc<Self> {
        Arc::new(Self {
            instance_id: record.instance_id,
            template,
            count: AtomicU32::new(record.count),
            state: Mutex::new(StackState {
                owner_id: record.owner_id,
                enchant: record.enchant,
                location: record.location,
                custom: record.custom.clone(),
            }),
        })
    }

    #[inline]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    #[inline]
    pub fn template_id(&self) -> TemplateId {
        self.template.id
    }

    #[inline]
    pub fn template(&self) -> &Arc<ItemTemplate> {
        &self.template
    }

    #[inline]
    pub fn is_stackable(&self) -> bool {
        self.template.stackable
    }

    /// Lock-free count read. May trail an in-flight mutation by design.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Caller must hold the state lock of this instance.
    pub(crate) fn set_count(&self, _guard: &mut StackState, count: u32) {
        self.count.store(count, Ordering::Release);
    }

    pub fn lock(&self) -> MutexGuard<'_, StackState> {
        self.state.lock()
    }

    pub fn location(&self) -> ItemLocation {
        self.state.lock().location
    }

    pub fn enchant(&self) -> u32 {
        self.state.lock().enchant
    }

    pub fn is_equipped(&self) -> bool {
        self.location().is_equipped()
    }

    pub fn total_weight(&self) -> u64 {
        u64::from(self.template.weight) * u64::from(self.count())
    }

    /// Display text for inventory listings.
    pub fn display_text(&self) -> String {
        let count = self.count();
        if self.template.stackable && count > 1 {
            format!("{} (x{})", self.template.name, count)
        } else {
            self.template.name.clone()
        }
    }

    /// Snapshot of this instance as a persistence row. Caller holds the
    /// state lock and passes the guard in.
    pub fn record(&self, state: &StackState) -> ItemRecord {
        let now = chrono::Utc::now();
        ItemRecord {
            instance_id: self.instance_id,
            owner_id: state.owner_id,
            template_id: self.template.id,
            count: self.count(),
            enchant: state.enchant,
            location: state.location,
            custom: state.custom.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl core::fmt::Debug for ItemStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ItemStack")
            .field("instance_id", &self.instance_id)
            .field("template_id", &self.template.id)
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{BodyPart, EtcKind, TemplateKind};

    fn template(stackable: bool) -> Arc<ItemTemplate> {
        Arc::new(ItemTemplate {
            id: TemplateId(7),
            name: "torch".into(),
            kind: TemplateKind::Etc(EtcKind::Other),
            body_part: BodyPart::empty(),
            weight: 3,
            stackable,
            is_quest: false,
            tradable: true,
        })
    }

    #[test]
    fn display_text_shows_counts_for_stackables_only() {
        let stack = ItemStack::new(template(true), OwnerId::new(), 4);
        assert_eq!(stack.display_text(), "torch (x4)");
        let single = ItemStack::new(template(true), OwnerId::new(), 1);
        assert_eq!(single.display_text(), "torch");
        let bundle = ItemStack::new(template(false), OwnerId::new(), 4);
        assert_eq!(bundle.display_text(), "torch");
    }

    #[test]
    fn total_weight_scales_with_count() {
        let stack = ItemStack::new(template(true), OwnerId::new(), 4);
        assert_eq!(stack.total_weight(), 12);
    }
}
