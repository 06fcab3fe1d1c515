use crate::catalog::TemplateCatalog;
use crate::containers::base::Container;
use crate::containers::policy::OwnerPolicy;
use crate::error::{InvResult, InventoryError};
use crate::models::item::{BaseLocation, ItemLocation, ItemStack};
use crate::models::template::{BodyPart, ItemTemplate, Slot, WornSet, default_slot};
use crate::models::types::{InstanceId, OwnerId};
use crate::persist::ItemPersistence;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Observer of paperdoll slot changes, consumed by stat-recalculation and
/// other derived-state systems.
pub trait PaperdollListener: Send + Sync {
    fn on_equip(&self, slot: Slot, item: &Arc<ItemStack>, owner: OwnerId);
    fn on_unequip(&self, slot: Slot, item: &Arc<ItemStack>, owner: OwnerId);
}

struct Paperdoll {
    slots: [Option<Arc<ItemStack>>; Slot::COUNT],
    worn: WornSet,
}

impl Paperdoll {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            worn: WornSet::empty(),
        }
    }

    fn get(&self, slot: Slot) -> Option<&Arc<ItemStack>> {
        self.slots[slot.index()].as_ref()
    }

    fn take(&mut self, slot: Slot) -> Option<Arc<ItemStack>> {
        self.slots[slot.index()].take()
    }

    /// A two-piece armor category bit is active only while both the chest
    /// and legs positions are covered by the same category. A one-piece
    /// armor covers both on its own.
    fn recompute_worn(&mut self) {
        let chest = self.get(Slot::Chest);
        let legs = self.get(Slot::Legs);
        self.worn = match (chest, legs) {
            (Some(c), _) if c.template().body_part.contains(BodyPart::FULL_ARMOR) => {
                c.template().kind.worn_set_bit()
            }
            (Some(c), Some(l)) => {
                let bit = c.template().kind.worn_set_bit();
                if !bit.is_empty() && bit == l.template().kind.worn_set_bit() {
                    bit
                } else {
                    WornSet::empty()
                }
            }
            _ => WornSet::empty(),
        };
    }
}

fn clear_into(pd: &mut Paperdoll, slot: Slot, evicted: &mut Vec<(Slot, Arc<ItemStack>)>) {
    if let Some(prev) = pd.take(slot) {
        evicted.push((slot, prev));
    }
}

/// Dual-slot accessories: first empty of the pair, else the slot whose
/// occupant shares the new item's template id, else the primary (left).
fn resolve_pair(
    pd: &mut Paperdoll,
    left: Slot,
    right: Slot,
    template: &ItemTemplate,
    evicted: &mut Vec<(Slot, Arc<ItemStack>)>,
) -> Slot {
    if pd.get(left).is_none() {
        return left;
    }
    if pd.get(right).is_none() {
        return right;
    }
    let slot = if pd.get(left).is_some_and(|i| i.template_id() == template.id) {
        left
    } else if pd.get(right).is_some_and(|i| i.template_id() == template.id) {
        right
    } else {
        left
    };
    clear_into(pd, slot, evicted);
    slot
}

/// Container with a fixed slot table ("paperdoll") on top of the generic
/// membership. Equip resolution, the worn mask, and slot-change observers
/// live here; everything else delegates to the base container.
pub struct EquipmentContainer {
    container: Container,
    paperdoll: Mutex<Paperdoll>,
    listeners: RwLock<Vec<Arc<dyn PaperdollListener>>>,
}

impl EquipmentContainer {
    pub fn new(
        owner_id: OwnerId,
        base_location: BaseLocation,
        policy: OwnerPolicy,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> Self {
        Self {
            container: Container::new(owner_id, base_location, policy, catalog, persist),
            paperdoll: Mutex::new(Paperdoll::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn owner_id(&self) -> OwnerId {
        self.container.owner_id()
    }

    pub fn slot_item(&self, slot: Slot) -> Option<Arc<ItemStack>> {
        self.paperdoll.lock().get(slot).cloned()
    }

    pub fn worn_mask(&self) -> WornSet {
        self.paperdoll.lock().worn
    }

    pub fn add_listener(&self, listener: Arc<dyn PaperdollListener>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn PaperdollListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Equip a stack held by this container. Returns the evicted occupants,
    /// already moved back to the base location. Observers hear the
    /// evictions before the equip, so they never see a double-equipped
    /// state.
    pub fn equip(&self, stack: &Arc<ItemStack>) -> InvResult<Vec<Arc<ItemStack>>> {
        let template = stack.template().clone();
        let body_part = template.body_part;
        if body_part.is_empty() {
            tracing::warn!(template_id = %template.id, "equip rejected: not equippable");
            return Err(InventoryError::InvalidSlotForTemplate(template.id));
        }

        let mut pd = self.paperdoll.lock();

        // Formal wear on the chest locks the slots it covers.
        if let Some(chest) = pd.get(Slot::Chest)
            && chest.template().body_part == BodyPart::ALL_DRESS
            && !Arc::ptr_eq(chest, stack)
            && [BodyPart::LEGS, BodyPart::FEET, BodyPart::GLOVES, BodyPart::HEAD]
                .contains(&body_part)
        {
            return Err(InventoryError::BlockedByPolicy("formal wear locks this slot"));
        }

        // Held from the membership check through the slot write. A racing
        // full destroy either completes first and is seen here as a removal,
        // or blocks on this lock and then finds the stack equipped; it can
        // never delete the row and have the equip upsert bring it back.
        let mut st = stack.lock();
        if !self.container.holds(&st) || stack.count() == 0 {
            tracing::warn!(instance = %stack.instance_id(), "equip lost race to concurrent removal");
            return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
        }

        let mut evicted: Vec<(Slot, Arc<ItemStack>)> = Vec::new();
        let target = if body_part == BodyPart::TWO_HAND {
            clear_into(&mut pd, Slot::LeftHand, &mut evicted);
            clear_into(&mut pd, Slot::RightHand, &mut evicted);
            Slot::RightHand
        } else if body_part == BodyPart::L_HAND {
            if let Some(main) = pd.get(Slot::RightHand)
                && main.template().body_part == BodyPart::TWO_HAND
                && !main.template().kind.is_paired_offhand(&template.kind)
            {
                clear_into(&mut pd, Slot::RightHand, &mut evicted);
            }
            clear_into(&mut pd, Slot::LeftHand, &mut evicted);
            Slot::LeftHand
        } else if body_part == BodyPart::R_HAND {
            // A worn two-handed weapon sits here as well; the slot write
            // displaces it. Paired ammo in the left hand stays put.
            clear_into(&mut pd, Slot::RightHand, &mut evicted);
            Slot::RightHand
        } else if body_part == BodyPart::EAR {
            resolve_pair(&mut pd, Slot::LeftEar, Slot::RightEar, &template, &mut evicted)
        } else if body_part == BodyPart::FINGER {
            resolve_pair(
                &mut pd,
                Slot::LeftFinger,
                Slot::RightFinger,
                &template,
                &mut evicted,
            )
        } else if body_part == BodyPart::FULL_ARMOR {
            clear_into(&mut pd, Slot::Legs, &mut evicted);
            clear_into(&mut pd, Slot::Chest, &mut evicted);
            Slot::Chest
        } else if body_part == BodyPart::LEGS {
            if pd
                .get(Slot::Chest)
                .is_some_and(|c| c.template().body_part == BodyPart::FULL_ARMOR)
            {
                clear_into(&mut pd, Slot::Chest, &mut evicted);
            }
            clear_into(&mut pd, Slot::Legs, &mut evicted);
            Slot::Legs
        } else if body_part == BodyPart::HAIR {
            clear_into(&mut pd, Slot::FullHair, &mut evicted);
            clear_into(&mut pd, Slot::Hair, &mut evicted);
            Slot::Hair
        } else if body_part == BodyPart::FULL_HAIR {
            clear_into(&mut pd, Slot::Hair, &mut evicted);
            clear_into(&mut pd, Slot::FullHair, &mut evicted);
            Slot::FullHair
        } else if body_part == BodyPart::ALL_DRESS {
            clear_into(&mut pd, Slot::Legs, &mut evicted);
            clear_into(&mut pd, Slot::LeftHand, &mut evicted);
            clear_into(&mut pd, Slot::RightHand, &mut evicted);
            clear_into(&mut pd, Slot::Head, &mut evicted);
            clear_into(&mut pd, Slot::Feet, &mut evicted);
            clear_into(&mut pd, Slot::Gloves, &mut evicted);
            clear_into(&mut pd, Slot::Chest, &mut evicted);
            Slot::Chest
        } else {
            let Some(slot) = default_slot(body_part) else {
                tracing::warn!(template_id = %template.id, mask = ?body_part, "equip rejected: unmapped body part");
                return Err(InventoryError::InvalidSlotForTemplate(template.id));
            };
            clear_into(&mut pd, slot, &mut evicted);
            slot
        };

        // Re-equipping the seated stack clears its own slot during
        // resolution; it is not an eviction and its lock is already held.
        evicted.retain(|(_, prev)| !Arc::ptr_eq(prev, stack));

        let base = self.container.base_location();
        for (_, prev) in &evicted {
            {
                let mut p = prev.lock();
                p.location = ItemLocation::Stored(base);
            }
            self.container.persist_now(prev);
        }
        pd.slots[target.index()] = Some(stack.clone());
        st.location = ItemLocation::Equipped(base, target);
        drop(st);
        self.container.persist_now(stack);
        pd.recompute_worn();
        drop(pd);

        let owner = self.container.owner_id();
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for (slot, prev) in &evicted {
            for l in &listeners {
                l.on_unequip(*slot, prev, owner);
            }
        }
        for l in &listeners {
            l.on_equip(target, stack, owner);
        }
        tracing::debug!(owner = %owner, instance = %stack.instance_id(), slot = %target, "equipped");
        Ok(evicted.into_iter().map(|(_, s)| s).collect())
    }

    /// Clear a slot and move its occupant back to the base location.
    pub fn unequip(&self, slot: Slot) -> Option<Arc<ItemStack>> {
        let mut pd = self.paperdoll.lock();
        let prev = pd.take(slot)?;
        {
            let mut st = prev.lock();
            st.location = ItemLocation::Stored(self.container.base_location());
        }
        self.container.persist_now(&prev);
        pd.recompute_worn();
        drop(pd);

        let owner = self.container.owner_id();
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for l in &listeners {
            l.on_unequip(slot, &prev, owner);
        }
        tracing::debug!(owner = %owner, instance = %prev.instance_id(), slot = %slot, "unequipped");
        Some(prev)
    }

    pub fn unequip_all(&self) -> Vec<Arc<ItemStack>> {
        Slot::ALL.iter().filter_map(|s| self.unequip(*s)).collect()
    }

    /// Destroy through the paperdoll: a full destroy of an equipped stack
    /// unequips it first, partial destroys (ammo consumption) go straight
    /// through. A count the stack cannot cover fails here, before the slot
    /// table is touched.
    pub fn destroy_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        let equipped_slot = {
            let st = stack.lock();
            let have = stack.count();
            if count > have {
                return Err(InventoryError::InsufficientQuantity { have, need: count });
            }
            if count == have { st.location.slot() } else { None }
        };
        if let Some(slot) = equipped_slot
            && self
                .slot_item(slot)
                .is_some_and(|occupant| Arc::ptr_eq(&occupant, stack))
        {
            self.unequip(slot);
        }
        self.container.destroy_item(reason, stack, count, actor)
    }

    /// Repopulate membership and re-seat rows persisted as equipped. No
    /// resolution and no notifications: the slot assignment was already
    /// resolved when it was persisted.
    pub fn restore(&self) -> InvResult<Vec<Arc<ItemStack>>> {
        let restored = self.container.restore()?;
        let mut pd = self.paperdoll.lock();
        for stack in &restored {
            if let ItemLocation::Equipped(_, slot) = stack.location() {
                if pd.get(slot).is_some() {
                    tracing::warn!(instance = %stack.instance_id(), slot = %slot, "restore found slot already taken");
                    let mut st = stack.lock();
                    st.location = ItemLocation::Stored(self.container.base_location());
                    continue;
                }
                pd.slots[slot.index()] = Some(stack.clone());
            }
        }
        pd.recompute_worn();
        Ok(restored)
    }

    pub fn item_by_instance(&self, instance_id: InstanceId) -> Option<Arc<ItemStack>> {
        self.container.item_by_instance(instance_id)
    }
}

impl core::fmt::Debug for EquipmentContainer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EquipmentContainer")
            .field("container", &self.container)
            .field("worn", &self.worn_mask())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryConfig;
    use crate::containers::policy::PlayerLimits;
    use crate::containers::testkit as tk;
    use crate::models::types::TemplateId;
    use crate::persist::MemoryPersistence;
    use parking_lot::Mutex as PlMutex;

    fn equipment() -> (EquipmentContainer, Arc<MemoryPersistence>) {
        let persist = tk::persistence();
        let eq = EquipmentContainer::new(
            OwnerId::new(),
            BaseLocation::Inventory,
            OwnerPolicy::Player(PlayerLimits::from_config(&InventoryConfig::default())),
            tk::catalog(),
            persist.clone(),
        );
        (eq, persist)
    }

    fn held(eq: &EquipmentContainer, template_id: TemplateId, count: u32) -> Arc<ItemStack> {
        eq.container().add_item("test", template_id, count, None).unwrap()
    }

    #[test]
    fn equip_seats_the_default_slot() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        let evicted = eq.equip(&sword).unwrap();
        assert!(evicted.is_empty());
        assert_eq!(
            eq.slot_item(Slot::RightHand).map(|i| i.instance_id()),
            Some(sword.instance_id())
        );
        assert_eq!(
            sword.location(),
            ItemLocation::Equipped(BaseLocation::Inventory, Slot::RightHand)
        );
    }

    #[test]
    fn two_handed_weapon_evicts_both_hands() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        let shield = held(&eq, tk::SHIELD, 1);
        let bow = held(&eq, tk::BOW, 1);
        eq.equip(&sword).unwrap();
        eq.equip(&shield).unwrap();
        let evicted = eq.equip(&bow).unwrap();
        assert_eq!(evicted.len(), 2);
        assert_eq!(
            eq.slot_item(Slot::RightHand).map(|i| i.instance_id()),
            Some(bow.instance_id())
        );
        assert!(eq.slot_item(Slot::LeftHand).is_none());
        assert_eq!(sword.location(), ItemLocation::Stored(BaseLocation::Inventory));
    }

    #[test]
    fn paired_ammo_rides_with_the_two_hander() {
        let (eq, _) = equipment();
        let bow = held(&eq, tk::BOW, 1);
        let arrows = held(&eq, tk::ARROW, 100);
        eq.equip(&bow).unwrap();
        let evicted = eq.equip(&arrows).unwrap();
        assert!(evicted.is_empty());
        assert!(eq.slot_item(Slot::RightHand).is_some());
        assert!(eq.slot_item(Slot::LeftHand).is_some());
    }

    #[test]
    fn unpaired_offhand_displaces_the_two_hander() {
        let (eq, _) = equipment();
        let bow = held(&eq, tk::BOW, 1);
        let shield = held(&eq, tk::SHIELD, 1);
        eq.equip(&bow).unwrap();
        let evicted = eq.equip(&shield).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].instance_id(), bow.instance_id());
        assert!(eq.slot_item(Slot::RightHand).is_none());
    }

    #[test]
    fn worn_ammo_keeps_merging_and_burning_down() {
        let (eq, _) = equipment();
        let bow = held(&eq, tk::BOW, 1);
        let arrows = held(&eq, tk::ARROW, 100);
        eq.equip(&bow).unwrap();
        eq.equip(&arrows).unwrap();
        // Pickup merges into the worn stack.
        let merged = eq.container().add_item("test", tk::ARROW, 50, None).unwrap();
        assert_eq!(merged.instance_id(), arrows.instance_id());
        assert_eq!(arrows.count(), 150);
        // Consumption is a partial destroy that leaves it equipped.
        eq.destroy_item("test", &arrows, 10, None).unwrap();
        assert_eq!(arrows.count(), 140);
        assert!(arrows.is_equipped());
    }

    #[test]
    fn one_piece_armor_clears_the_legs() {
        let (eq, _) = equipment();
        let tunic = held(&eq, tk::TUNIC, 1);
        let hose = held(&eq, tk::HOSE, 1);
        let plate = held(&eq, tk::FULL_PLATE, 1);
        eq.equip(&tunic).unwrap();
        eq.equip(&hose).unwrap();
        let evicted = eq.equip(&plate).unwrap();
        assert_eq!(evicted.len(), 2);
        assert!(eq.slot_item(Slot::Legs).is_none());
        assert_eq!(
            eq.slot_item(Slot::Chest).map(|i| i.instance_id()),
            Some(plate.instance_id())
        );
    }

    #[test]
    fn leg_piece_displaces_a_one_piece_armor() {
        let (eq, _) = equipment();
        let plate = held(&eq, tk::FULL_PLATE, 1);
        let hose = held(&eq, tk::HOSE, 1);
        eq.equip(&plate).unwrap();
        let evicted = eq.equip(&hose).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].instance_id(), plate.instance_id());
        assert!(eq.slot_item(Slot::Chest).is_none());
    }

    #[test]
    fn worn_mask_requires_both_pieces_of_one_category() {
        let (eq, _) = equipment();
        let tunic = held(&eq, tk::TUNIC, 1);
        let hose = held(&eq, tk::HOSE, 1);
        eq.equip(&tunic).unwrap();
        assert_eq!(eq.worn_mask(), WornSet::empty());
        eq.equip(&hose).unwrap();
        assert_eq!(eq.worn_mask(), WornSet::LIGHT);
        eq.unequip(Slot::Legs);
        assert_eq!(eq.worn_mask(), WornSet::empty());
    }

    #[test]
    fn one_piece_armor_sets_the_mask_alone() {
        let (eq, _) = equipment();
        let plate = held(&eq, tk::FULL_PLATE, 1);
        eq.equip(&plate).unwrap();
        assert_eq!(eq.worn_mask(), WornSet::HEAVY);
    }

    #[test]
    fn formal_wear_locks_covered_slots() {
        let (eq, _) = equipment();
        let gown = held(&eq, tk::GOWN, 1);
        let helm = held(&eq, tk::HELM, 1);
        let sword = held(&eq, tk::SWORD, 1);
        eq.equip(&gown).unwrap();
        let err = eq.equip(&helm).unwrap_err();
        assert!(matches!(err, InventoryError::BlockedByPolicy(_)));
        // Slot table untouched by the rejection.
        assert_eq!(
            eq.slot_item(Slot::Chest).map(|i| i.instance_id()),
            Some(gown.instance_id())
        );
        assert!(eq.slot_item(Slot::Head).is_none());
        // Weapons are not covered by the lock.
        eq.equip(&sword).unwrap();
    }

    #[test]
    fn dual_slots_fill_left_then_right_then_replace() {
        let (eq, _) = equipment();
        let a = held(&eq, tk::EARRING, 1);
        let b = held(&eq, tk::EARRING, 1);
        let c = held(&eq, tk::EARRING, 1);
        eq.equip(&a).unwrap();
        assert_eq!(a.location().slot(), Some(Slot::LeftEar));
        eq.equip(&b).unwrap();
        assert_eq!(b.location().slot(), Some(Slot::RightEar));
        let evicted = eq.equip(&c).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].instance_id(), a.instance_id());
        assert_eq!(c.location().slot(), Some(Slot::LeftEar));
    }

    #[test]
    fn dual_finger_slots_fill_left_then_right_then_replace() {
        let (eq, _) = equipment();
        let a = held(&eq, tk::RING, 1);
        let b = held(&eq, tk::RING, 1);
        let c = held(&eq, tk::RING, 1);
        eq.equip(&a).unwrap();
        assert_eq!(a.location().slot(), Some(Slot::LeftFinger));
        eq.equip(&b).unwrap();
        assert_eq!(b.location().slot(), Some(Slot::RightFinger));
        let evicted = eq.equip(&c).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].instance_id(), a.instance_id());
        assert_eq!(c.location().slot(), Some(Slot::LeftFinger));
    }

    #[test]
    fn hair_and_full_hair_are_mutually_exclusive() {
        let (eq, _) = equipment();
        let pin = held(&eq, tk::HAIRPIN, 1);
        let wig = held(&eq, tk::WIG, 1);
        eq.equip(&pin).unwrap();
        let evicted = eq.equip(&wig).unwrap();
        assert_eq!(evicted.len(), 1);
        assert!(eq.slot_item(Slot::Hair).is_none());
        let evicted = eq.equip(&pin).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].instance_id(), wig.instance_id());
        assert!(eq.slot_item(Slot::FullHair).is_none());
    }

    #[test]
    fn not_equippable_is_rejected() {
        let (eq, _) = equipment();
        let potion = held(&eq, tk::POTION, 5);
        let err = eq.equip(&potion).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidSlotForTemplate(_)));
    }

    #[test]
    fn equipped_stack_cannot_be_destroyed_through_the_base_container() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        eq.equip(&sword).unwrap();
        let err = eq.container().destroy_item("test", &sword, 1, None).unwrap_err();
        assert!(matches!(err, InventoryError::BlockedByPolicy(_)));
        assert!(sword.is_equipped());
    }

    #[test]
    fn overdrawn_destroy_leaves_the_stack_equipped() {
        let (eq, persist) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        eq.equip(&sword).unwrap();
        let err = eq.destroy_item("test", &sword, 2, None).unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientQuantity { have: 1, need: 2 }));
        assert!(sword.is_equipped());
        assert_eq!(
            eq.slot_item(Slot::RightHand).map(|i| i.instance_id()),
            Some(sword.instance_id())
        );
        assert!(persist.get(sword.instance_id()).is_some());
    }

    #[test]
    fn re_equipping_the_seated_stack_is_not_an_eviction() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        eq.equip(&sword).unwrap();
        let evicted = eq.equip(&sword).unwrap();
        assert!(evicted.is_empty());
        assert_eq!(
            eq.slot_item(Slot::RightHand).map(|i| i.instance_id()),
            Some(sword.instance_id())
        );
        assert!(sword.is_equipped());
    }

    #[test]
    fn destroyed_stack_cannot_be_seated() {
        let (eq, persist) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        eq.container().destroy_item("test", &sword, 1, None).unwrap();
        let err = eq.equip(&sword).unwrap_err();
        assert!(matches!(err, InventoryError::ConcurrentRemoval(_)));
        assert!(eq.slot_item(Slot::RightHand).is_none());
        assert!(persist.get(sword.instance_id()).is_none());
    }

    #[test]
    fn full_destroy_through_the_paperdoll_unequips_first() {
        let (eq, persist) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        eq.equip(&sword).unwrap();
        eq.destroy_item("test", &sword, 1, None).unwrap();
        assert!(eq.slot_item(Slot::RightHand).is_none());
        assert_eq!(eq.container().size(), 0);
        assert!(persist.get(sword.instance_id()).is_none());
    }

    struct Recorder {
        events: PlMutex<Vec<(&'static str, Slot, InstanceId)>>,
    }

    impl PaperdollListener for Recorder {
        fn on_equip(&self, slot: Slot, item: &Arc<ItemStack>, _owner: OwnerId) {
            self.events.lock().push(("equip", slot, item.instance_id()));
        }

        fn on_unequip(&self, slot: Slot, item: &Arc<ItemStack>, _owner: OwnerId) {
            self.events.lock().push(("unequip", slot, item.instance_id()));
        }
    }

    #[test]
    fn listeners_hear_evictions_before_the_equip() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        let dagger = held(&eq, tk::DAGGER, 1);
        let recorder = Arc::new(Recorder {
            events: PlMutex::new(Vec::new()),
        });
        eq.add_listener(recorder.clone());
        eq.equip(&sword).unwrap();
        eq.equip(&dagger).unwrap();

        let events = recorder.events.lock();
        assert_eq!(
            *events,
            vec![
                ("equip", Slot::RightHand, sword.instance_id()),
                ("unequip", Slot::RightHand, sword.instance_id()),
                ("equip", Slot::RightHand, dagger.instance_id()),
            ]
        );
    }

    #[test]
    fn removed_listener_stops_hearing_changes() {
        let (eq, _) = equipment();
        let sword = held(&eq, tk::SWORD, 1);
        let recorder = Arc::new(Recorder {
            events: PlMutex::new(Vec::new()),
        });
        let listener: Arc<dyn PaperdollListener> = recorder.clone();
        eq.add_listener(listener.clone());
        eq.remove_listener(&listener);
        eq.equip(&sword).unwrap();
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn restore_reseats_equipped_rows_without_resolution() {
        let owner = OwnerId::new();
        let persist = tk::persistence();
        let policy = || OwnerPolicy::Player(PlayerLimits::from_config(&InventoryConfig::default()));
        let first = EquipmentContainer::new(
            owner,
            BaseLocation::Inventory,
            policy(),
            tk::catalog(),
            persist.clone(),
        );
        let sword = first.container().add_item("test", tk::SWORD, 1, None).unwrap();
        first.equip(&sword).unwrap();
        first.container().flush_all();

        let second = EquipmentContainer::new(
            owner,
            BaseLocation::Inventory,
            policy(),
            tk::catalog(),
            persist,
        );
        second.restore().unwrap();
        assert_eq!(
            second.slot_item(Slot::RightHand).map(|i| i.template_id()),
            Some(tk::SWORD)
        );
        assert_eq!(second.container().size(), 1);
    }
}
