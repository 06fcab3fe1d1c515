use crate::catalog::TemplateCatalog;
use crate::containers::policy::{CapacityPolicy, OwnerPolicy};
use crate::error::{InvResult, InventoryError};
use crate::models::item::{BaseLocation, ItemLocation, ItemStack, StackState};
use crate::models::template::ItemTemplate;
use crate::models::types::{BranchId, InstanceId, OwnerId, TemplateId};
use crate::persist::ItemPersistence;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;

/// Owner-agnostic collection of item stacks.
///
/// Membership is a copy-on-write list: readers clone the `Arc` snapshot and
/// never observe a half-applied add/remove. Item state mutations serialize
/// through each instance's own lock.
///
/// Lock order: the membership write lock may be taken before an instance
/// lock, never after one (the only exception is an instance that is not yet
/// reachable from any container).
pub struct Container {
    owner_id: OwnerId,
    base_location: BaseLocation,
    entries: RwLock<Arc<Vec<Arc<ItemStack>>>>,
    /// Set only by remote storage; tags adds with the active branch.
    active_branch: RwLock<Option<BranchId>>,
    catalog: Arc<dyn TemplateCatalog>,
    persist: Arc<dyn ItemPersistence>,
    policy: OwnerPolicy,
}

impl Container {
    pub fn new(
        owner_id: OwnerId,
        base_location: BaseLocation,
        policy: OwnerPolicy,
        catalog: Arc<dyn TemplateCatalog>,
        persist: Arc<dyn ItemPersistence>,
    ) -> Self {
        Self {
            owner_id,
            base_location,
            entries: RwLock::new(Arc::new(Vec::new())),
            active_branch: RwLock::new(None),
            catalog,
            persist,
            policy,
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn base_location(&self) -> BaseLocation {
        self.base_location
    }

    pub fn policy(&self) -> &OwnerPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &Arc<dyn TemplateCatalog> {
        &self.catalog
    }

    /// Internally consistent snapshot of the current membership.
    pub fn items(&self) -> Arc<Vec<Arc<ItemStack>>> {
        self.entries.read().clone()
    }

    /// Distinct non-quest entries.
    pub fn size(&self) -> usize {
        self.items().iter().filter(|e| !e.template().is_quest).count()
    }

    /// Distinct quest-flagged entries, counted against their own budget.
    pub fn quest_size(&self) -> usize {
        self.items().iter().filter(|e| e.template().is_quest).count()
    }

    pub fn total_weight(&self) -> u64 {
        self.items().iter().map(|e| e.total_weight()).sum()
    }

    /// Total units held of one template, across all entries.
    pub fn count_of(&self, template_id: TemplateId) -> u64 {
        self.items()
            .iter()
            .filter(|e| e.template_id() == template_id)
            .map(|e| u64::from(e.count()))
            .sum()
    }

    pub fn item_by_instance(&self, instance_id: InstanceId) -> Option<Arc<ItemStack>> {
        self.items()
            .iter()
            .find(|e| e.instance_id() == instance_id)
            .cloned()
    }

    pub fn item_by_template(&self, template_id: TemplateId) -> Option<Arc<ItemStack>> {
        self.items()
            .iter()
            .find(|e| e.template_id() == template_id)
            .cloned()
    }

    /// Capacity hook: could `extra` more entries be admitted right now?
    pub fn validate_capacity(&self, extra: u32, quest: bool) -> bool {
        let limit = if quest {
            self.policy.quest_slot_limit()
        } else {
            self.policy.slot_limit()
        };
        match limit {
            None => true,
            Some(limit) => {
                let used = if quest { self.quest_size() } else { self.size() } as u32;
                used + extra <= limit
            }
        }
    }

    /// Weight hook: could `extra` more weight be admitted right now?
    pub fn validate_weight(&self, extra: u64) -> bool {
        match self.policy.weight_limit() {
            None => true,
            Some(limit) => self.total_weight() + extra <= limit,
        }
    }

    // ========================================================================
    // ADD
    // ========================================================================

    /// Add `count` units of a template, merging into an existing stackable
    /// entry when one is resident. Never returns a dangling success: the
    /// returned stack is a live member of this container.
    pub fn add_item(
        &self,
        reason: &str,
        template_id: TemplateId,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        let Some(template) = self.catalog.lookup(template_id) else {
            tracing::warn!(%template_id, reason, "add rejected: unknown template");
            return Err(InventoryError::UnknownTemplate(template_id));
        };
        if count == 0 {
            return Err(InventoryError::Validation {
                field: "count",
                message: "must be positive".to_string(),
            });
        }

        let stack = if template.stackable {
            self.add_stackable(&template, count)?
        } else {
            self.add_non_stackable(&template, count)?
        };
        tracing::debug!(
            owner = %self.owner_id,
            %template_id,
            count,
            instance = %stack.instance_id(),
            reason,
            actor = ?actor,
            "item added"
        );
        Ok(stack)
    }

    fn add_stackable(&self, template: &Arc<ItemTemplate>, count: u32) -> InvResult<Arc<ItemStack>> {
        // Fast path: merge into the resident stack without touching
        // membership. Fails over to the slow path on any race.
        let snapshot = self.items();
        if let Some(existing) = snapshot.iter().find(|e| e.template_id() == template.id)
            && self.try_merge(&snapshot, existing, template, count)?
        {
            return Ok(existing.clone());
        }
        drop(snapshot);

        let mut entries = self.entries.write();
        let candidates: Vec<_> = entries
            .iter()
            .filter(|e| e.template_id() == template.id)
            .cloned()
            .collect();
        for candidate in candidates {
            if self.try_merge(&entries, &candidate, template, count)? {
                return Ok(candidate);
            }
        }

        let added_weight = u64::from(template.weight) * u64::from(count);
        self.check_admit(&entries, template, 1, added_weight)?;
        let stack = ItemStack::new(template.clone(), self.owner_id, count);
        {
            let mut st = stack.lock();
            st.location = self.resident_location();
        }
        Self::push_entry(&mut entries, stack.clone());
        drop(entries);
        self.persist_now(&stack);
        Ok(stack)
    }

    fn add_non_stackable(
        &self,
        template: &Arc<ItemTemplate>,
        count: u32,
    ) -> InvResult<Arc<ItemStack>> {
        let fan_out = count > 1 && self.policy.multi_drop();
        let instances = if fan_out { count } else { 1 };
        let per_instance = if fan_out { 1 } else { count };
        let added_weight = u64::from(template.weight) * u64::from(count);

        let mut entries = self.entries.write();
        self.check_admit(&entries, template, instances, added_weight)?;
        let mut created = Vec::with_capacity(instances as usize);
        for _ in 0..instances {
            let stack = ItemStack::new(template.clone(), self.owner_id, per_instance);
            {
                let mut st = stack.lock();
                st.location = self.resident_location();
            }
            Self::push_entry(&mut entries, stack.clone());
            created.push(stack);
        }
        drop(entries);
        for stack in &created {
            self.persist_now(stack);
        }
        Ok(created.swap_remove(0))
    }

    /// Adopt a detached instance (fresh split, pickup, or transfer-in). If a
    /// stackable entry already holds the template, the counts merge and the
    /// adopted instance is consumed: its row is deleted and its count zeroed.
    pub fn add_stack(
        &self,
        reason: &str,
        stack: Arc<ItemStack>,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        let template = stack.template().clone();
        let count = stack.count();
        if count == 0 {
            return Err(InventoryError::Validation {
                field: "count",
                message: "must be positive".to_string(),
            });
        }

        if template.stackable {
            let snapshot = self.items();
            if let Some(existing) = snapshot
                .iter()
                .find(|e| e.template_id() == template.id && !Arc::ptr_eq(e, &stack))
                && self.try_adopt_merge(&snapshot, existing, &stack, &template, count)?
            {
                tracing::debug!(
                    owner = %self.owner_id,
                    template_id = %template.id,
                    count,
                    into = %existing.instance_id(),
                    reason,
                    actor = ?actor,
                    "stack merged"
                );
                return Ok(existing.clone());
            }
            drop(snapshot);

            let mut entries = self.entries.write();
            let candidates: Vec<_> = entries
                .iter()
                .filter(|e| e.template_id() == template.id && !Arc::ptr_eq(e, &stack))
                .cloned()
                .collect();
            for candidate in candidates {
                if self.try_adopt_merge(&entries, &candidate, &stack, &template, count)? {
                    return Ok(candidate);
                }
            }
            let added_weight = u64::from(template.weight) * u64::from(count);
            self.check_admit(&entries, &template, 1, added_weight)?;
            self.adopt(&stack);
            Self::push_entry(&mut entries, stack.clone());
            drop(entries);
        } else {
            let added_weight = u64::from(template.weight) * u64::from(count);
            let mut entries = self.entries.write();
            self.check_admit(&entries, &template, 1, added_weight)?;
            self.adopt(&stack);
            Self::push_entry(&mut entries, stack.clone());
            drop(entries);
        }

        self.persist_now(&stack);
        tracing::debug!(
            owner = %self.owner_id,
            template_id = %template.id,
            count,
            instance = %stack.instance_id(),
            reason,
            actor = ?actor,
            "stack adopted"
        );
        Ok(stack)
    }

    // ========================================================================
    // DESTROY / DROP
    // ========================================================================

    /// Destroy `count` units. Partial destroys decrement in place; destroying
    /// the full count removes the entry and issues a synchronous, propagated
    /// persistence delete. No partial effect on failure.
    pub fn destroy_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        if count == 0 {
            return Err(InventoryError::Validation {
                field: "count",
                message: "must be positive".to_string(),
            });
        }

        loop {
            if count < stack.count() {
                let mut st = stack.lock();
                if !self.holds(&st) {
                    tracing::warn!(instance = %stack.instance_id(), reason, "destroy lost race to concurrent removal");
                    return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
                }
                let have = stack.count();
                if count > have {
                    return Err(InventoryError::InsufficientQuantity { have, need: count });
                }
                if count == have {
                    // Became a full destroy while we waited; retake locks in
                    // membership-first order.
                    continue;
                }
                stack.set_count(&mut st, have - count);
                self.upsert_throttled(stack, &st);
                tracing::debug!(instance = %stack.instance_id(), count, reason, actor = ?actor, "partial destroy");
                return Ok(stack.clone());
            }

            let mut entries = self.entries.write();
            let mut st = stack.lock();
            if !self.holds(&st) {
                tracing::warn!(instance = %stack.instance_id(), reason, "destroy lost race to concurrent removal");
                return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
            }
            let have = stack.count();
            if count > have {
                return Err(InventoryError::InsufficientQuantity { have, need: count });
            }
            if count < have {
                drop(st);
                drop(entries);
                continue;
            }
            if st.location.is_equipped() {
                return Err(InventoryError::BlockedByPolicy(
                    "unequip before destroying an equipped stack",
                ));
            }
            Self::remove_entry(&mut entries, stack.instance_id());
            stack.set_count(&mut st, 0);
            st.location = ItemLocation::Void;
            drop(st);
            drop(entries);
            self.persist.delete(stack.instance_id())?;
            tracing::debug!(instance = %stack.instance_id(), count, reason, actor = ?actor, "full destroy");
            return Ok(stack.clone());
        }
    }

    /// Detach `count` units to the void and return the detached instance;
    /// the world layer takes ownership from there. The persistence row is
    /// kept (the item still exists, just outside any container).
    pub fn drop_item(
        &self,
        reason: &str,
        stack: &Arc<ItemStack>,
        count: u32,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        if count == 0 {
            return Err(InventoryError::Validation {
                field: "count",
                message: "must be positive".to_string(),
            });
        }

        loop {
            if count < stack.count() {
                let mut st = stack.lock();
                if !self.holds(&st) {
                    return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
                }
                let have = stack.count();
                if count > have {
                    return Err(InventoryError::InsufficientQuantity { have, need: count });
                }
                if count == have {
                    continue;
                }
                stack.set_count(&mut st, have - count);
                self.upsert_throttled(stack, &st);
                let enchant = st.enchant;
                drop(st);

                let piece = ItemStack::new(stack.template().clone(), self.owner_id, count);
                {
                    let mut p = piece.lock();
                    p.enchant = enchant;
                }
                self.persist_now(&piece);
                tracing::debug!(instance = %piece.instance_id(), count, reason, actor = ?actor, "split dropped");
                return Ok(piece);
            }

            let mut entries = self.entries.write();
            let mut st = stack.lock();
            if !self.holds(&st) {
                return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
            }
            let have = stack.count();
            if count > have {
                return Err(InventoryError::InsufficientQuantity { have, need: count });
            }
            if count < have {
                drop(st);
                drop(entries);
                continue;
            }
            if st.location.is_equipped() {
                return Err(InventoryError::BlockedByPolicy(
                    "unequip before dropping an equipped stack",
                ));
            }
            Self::remove_entry(&mut entries, stack.instance_id());
            st.location = ItemLocation::Void;
            let record = stack.record(&st);
            drop(st);
            drop(entries);
            if let Err(e) = self.persist.upsert(&record) {
                tracing::error!(instance = %stack.instance_id(), error = %e, "drop upsert failed");
            }
            tracing::debug!(instance = %stack.instance_id(), count, reason, actor = ?actor, "stack dropped");
            return Ok(stack.clone());
        }
    }

    // ========================================================================
    // TRANSFER
    // ========================================================================

    /// Move `count` units to another container. Atomic with respect to the
    /// source instance's lock; the destination admits the moved quantity
    /// through its own `add_stack`, so there is a narrow window where the
    /// quantity is in flight and visible to neither container.
    pub fn transfer_item(
        &self,
        reason: &str,
        instance_id: InstanceId,
        count: u32,
        dest: &Container,
        actor: Option<OwnerId>,
    ) -> InvResult<Arc<ItemStack>> {
        if count == 0 {
            return Err(InventoryError::Validation {
                field: "count",
                message: "must be positive".to_string(),
            });
        }
        if std::ptr::eq(self, dest) {
            return Err(InventoryError::Validation {
                field: "dest",
                message: "destination container is the source".to_string(),
            });
        }
        let Some(stack) = self.item_by_instance(instance_id) else {
            return Err(InventoryError::ConcurrentRemoval(instance_id));
        };

        loop {
            if count == stack.count() {
                // Whole stack: detach here, then hand the same instance to
                // the destination (O(1) when nothing merges over there).
                let mut entries = self.entries.write();
                let mut st = stack.lock();
                if !self.holds(&st) {
                    return Err(InventoryError::ConcurrentRemoval(instance_id));
                }
                if st.location.is_equipped() {
                    return Err(InventoryError::BlockedByPolicy(
                        "unequip before transferring an equipped stack",
                    ));
                }
                if count != stack.count() {
                    drop(st);
                    drop(entries);
                    continue;
                }
                Self::remove_entry(&mut entries, instance_id);
                st.location = ItemLocation::Void;
                drop(st);
                drop(entries);

                return match dest.add_stack(reason, stack.clone(), actor) {
                    Ok(result) => {
                        tracing::debug!(
                            from = %self.owner_id,
                            to = %dest.owner_id,
                            instance = %instance_id,
                            count,
                            reason,
                            "stack transferred"
                        );
                        Ok(result)
                    }
                    Err(e) => {
                        // It fit here a moment ago; reattach without
                        // re-admission.
                        self.reattach(&stack);
                        Err(e)
                    }
                };
            }

            // Partial: split off a detached piece.
            let mut st = stack.lock();
            if !self.holds(&st) {
                return Err(InventoryError::ConcurrentRemoval(instance_id));
            }
            let have = stack.count();
            if count > have {
                return Err(InventoryError::InsufficientQuantity { have, need: count });
            }
            if count == have {
                drop(st);
                continue;
            }
            stack.set_count(&mut st, have - count);
            self.upsert_throttled(&stack, &st);
            let enchant = st.enchant;
            drop(st);

            let piece = ItemStack::new(stack.template().clone(), dest.owner_id, count);
            {
                let mut p = piece.lock();
                p.enchant = enchant;
            }
            return match dest.add_stack(reason, piece, actor) {
                Ok(result) => Ok(result),
                Err(e) => {
                    // Undo the decrement; the piece was never persisted.
                    let mut st = stack.lock();
                    let cur = stack.count();
                    stack.set_count(&mut st, cur + count);
                    self.upsert_throttled(&stack, &st);
                    Err(e)
                }
            };
        }
    }

    /// Rewrite the enchant level of a held instance and persist the row.
    pub fn set_enchant(&self, stack: &Arc<ItemStack>, enchant: u32) -> InvResult<()> {
        let mut st = stack.lock();
        if !self.holds(&st) {
            tracing::warn!(instance = %stack.instance_id(), "enchant update lost race with removal");
            return Err(InventoryError::ConcurrentRemoval(stack.instance_id()));
        }
        st.enchant = enchant;
        let record = stack.record(&st);
        drop(st);
        if let Err(err) = self.persist.upsert(&record) {
            tracing::error!(instance = %stack.instance_id(), %err, "enchant upsert failed");
        }
        Ok(())
    }

    // ========================================================================
    // RESTORE / FLUSH
    // ========================================================================

    /// Repopulate from the persistence port at owner activation. Rows whose
    /// template no longer exists are skipped with a warning, not a failure.
    pub fn restore(&self) -> InvResult<Vec<Arc<ItemStack>>> {
        let records = self.persist.restore(self.owner_id, self.base_location)?;
        let mut restored = Vec::with_capacity(records.len());
        for record in records {
            if record.count == 0 {
                continue;
            }
            let Some(template) = self.catalog.lookup(record.template_id) else {
                tracing::warn!(
                    template_id = %record.template_id,
                    instance = %record.instance_id,
                    "skipping restore row with unknown template"
                );
                continue;
            };
            restored.push(ItemStack::from_record(template, &record));
        }
        let mut entries = self.entries.write();
        let mut next: Vec<_> = entries.iter().cloned().collect();
        next.extend(restored.iter().cloned());
        *entries = Arc::new(next);
        drop(entries);
        tracing::debug!(owner = %self.owner_id, count = restored.len(), "container restored");
        Ok(restored)
    }

    /// Unconditional upsert of every entry. Run at container teardown to
    /// catch rows the currency throttle skipped.
    pub fn flush_all(&self) {
        for stack in self.items().iter() {
            self.persist_now(stack);
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    pub(crate) fn resident_location(&self) -> ItemLocation {
        match *self.active_branch.read() {
            Some(branch) => ItemLocation::Remote(self.base_location, branch),
            None => ItemLocation::Stored(self.base_location),
        }
    }

    pub(crate) fn set_active_branch(&self, branch: Option<BranchId>) {
        *self.active_branch.write() = branch;
    }

    pub(crate) fn active_branch(&self) -> Option<BranchId> {
        *self.active_branch.read()
    }

    /// Does this container currently hold the instance? Checked under the
    /// instance lock to guard against racing removals.
    pub(crate) fn holds(&self, st: &StackState) -> bool {
        st.owner_id == self.owner_id && st.location.base() == Some(self.base_location)
    }

    /// A merge target must sit at the container's resident location (branch
    /// included for remote storage) or be equipped out of it: ammo stacks
    /// keep merging while worn.
    fn merge_target_ok(&self, st: &StackState) -> bool {
        st.owner_id == self.owner_id
            && (st.location == self.resident_location()
                || matches!(st.location, ItemLocation::Equipped(base, _) if base == self.base_location))
    }

    /// Merge `count` fresh units into an existing entry. Returns false when
    /// the candidate raced out of the container.
    fn try_merge(
        &self,
        entries: &[Arc<ItemStack>],
        existing: &Arc<ItemStack>,
        template: &ItemTemplate,
        count: u32,
    ) -> InvResult<bool> {
        let mut st = existing.lock();
        if !self.merge_target_ok(&st) {
            return Ok(false);
        }
        let added_weight = u64::from(template.weight) * u64::from(count);
        self.check_weight(entries, added_weight)?;
        let cur = existing.count();
        existing.set_count(&mut st, cur + count);
        self.upsert_throttled(existing, &st);
        Ok(true)
    }

    /// Merge an adopted detached instance into an existing entry, consuming
    /// the adopted one. Its row is deleted before the counts move so a crash
    /// can never duplicate the quantity.
    fn try_adopt_merge(
        &self,
        entries: &[Arc<ItemStack>],
        existing: &Arc<ItemStack>,
        adopted: &Arc<ItemStack>,
        template: &ItemTemplate,
        count: u32,
    ) -> InvResult<bool> {
        let mut st = existing.lock();
        if !self.merge_target_ok(&st) {
            return Ok(false);
        }
        let added_weight = u64::from(template.weight) * u64::from(count);
        self.check_weight(entries, added_weight)?;
        self.persist.delete(adopted.instance_id())?;
        {
            // The adopted instance is unreachable from any container, so
            // taking its lock here cannot form a cycle.
            let mut ad = adopted.lock();
            adopted.set_count(&mut ad, 0);
            ad.location = ItemLocation::Void;
        }
        let cur = existing.count();
        existing.set_count(&mut st, cur + count);
        self.upsert_throttled(existing, &st);
        Ok(true)
    }

    /// Re-parent a detached instance into this container. Caller has already
    /// passed admission checks.
    fn adopt(&self, stack: &Arc<ItemStack>) {
        let mut st = stack.lock();
        st.owner_id = self.owner_id;
        st.location = self.resident_location();
    }

    pub(crate) fn reattach(&self, stack: &Arc<ItemStack>) {
        let mut entries = self.entries.write();
        {
            let mut st = stack.lock();
            st.owner_id = self.owner_id;
            st.location = self.resident_location();
        }
        Self::push_entry(&mut entries, stack.clone());
        drop(entries);
        self.persist_now(stack);
    }

    fn check_admit(
        &self,
        entries: &[Arc<ItemStack>],
        template: &ItemTemplate,
        new_entries: u32,
        added_weight: u64,
    ) -> InvResult<()> {
        let limit = if template.is_quest {
            self.policy.quest_slot_limit()
        } else {
            self.policy.slot_limit()
        };
        if let Some(limit) = limit {
            let used = entries
                .iter()
                .filter(|e| e.template().is_quest == template.is_quest)
                .count() as u32;
            if used + new_entries > limit {
                return Err(InventoryError::CapacityExceeded { used, limit });
            }
        }
        self.check_weight(entries, added_weight)
    }

    fn check_weight(&self, entries: &[Arc<ItemStack>], added: u64) -> InvResult<()> {
        if let Some(limit) = self.policy.weight_limit() {
            let current: u64 = entries.iter().map(|e| e.total_weight()).sum();
            if current + added > limit {
                return Err(InventoryError::WeightExceeded {
                    current,
                    added,
                    limit,
                });
            }
        }
        Ok(())
    }

    fn push_entry(entries: &mut Arc<Vec<Arc<ItemStack>>>, stack: Arc<ItemStack>) {
        let mut next: Vec<_> = entries.iter().cloned().collect();
        next.push(stack);
        *entries = Arc::new(next);
    }

    fn remove_entry(entries: &mut Arc<Vec<Arc<ItemStack>>>, instance_id: InstanceId) {
        let next: Vec<_> = entries
            .iter()
            .filter(|e| e.instance_id() != instance_id)
            .cloned()
            .collect();
        *entries = Arc::new(next);
    }

    pub(crate) fn persist_now(&self, stack: &Arc<ItemStack>) {
        let st = stack.lock();
        let record = stack.record(&st);
        drop(st);
        if let Err(e) = self.persist.upsert(&record) {
            tracing::error!(instance = %stack.instance_id(), error = %e, "upsert failed");
        }
    }

    /// Fire-and-forget upsert, probabilistically skipped for templates the
    /// policy marks as write-throttled (currency).
    fn upsert_throttled(&self, stack: &Arc<ItemStack>, st: &StackState) {
        if let Some(denominator) = self.policy.persist_throttle(stack.template_id())
            && rand::rng().random_range(0..denominator) != 0
        {
            return;
        }
        if let Err(e) = self.persist.upsert(&stack.record(st)) {
            tracing::error!(instance = %stack.instance_id(), error = %e, "upsert failed");
        }
    }
}

impl core::fmt::Debug for Container {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Container")
            .field("owner_id", &self.owner_id)
            .field("base_location", &self.base_location)
            .field("entries", &self.items().len())
            .finish_non_exhaustive()
    }
}
