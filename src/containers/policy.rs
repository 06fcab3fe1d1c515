use crate::config::InventoryConfig;
use crate::models::types::TemplateId;

/// Capacity and persistence policy one owner kind supplies to its container.
/// `None` limits mean unlimited.
pub trait CapacityPolicy {
    fn slot_limit(&self) -> Option<u32>;

    fn quest_slot_limit(&self) -> Option<u32>;

    fn weight_limit(&self) -> Option<u64>;

    /// `Some(n)` when count updates for this template may be flushed only
    /// about once every `n` writes. The in-memory instance stays
    /// authoritative; a full flush happens at container teardown.
    fn persist_throttle(&self, _template_id: TemplateId) -> Option<u32> {
        None
    }

    /// Whether bulk adds of non-stackable templates fan out into one
    /// instance per unit.
    fn multi_drop(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct PlayerLimits {
    pub slots: u32,
    pub quest_slots: u32,
    pub weight: u64,
    pub currencies: [TemplateId; 2],
    pub flush_denominator: u32,
    pub multi_drop: bool,
}

impl PlayerLimits {
    pub fn from_config(cfg: &InventoryConfig) -> Self {
        Self {
            slots: cfg.slot_limit,
            quest_slots: cfg.quest_slot_limit,
            weight: cfg.weight_limit,
            currencies: [cfg.primary_currency, cfg.secondary_currency],
            flush_denominator: cfg.currency_flush_denominator.max(1),
            multi_drop: cfg.multi_drop,
        }
    }
}

/// Ceilings come from the pet's own template, not from server config.
#[derive(Debug, Clone)]
pub struct PetLimits {
    pub slots: u32,
    pub weight: u64,
}

#[derive(Debug, Clone)]
pub struct WarehouseLimits {
    pub slots: u32,
}

/// The closed set of owner kinds. Dispatch is explicit; there is no open
/// subclassing of containers.
#[derive(Debug, Clone)]
pub enum OwnerPolicy {
    Unlimited,
    Player(PlayerLimits),
    Pet(PetLimits),
    Warehouse(WarehouseLimits),
}

impl CapacityPolicy for OwnerPolicy {
    fn slot_limit(&self) -> Option<u32> {
        match self {
            OwnerPolicy::Unlimited => None,
            OwnerPolicy::Player(p) => Some(p.slots),
            OwnerPolicy::Pet(p) => Some(p.slots),
            OwnerPolicy::Warehouse(w) => Some(w.slots),
        }
    }

    fn quest_slot_limit(&self) -> Option<u32> {
        match self {
            OwnerPolicy::Player(p) => Some(p.quest_slots),
            _ => None,
        }
    }

    fn weight_limit(&self) -> Option<u64> {
        match self {
            OwnerPolicy::Player(p) => Some(p.weight),
            OwnerPolicy::Pet(p) => Some(p.weight),
            _ => None,
        }
    }

    fn persist_throttle(&self, template_id: TemplateId) -> Option<u32> {
        match self {
            OwnerPolicy::Player(p) if p.currencies.contains(&template_id) => {
                Some(p.flush_denominator)
            }
            _ => None,
        }
    }

    fn multi_drop(&self) -> bool {
        match self {
            OwnerPolicy::Player(p) => p.multi_drop,
            _ => true,
        }
    }
}
