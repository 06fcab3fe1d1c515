use crate::models::types::TemplateId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Body-part mask carried by an item template. Single bits name one
    /// paperdoll position; the composite constants are the special cases the
    /// equip resolver switches on (two-handed grips, dual ear/finger slots,
    /// one-piece armors, formal wear).
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BodyPart: u32 {
        const UNDERWEAR = 1 << 0;
        const R_EAR     = 1 << 1;
        const L_EAR     = 1 << 2;
        const NECK      = 1 << 3;
        const R_FINGER  = 1 << 4;
        const L_FINGER  = 1 << 5;
        const HEAD      = 1 << 6;
        const R_HAND    = 1 << 7;
        const L_HAND    = 1 << 8;
        const GLOVES    = 1 << 9;
        const CHEST     = 1 << 10;
        const LEGS      = 1 << 11;
        const FEET      = 1 << 12;
        const BACK      = 1 << 13;
        const HAIR      = 1 << 14;
        const FULL_HAIR = 1 << 15;
        const BELT      = 1 << 16;

        const TWO_HAND   = Self::R_HAND.bits() | Self::L_HAND.bits();
        const EAR        = Self::R_EAR.bits() | Self::L_EAR.bits();
        const FINGER     = Self::R_FINGER.bits() | Self::L_FINGER.bits();
        const FULL_ARMOR = Self::CHEST.bits() | Self::LEGS.bits();
        const ALL_DRESS  = Self::CHEST.bits()
            | Self::LEGS.bits()
            | Self::L_HAND.bits()
            | Self::R_HAND.bits()
            | Self::HEAD.bits()
            | Self::FEET.bits()
            | Self::GLOVES.bits();
    }
}

bitflags! {
    /// Armor-category bits active on the paperdoll. A set bit means both the
    /// chest and legs positions are covered by that category, which is what
    /// two-piece set bonuses gate on.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WornSet: u8 {
        const LIGHT = 1 << 0;
        const HEAVY = 1 << 1;
        const ROBE  = 1 << 2;
    }
}

/// One paperdoll position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum Slot {
    Underwear = 0,
    LeftEar,
    RightEar,
    Neck,
    LeftFinger,
    RightFinger,
    Head,
    RightHand,
    LeftHand,
    Gloves,
    Chest,
    Legs,
    Feet,
    Back,
    Hair,
    FullHair,
    Belt,
}

impl Slot {
    pub const COUNT: usize = 17;

    pub const ALL: [Slot; Self::COUNT] = [
        Slot::Underwear,
        Slot::LeftEar,
        Slot::RightEar,
        Slot::Neck,
        Slot::LeftFinger,
        Slot::RightFinger,
        Slot::Head,
        Slot::RightHand,
        Slot::LeftHand,
        Slot::Gloves,
        Slot::Chest,
        Slot::Legs,
        Slot::Feet,
        Slot::Back,
        Slot::Hair,
        Slot::FullHair,
        Slot::Belt,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Slot for a single-bit body part. Composite masks (two-hand, full armor,
/// dual ear/finger, all-dress) are resolved by the paperdoll, not here.
pub fn default_slot(part: BodyPart) -> Option<Slot> {
    const TABLE: [(BodyPart, Slot); 17] = [
        (BodyPart::UNDERWEAR, Slot::Underwear),
        (BodyPart::L_EAR, Slot::LeftEar),
        (BodyPart::R_EAR, Slot::RightEar),
        (BodyPart::NECK, Slot::Neck),
        (BodyPart::L_FINGER, Slot::LeftFinger),
        (BodyPart::R_FINGER, Slot::RightFinger),
        (BodyPart::HEAD, Slot::Head),
        (BodyPart::R_HAND, Slot::RightHand),
        (BodyPart::L_HAND, Slot::LeftHand),
        (BodyPart::GLOVES, Slot::Gloves),
        (BodyPart::CHEST, Slot::Chest),
        (BodyPart::LEGS, Slot::Legs),
        (BodyPart::FEET, Slot::Feet),
        (BodyPart::BACK, Slot::Back),
        (BodyPart::HAIR, Slot::Hair),
        (BodyPart::FULL_HAIR, Slot::FullHair),
        (BodyPart::BELT, Slot::Belt),
    ];
    TABLE.iter().find(|(p, _)| *p == part).map(|(_, s)| *s)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Sword,
    Blunt,
    Dagger,
    Pole,
    Fist,
    Dual,
    Bow,
    FishingRod,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorKind {
    Light,
    Heavy,
    Robe,
    /// Jewelry and other worn pieces outside the three set categories.
    Accessory,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EtcKind {
    Arrow,
    Lure,
    Material,
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    Weapon(WeaponKind),
    Armor(ArmorKind),
    Etc(EtcKind),
}

impl TemplateKind {
    /// Off-hand items that ride along with a two-handed main weapon instead
    /// of displacing it (bow+arrow, fishing rod+lure).
    pub fn is_paired_offhand(&self, offhand: &TemplateKind) -> bool {
        matches!(
            (self, offhand),
            (TemplateKind::Weapon(WeaponKind::Bow), TemplateKind::Etc(EtcKind::Arrow))
                | (
                    TemplateKind::Weapon(WeaponKind::FishingRod),
                    TemplateKind::Etc(EtcKind::Lure)
                )
        )
    }

    pub fn worn_set_bit(&self) -> WornSet {
        match self {
            TemplateKind::Armor(ArmorKind::Light) => WornSet::LIGHT,
            TemplateKind::Armor(ArmorKind::Heavy) => WornSet::HEAVY,
            TemplateKind::Armor(ArmorKind::Robe) => WornSet::ROBE,
            _ => WornSet::empty(),
        }
    }
}

/// Immutable item definition from the static catalog. The engine only ever
/// reads these; content loading owns their construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: TemplateId,
    pub name: String,
    pub kind: TemplateKind,
    /// Empty for items that cannot be equipped.
    pub body_part: BodyPart,
    pub weight: u32,
    pub stackable: bool,
    pub is_quest: bool,
    pub tradable: bool,
}

impl ItemTemplate {
    pub fn is_equippable(&self) -> bool {
        !self.body_part.is_empty()
    }
}
