use crate::models::types::TemplateId;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Tunables for the container family. Loaded once at startup; the owner
/// policies copy what they need out of it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Distinct non-quest entries a player inventory may hold.
    pub slot_limit: u32,
    /// Separate budget for quest-flagged entries.
    pub quest_slot_limit: u32,
    /// Distinct entries per warehouse/freight container.
    pub warehouse_slot_limit: u32,
    /// Total carried weight for a player inventory.
    pub weight_limit: u64,
    /// Bulk adds of non-stackable templates create one instance per unit
    /// when true, a single count-bearing instance when false.
    pub multi_drop: bool,
    /// Currency templates get the O(1) balance fast path and throttled
    /// persistence. The concrete ids are content, not engine, decisions.
    pub primary_currency: TemplateId,
    pub secondary_currency: TemplateId,
    /// Roughly one in this many currency count updates is flushed; the rest
    /// ride on the full flush at container teardown.
    pub currency_flush_denominator: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            slot_limit: 80,
            quest_slot_limit: 100,
            warehouse_slot_limit: 120,
            weight_limit: 69_000,
            multi_drop: true,
            primary_currency: TemplateId(1),
            secondary_currency: TemplateId(2),
            currency_flush_denominator: 10,
        }
    }
}

impl InventoryConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env");
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("INV_SLOT_LIMIT") {
            cfg.slot_limit = v.parse()?;
        }
        if let Ok(v) = std::env::var("INV_QUEST_SLOT_LIMIT") {
            cfg.quest_slot_limit = v.parse()?;
        }
        if let Ok(v) = std::env::var("INV_WAREHOUSE_SLOT_LIMIT") {
            cfg.warehouse_slot_limit = v.parse()?;
        }
        if let Ok(v) = std::env::var("INV_WEIGHT_LIMIT") {
            cfg.weight_limit = v.parse()?;
        }
        if let Ok(v) = std::env::var("INV_MULTI_DROP") {
            cfg.multi_drop = v.parse()?;
        }
        if let Ok(v) = std::env::var("INV_PRIMARY_CURRENCY") {
            cfg.primary_currency = TemplateId(v.parse()?);
        }
        if let Ok(v) = std::env::var("INV_SECONDARY_CURRENCY") {
            cfg.secondary_currency = TemplateId(v.parse()?);
        }
        if let Ok(v) = std::env::var("INV_CURRENCY_FLUSH_DENOMINATOR") {
            cfg.currency_flush_denominator = v.parse()?;
        }
        Ok(cfg)
    }
}
