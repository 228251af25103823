//! The static, read-mostly game data surface. Grounded on `valence`'s
//! `AsyncCallbacks` collaborator pattern in `crates/valence/src/config.rs`:
//! the server holds a `dyn DataCatalog` behind an `Arc` and never mutates it
//! at runtime, so lookups can be plain synchronous calls rather than async.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thornmere_math::Vec3;

use crate::ids::{ItemId, NpcTemplateId, ResourceTemplateId, ZoneId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub stackable: bool,
    pub tradeable: bool,
    pub base_value: u64,
    pub equipment_slot: Option<crate::inventory::EquipmentSlot>,
    /// Maximum units of this item a single character may buy on the
    /// exchange within the buy-limit window (spec §4.9).
    pub buy_limit: u32,
    /// Maximum quantity a single stack of this item may hold. Ignored for
    /// non-stackable items, which always occupy one slot per unit.
    pub max_stack: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: ItemId,
    pub min_quantity: u32,
    pub max_quantity: u32,
    /// Chance in [0.0, 1.0] that this entry is rolled on a kill.
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcTemplate {
    pub id: NpcTemplateId,
    pub name: String,
    pub max_health: i64,
    pub combat_level: u32,
    pub aggressive: bool,
    pub aggro_radius: f64,
    pub leash_radius: f64,
    pub respawn_delay_ms: u64,
    pub drop_table: Vec<LootEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub id: ResourceTemplateId,
    pub name: String,
    pub yields: ItemId,
    pub required_skill: String,
    pub required_level: u32,
    pub depletion_chance: f64,
    pub respawn_delay_ms: u64,
    /// XP granted to `required_skill` on a successful gather (spec §4.7/§8.6).
    pub xp_per_gather: f64,
    /// When the harvester's level exceeds this, `depletion_chance` is
    /// boosted 1.5x (capped at 1.0), per spec §4.6.
    pub bonus_level_req: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub display_name: String,
    pub max_level: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: ZoneId,
    pub min: Vec3,
    pub max: Vec3,
}

/// The static game-data surface: item, NPC, resource, skill definitions and
/// zone boundaries. Implementations are expected to load once at startup
/// (from disk, a database, or an embedded table) and serve lookups from
/// memory for the life of the process.
pub trait DataCatalog: Send + Sync {
    fn item(&self, id: ItemId) -> Option<&ItemDef>;
    fn npc_template(&self, id: NpcTemplateId) -> Option<&NpcTemplate>;
    fn resource_template(&self, id: ResourceTemplateId) -> Option<&ResourceTemplate>;
    fn skill(&self, id: &str) -> Option<&SkillDef>;
    fn skills(&self) -> &[SkillDef];
    fn zone(&self, id: ZoneId) -> Option<&ZoneDef>;
}

/// An in-memory catalog built from plain tables, suitable both for the
/// `testing` doubles and for a production deployment that loads its data
/// once at boot and never needs to refresh it.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    pub items: HashMap<ItemId, ItemDef>,
    pub npc_templates: HashMap<NpcTemplateId, NpcTemplate>,
    pub resource_templates: HashMap<ResourceTemplateId, ResourceTemplate>,
    pub skills: Vec<SkillDef>,
    pub zones: HashMap<ZoneId, ZoneDef>,
}

impl DataCatalog for StaticCatalog {
    fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(&id)
    }

    fn npc_template(&self, id: NpcTemplateId) -> Option<&NpcTemplate> {
        self.npc_templates.get(&id)
    }

    fn resource_template(&self, id: ResourceTemplateId) -> Option<&ResourceTemplate> {
        self.resource_templates.get(&id)
    }

    fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }

    fn skills(&self) -> &[SkillDef] {
        &self.skills
    }

    fn zone(&self, id: ZoneId) -> Option<&ZoneDef> {
        self.zones.get(&id)
    }
}
