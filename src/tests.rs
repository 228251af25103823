//! Integration-test helpers. Reduces boilerplate in the submodules below,
//! mirroring `crates/valence/src/tests.rs`'s `scenario_single_client` helper.

use std::sync::Arc;

use thornmere_math::Vec3;
use thornmere_server::catalog::{ItemDef, NpcTemplate, ResourceTemplate, StaticCatalog};
use thornmere_server::character::Character;
use thornmere_server::config::ServerConfig;
use thornmere_server::catalog::ZoneDef;
use thornmere_server::ids::{CharacterId, ItemId, NpcTemplateId, ResourceTemplateId, ZoneId};
use thornmere_server::world::World;

/// Builds a `World` with a catalog stocked for the scenarios below: a
/// tradeable sword, an aggressive goblin template, and a woodcutting tree.
pub fn test_world() -> World {
    let mut catalog = StaticCatalog::default();
    catalog.items.insert(
        ItemId(1),
        ItemDef {
            id: ItemId(1),
            name: "Bronze Sword".to_owned(),
            stackable: false,
            tradeable: true,
            base_value: 10,
            equipment_slot: None,
            buy_limit: 1000,
            max_stack: 1,
        },
    );
    catalog.npc_templates.insert(
        NpcTemplateId(1),
        NpcTemplate {
            id: NpcTemplateId(1),
            name: "Goblin".to_owned(),
            max_health: 20,
            combat_level: 2,
            aggressive: true,
            aggro_radius: 10.0,
            leash_radius: 15.0,
            respawn_delay_ms: 10_000,
            drop_table: vec![],
        },
    );
    catalog.resource_templates.insert(
        ResourceTemplateId(1),
        ResourceTemplate {
            id: ResourceTemplateId(1),
            name: "Oak Tree".to_owned(),
            yields: ItemId(2),
            required_skill: "woodcutting".to_owned(),
            required_level: 1,
            depletion_chance: 0.0,
            respawn_delay_ms: 5_000,
            xp_per_gather: 25.0,
            bonus_level_req: None,
        },
    );
    catalog.zones.insert(
        ZoneId(1),
        ZoneDef {
            id: ZoneId(1),
            min: Vec3::new(-500.0, -50.0, -500.0),
            max: Vec3::new(500.0, 50.0, 500.0),
        },
    );

    World::new(ServerConfig::default(), Arc::new(catalog))
}

pub fn spawn_test_character(world: &mut World, position: Vec3) -> CharacterId {
    let character = Character::new(
        CharacterId::new(),
        thornmere_server::ids::AccountId::new(),
        "Test".to_owned(),
        position,
        ZoneId(1),
    );
    let id = character.id;
    world.spawn_character(character);
    id
}

mod exchange;
mod npc_combat;
