//! NPC lifecycle (spec §4.5): spawn from template, a small aggro/leash AI
//! state machine, death and loot rolls, and delayed respawn via a min-heap
//! keyed by respawn time. Grounded on `valence`'s `McEntity`/`EntityManager`
//! spawn-and-despawn bookkeeping in `crates/valence/src/entity.rs`, adapted
//! from a general entity registry to the narrower NPC lifecycle this design
//! needs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;
use rustc_hash::FxHashMap;
use thornmere_math::{horizontal_distance, Vec3};

use crate::catalog::{DataCatalog, LootEntry, NpcTemplate};
use crate::ids::{ItemId, NpcId, NpcTemplateId, ZoneId};
use crate::inventory::ItemStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcAiState {
    Idle,
    Aggro,
    Leashing,
    Dead,
}

#[derive(Debug, Clone)]
pub struct NpcInstance {
    pub id: NpcId,
    pub template: NpcTemplateId,
    pub zone: ZoneId,
    pub spawn_position: Vec3,
    pub position: Vec3,
    pub health: i64,
    pub max_health: i64,
    pub state: NpcAiState,
    pub target: Option<crate::ids::CharacterId>,
}

impl NpcInstance {
    fn from_template(id: NpcId, zone: ZoneId, spawn: Vec3, template: &NpcTemplate) -> Self {
        Self {
            id,
            template: template.id,
            zone,
            spawn_position: spawn,
            position: spawn,
            health: template.max_health,
            max_health: template.max_health,
            state: NpcAiState::Idle,
            target: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != NpcAiState::Dead
    }
}

struct RespawnEntry {
    ready_at_ms: u64,
    template: NpcTemplateId,
    zone: ZoneId,
    spawn_position: Vec3,
}

impl PartialEq for RespawnEntry {
    fn eq(&self, other: &Self) -> bool {
        self.ready_at_ms == other.ready_at_ms
    }
}
impl Eq for RespawnEntry {}
impl PartialOrd for RespawnEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RespawnEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ready_at_ms.cmp(&other.ready_at_ms)
    }
}

#[derive(Default)]
pub struct NpcManager {
    npcs: FxHashMap<NpcId, NpcInstance>,
    respawn_queue: BinaryHeap<Reverse<RespawnEntryOrd>>,
}

/// `BinaryHeap` needs `Ord`; wrapping in `Reverse` turns it into a min-heap
/// by `ready_at_ms` so `pop` always yields the soonest-ready respawn.
struct RespawnEntryOrd(RespawnEntry);
impl PartialEq for RespawnEntryOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl Eq for RespawnEntryOrd {}
impl PartialOrd for RespawnEntryOrd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RespawnEntryOrd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl NpcManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, zone: ZoneId, position: Vec3, template: &NpcTemplate) -> NpcId {
        let id = NpcId::new();
        self.npcs.insert(id, NpcInstance::from_template(id, zone, position, template));
        id
    }

    pub fn get(&self, id: NpcId) -> Option<&NpcInstance> {
        self.npcs.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &NpcInstance> {
        self.npcs.values()
    }

    /// Runs one AI tick for `id` against `player_position` in the same
    /// zone: idle NPCs aggro when a player enters `aggro_radius`, aggroed
    /// NPCs leash home once the player exits `leash_radius`.
    pub fn update_ai(&mut self, id: NpcId, player: crate::ids::CharacterId, player_position: Vec3, template: &NpcTemplate) {
        let Some(npc) = self.npcs.get_mut(&id) else { return };
        if !npc.is_alive() || !template.aggressive {
            return;
        }
        let dist_to_spawn = horizontal_distance(npc.position, npc.spawn_position);
        let dist_to_player = horizontal_distance(npc.position, player_position);

        match npc.state {
            NpcAiState::Idle if dist_to_player <= template.aggro_radius => {
                npc.state = NpcAiState::Aggro;
                npc.target = Some(player);
            }
            NpcAiState::Aggro if dist_to_spawn > template.leash_radius => {
                npc.state = NpcAiState::Leashing;
                npc.target = None;
            }
            NpcAiState::Leashing if dist_to_spawn <= 1.0 => {
                npc.state = NpcAiState::Idle;
            }
            _ => {}
        }
    }

    /// Applies damage, returns the rolled loot and schedules a respawn if
    /// this brings the NPC to 0 health.
    pub fn apply_damage(
        &mut self,
        id: NpcId,
        amount: i64,
        now_ms: u64,
        template: &NpcTemplate,
        rng: &mut impl Rng,
    ) -> Option<Vec<ItemStack>> {
        let npc = self.npcs.get_mut(&id)?;
        if !npc.is_alive() {
            return None;
        }
        npc.health = (npc.health - amount).max(0);
        if npc.health > 0 {
            return None;
        }
        npc.state = NpcAiState::Dead;
        let loot = roll_loot(&template.drop_table, rng);
        self.respawn_queue.push(Reverse(RespawnEntryOrd(RespawnEntry {
            ready_at_ms: now_ms + template.respawn_delay_ms,
            template: template.id,
            zone: npc.zone,
            spawn_position: npc.spawn_position,
        })));
        self.npcs.remove(&id);
        Some(loot)
    }

    /// Pops and returns every respawn whose deadline has passed, so the
    /// caller can look up the template and re-spawn them. Consumes ready
    /// entries from the heap; any entries still in the future are left in
    /// place for the next call.
    pub fn drain_ready_respawns(&mut self, now_ms: u64) -> Vec<(NpcTemplateId, ZoneId, Vec3)> {
        let mut ready = Vec::new();
        while let Some(Reverse(entry)) = self.respawn_queue.peek() {
            if entry.0.ready_at_ms > now_ms {
                break;
            }
            let Some(Reverse(entry)) = self.respawn_queue.pop() else { break };
            ready.push((entry.0.template, entry.0.zone, entry.0.spawn_position));
        }
        ready
    }
}

fn roll_loot(table: &[LootEntry], rng: &mut impl Rng) -> Vec<ItemStack> {
    let mut drops = Vec::new();
    for entry in table {
        if rng.gen_bool(entry.chance.clamp(0.0, 1.0)) {
            let qty = if entry.max_quantity > entry.min_quantity {
                rng.gen_range(entry.min_quantity..=entry.max_quantity)
            } else {
                entry.min_quantity
            };
            drops.push(ItemStack::new(entry.item, qty));
        }
    }
    drops
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn template() -> NpcTemplate {
        NpcTemplate {
            id: NpcTemplateId(1),
            name: "Goblin".to_owned(),
            max_health: 50,
            combat_level: 5,
            aggressive: true,
            aggro_radius: 10.0,
            leash_radius: 15.0,
            respawn_delay_ms: 30_000,
            drop_table: vec![LootEntry {
                item: ItemId(1),
                min_quantity: 1,
                max_quantity: 1,
                chance: 1.0,
            }],
        }
    }

    #[test]
    fn damage_that_reduces_health_to_zero_kills_and_schedules_respawn() {
        let mut mgr = NpcManager::new();
        let tmpl = template();
        let id = mgr.spawn(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), &tmpl);
        let mut rng = StdRng::seed_from_u64(1);
        let loot = mgr.apply_damage(id, 100, 0, &tmpl, &mut rng);
        assert!(loot.is_some());
        assert!(mgr.get(id).is_none());
        assert!(mgr.drain_ready_respawns(0).is_empty());
        let ready = mgr.drain_ready_respawns(30_000);
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn partial_damage_does_not_kill() {
        let mut mgr = NpcManager::new();
        let tmpl = template();
        let id = mgr.spawn(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), &tmpl);
        let mut rng = StdRng::seed_from_u64(1);
        let loot = mgr.apply_damage(id, 10, 0, &tmpl, &mut rng);
        assert!(loot.is_none());
        assert_eq!(mgr.get(id).unwrap().health, 40);
    }

    #[test]
    fn idle_npc_aggros_when_player_enters_radius() {
        let mut mgr = NpcManager::new();
        let tmpl = template();
        let id = mgr.spawn(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), &tmpl);
        let player = crate::ids::CharacterId::new();
        mgr.update_ai(id, player, Vec3::new(5.0, 0.0, 0.0), &tmpl);
        assert_eq!(mgr.get(id).unwrap().state, NpcAiState::Aggro);
    }

    #[test]
    fn aggroed_npc_leashes_home_past_leash_radius() {
        let mut mgr = NpcManager::new();
        let tmpl = template();
        let id = mgr.spawn(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), &tmpl);
        let player = crate::ids::CharacterId::new();
        mgr.update_ai(id, player, Vec3::new(5.0, 0.0, 0.0), &tmpl);
        if let Some(npc) = mgr.npcs.get_mut(&id) {
            npc.position = Vec3::new(20.0, 0.0, 0.0);
        }
        mgr.update_ai(id, player, Vec3::new(20.0, 0.0, 0.0), &tmpl);
        assert_eq!(mgr.get(id).unwrap().state, NpcAiState::Leashing);
    }
}
