//! Zone indexing and broadcast scoping (spec §4.4). Grounded on
//! `valence_core`'s `ChunkView`/AABB broadcast-radius approach, generalized
//! from Minecraft's chunk grid to a flat set of named zones, each zone being
//! the unit of both simulation partitioning and broadcast scope.

use rustc_hash::FxHashMap;
use thornmere_math::{horizontal_distance, Aabb, Vec3};

use crate::ids::{CharacterId, NpcId, ResourceId, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Character,
    Npc,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Character(CharacterId),
    Npc(NpcId),
    Resource(ResourceId),
}

#[derive(Debug, Clone, Copy)]
struct ZoneRecord {
    entity: EntityRef,
    position: Vec3,
}

#[derive(Debug, Default)]
struct Zone {
    entries: Vec<ZoneRecord>,
}

/// Partitions live entities by zone and answers broadcast-scope queries.
/// Each zone is simulated and indexed independently, matching the
/// concurrency model's "zones are the unit of parallel simulation" rule.
#[derive(Debug, Default)]
pub struct ZoneIndex {
    zones: FxHashMap<ZoneId, Zone>,
}

impl ZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, zone: ZoneId, entity: EntityRef, position: Vec3) {
        self.remove(entity);
        let z = self.zones.entry(zone).or_default();
        z.entries.push(ZoneRecord { entity, position });
    }

    pub fn remove(&mut self, entity: EntityRef) {
        for zone in self.zones.values_mut() {
            zone.entries.retain(|r| r.entity != entity);
        }
    }

    pub fn entities_in_zone(&self, zone: ZoneId) -> impl Iterator<Item = EntityRef> + '_ {
        self.zones
            .get(&zone)
            .into_iter()
            .flat_map(|z| z.entries.iter().map(|r| r.entity))
    }

    /// Entities in `zone` within `radius` (horizontal, ignoring elevation)
    /// of `origin`, for scoping broadcasts like movement and chat.
    pub fn entities_within_radius(&self, zone: ZoneId, origin: Vec3, radius: f64) -> Vec<EntityRef> {
        self.zones
            .get(&zone)
            .map(|z| {
                z.entries
                    .iter()
                    .filter(|r| horizontal_distance(r.position, origin) <= radius)
                    .map(|r| r.entity)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn entities_within_aabb(&self, zone: ZoneId, aabb: Aabb) -> Vec<EntityRef> {
        self.zones
            .get(&zone)
            .map(|z| z.entries.iter().filter(|r| aabb.contains(r.position)).map(|r| r.entity).collect())
            .unwrap_or_default()
    }

    pub fn zone_population(&self, zone: ZoneId) -> usize {
        self.zones.get(&zone).map(|z| z.entries.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_moves_entity_between_zones() {
        let mut idx = ZoneIndex::new();
        let c = CharacterId::new();
        idx.upsert(ZoneId(1), EntityRef::Character(c), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(idx.zone_population(ZoneId(1)), 1);
        idx.upsert(ZoneId(2), EntityRef::Character(c), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(idx.zone_population(ZoneId(1)), 0);
        assert_eq!(idx.zone_population(ZoneId(2)), 1);
    }

    #[test]
    fn radius_query_ignores_elevation() {
        let mut idx = ZoneIndex::new();
        let n = NpcId::new();
        idx.upsert(ZoneId(1), EntityRef::Npc(n), Vec3::new(0.0, 500.0, 0.0));
        let found = idx.entities_within_radius(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), 5.0);
        assert_eq!(found, vec![EntityRef::Npc(n)]);
    }

    #[test]
    fn radius_query_excludes_far_entities() {
        let mut idx = ZoneIndex::new();
        let n = NpcId::new();
        idx.upsert(ZoneId(1), EntityRef::Npc(n), Vec3::new(1000.0, 0.0, 0.0));
        let found = idx.entities_within_radius(ZoneId(1), Vec3::new(0.0, 0.0, 0.0), 5.0);
        assert!(found.is_empty());
    }

    #[test]
    fn remove_clears_entity_from_all_zones() {
        let mut idx = ZoneIndex::new();
        let r = ResourceId::new();
        idx.upsert(ZoneId(1), EntityRef::Resource(r), Vec3::new(0.0, 0.0, 0.0));
        idx.remove(EntityRef::Resource(r));
        assert_eq!(idx.zone_population(ZoneId(1)), 0);
    }
}
