//! The persistent data model: accounts, characters, and skills. These types
//! are plain data — the subsystems in [`skill`](crate::skill),
//! [`inventory`](crate::inventory), and [`exchange`](crate::exchange) own the
//! behavior that mutates them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thornmere_math::Vec3;

use crate::ids::{AccountId, CharacterId, ZoneId};
use crate::inventory::{Bank, Equipment, Inventory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub created_at_ms: u64,
    pub banned: bool,
}

/// Skill identifiers are strings rather than an enum so the catalog can add
/// skills without a code change; see [`Open Question`](crate) on the 23- vs
/// 28-skill registry, resolved in `DESIGN.md`.
pub type SkillId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub xp: u64,
    pub level: u32,
}

/// An untrained skill starts at level 1, not level 0 (spec §3). Hitpoints is
/// the one exception, seeded separately in [`Character::new`] at level 10.
impl Default for Skill {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// XP/level a fresh hitpoints skill starts at (spec §3).
pub const STARTING_HITPOINTS_XP: u64 = 1154;
pub const STARTING_HITPOINTS_LEVEL: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub account_id: AccountId,
    pub name: String,
    pub position: Vec3,
    pub zone: ZoneId,
    pub health: i64,
    pub max_health: i64,
    pub skills: HashMap<SkillId, Skill>,
    pub inventory: Inventory,
    pub bank: Bank,
    pub equipment: Equipment,
    pub gold: u64,
    pub combat_level: u32,
    pub total_level: u32,
    pub last_saved_tick: u64,
}

impl Character {
    pub fn new(id: CharacterId, account_id: AccountId, name: String, spawn: Vec3, zone: ZoneId) -> Self {
        let mut skills = HashMap::new();
        skills.insert(
            "hitpoints".to_owned(),
            Skill { xp: STARTING_HITPOINTS_XP, level: STARTING_HITPOINTS_LEVEL },
        );
        let combat_level = crate::skill::combat_level(&skills);
        let total_level = crate::skill::total_level(&skills);
        Self {
            id,
            account_id,
            name,
            position: spawn,
            zone,
            health: 100,
            max_health: 100,
            skills,
            inventory: Inventory::new(28),
            bank: Bank::new(),
            equipment: Equipment::default(),
            gold: 0,
            combat_level,
            total_level,
            last_saved_tick: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn skill(&self, id: &str) -> Skill {
        self.skills.get(id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Character {
        Character::new(
            CharacterId::new(),
            AccountId::new(),
            "Test".to_owned(),
            Vec3::new(0.0, 0.0, 0.0),
            ZoneId(1),
        )
    }

    #[test]
    fn new_character_starts_alive_with_empty_inventory() {
        let c = sample();
        assert!(c.is_alive());
        assert_eq!(c.inventory.capacity(), 28);
        assert_eq!(c.gold, 0);
    }

    #[test]
    fn unset_skill_starts_at_level_one_with_no_xp() {
        let c = sample();
        assert_eq!(c.skill("mining"), Skill { xp: 0, level: 1 });
    }

    #[test]
    fn hitpoints_starts_at_level_ten() {
        let c = sample();
        assert_eq!(c.skill("hitpoints"), Skill { xp: STARTING_HITPOINTS_XP, level: STARTING_HITPOINTS_LEVEL });
    }
}
