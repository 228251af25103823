//! Skill progression (spec §4.7): XP-to-level table, XP grants, and the
//! combat level formula derived from combat-relevant skills. The skill
//! action pipeline (cooldown check, success roll, XP grant) composes
//! [`validation::ActionBudget`](crate::validation::ActionBudget) with this
//! module's XP table rather than duplicating cooldown logic here.

use std::collections::HashMap;

use crate::character::{Character, Skill, SkillId};

/// Experience required to reach each level, index 0 unused so `xp_table()[n]`
/// is the XP needed for level `n`. Follows the standard exponential curve
/// `xp(n) = floor(sum_{i=1}^{n-1} floor(i + 300 * 2^(i/7))) / 4`, the same
/// curve used by the catalog's 99-level skill cap.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let mut total: f64 = 0.0;
    for i in 1..level {
        total += (i as f64 + 300.0 * 2f64.powf(i as f64 / 7.0)).floor();
    }
    (total / 4.0).floor() as u64
}

pub fn level_from_xp(xp: u64, max_level: u32) -> u32 {
    let mut level = 1;
    while level < max_level && xp >= xp_for_level(level + 1) {
        level += 1;
    }
    level
}

/// Hard ceiling on a single skill's stored XP (spec §3/§4.7).
pub const MAX_SKILL_XP: u64 = 200_000_000;

/// Grants `amount` XP to `skill_id` on `character`, capping the result at
/// [`MAX_SKILL_XP`] and recomputing its level. Returns the number of levels
/// gained (0 if the grant didn't cross a level boundary).
pub fn grant_xp(character: &mut Character, skill_id: &str, amount: u64, max_level: u32) -> u32 {
    let entry = character
        .skills
        .entry(skill_id.to_owned())
        .or_insert_with(Skill::default);
    let old_level = entry.level.max(1);
    entry.xp = entry.xp.saturating_add(amount).min(MAX_SKILL_XP);
    entry.level = level_from_xp(entry.xp, max_level);
    entry.level.saturating_sub(old_level)
}

/// Combat level from the classic weighted-average-of-combat-skills formula:
/// a base term from defence/hitpoints/prayer/summoning, plus the higher of a
/// melee-or-ranged term and a magic term, averaged in at a smaller weight.
pub fn combat_level(skills: &HashMap<SkillId, Skill>) -> u32 {
    let lvl = |id: &str| skills.get(id).map(|s| s.level.max(1)).unwrap_or(1) as f64;

    let defence = lvl("defence");
    let hitpoints = lvl("hitpoints");
    let prayer = lvl("prayer");
    let summoning = lvl("summoning");
    let attack = lvl("attack");
    let strength = lvl("strength");
    let ranged = lvl("ranged");
    let magic = lvl("magic");

    let base = 0.25 * (defence + hitpoints + (prayer / 2.0).floor() + (summoning / 2.0).floor());
    let melee = 0.325 * (attack + strength);
    let range = 0.325 * (ranged * 1.5).floor();
    let mage = 0.325 * (magic * 1.5).floor();

    let combat_style = melee.max(range).max(mage);
    (base + combat_style).floor() as u32
}

/// Sum of every trained skill's level (spec §3/§8: `total_level = Σ
/// skill_levels`).
pub fn total_level(skills: &HashMap<SkillId, Skill>) -> u32 {
    skills.values().map(|s| s.level).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_requires_zero_xp() {
        assert_eq!(xp_for_level(1), 0);
    }

    #[test]
    fn xp_curve_is_monotonically_increasing() {
        let mut last = 0;
        for level in 1..99 {
            let xp = xp_for_level(level);
            assert!(xp >= last);
            last = xp;
        }
    }

    #[test]
    fn level_from_xp_round_trips_level_boundaries() {
        for level in 1..50 {
            let xp = xp_for_level(level);
            assert_eq!(level_from_xp(xp, 99), level);
        }
    }

    #[test]
    fn grant_xp_reports_number_of_levels_gained() {
        let mut c = crate::character::Character::new(
            crate::ids::CharacterId::new(),
            crate::ids::AccountId::new(),
            "Test".to_owned(),
            thornmere_math::Vec3::new(0.0, 0.0, 0.0),
            crate::ids::ZoneId(1),
        );
        let gained = grant_xp(&mut c, "mining", xp_for_level(5), 99);
        assert_eq!(c.skill("mining").level, 5);
        assert_eq!(gained, 4);
    }

    #[test]
    fn fresh_character_has_a_low_combat_level() {
        let skills = HashMap::new();
        let level = combat_level(&skills);
        assert!(level >= 1 && level <= 3);
    }

    #[test]
    fn higher_attack_and_strength_raise_combat_level() {
        let mut skills = HashMap::new();
        skills.insert("attack".to_owned(), Skill { xp: 0, level: 60 });
        skills.insert("strength".to_owned(), Skill { xp: 0, level: 60 });
        skills.insert("defence".to_owned(), Skill { xp: 0, level: 60 });
        skills.insert("hitpoints".to_owned(), Skill { xp: 0, level: 60 });
        assert!(combat_level(&skills) > combat_level(&HashMap::new()));
    }

    #[test]
    fn total_level_sums_every_trained_skill() {
        let mut skills = HashMap::new();
        skills.insert("attack".to_owned(), Skill { xp: 0, level: 10 });
        skills.insert("mining".to_owned(), Skill { xp: 0, level: 5 });
        assert_eq!(total_level(&skills), 15);
    }
}
