//! The kill action and its pure, in-memory effects.

use serde::{Deserialize, Serialize};

use arena_core::{DomainResult, EnemyId, HeroId};

use crate::enemy::{Enemy, EnemyType};
use crate::hero::Hero;

/// Experience granted per enemy level.
const XP_PER_ENEMY_LEVEL: i64 = 10;

/// Command: a hero asserts it is killing `enemy_id`, which it believes is an
/// `enemy_type`. Ephemeral; never persisted as its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEnemy {
    pub hero_id: HeroId,
    pub enemy_id: EnemyId,
    pub enemy_type: EnemyType,
}

/// What a kill did to the hero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillOutcome {
    pub leveled_up: bool,
    pub experience_gained: i64,
}

/// Experience for killing an enemy of `enemy_level` (level 0 yields 0).
pub fn experience_for_kill(enemy_level: u32) -> i64 {
    i64::from(enemy_level) * XP_PER_ENEMY_LEVEL
}

/// Apply a kill to in-memory copies of both aggregates.
///
/// Callers are expected to have checked that the enemy is alive and of the
/// asserted type; the marker is still refused if already set.
pub fn kill_enemy(hero: &mut Hero, enemy: &mut Enemy) -> DomainResult<KillOutcome> {
    hero.kill_enemy(enemy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn level_three_enemy_grants_thirty() {
        assert_eq!(experience_for_kill(3), 30);
        assert_eq!(experience_for_kill(0), 0);
    }

    #[test]
    fn kill_command_uses_wire_names() {
        let cmd = KillEnemy {
            hero_id: HeroId::new(),
            enemy_id: EnemyId::new(),
            enemy_type: EnemyType::Troll,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["enemy_type"], "TROLL");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for every enemy level L, one kill grants exactly L * 10
        /// experience and exactly one kill count.
        #[test]
        fn one_kill_grants_ten_per_enemy_level(
            enemy_level in 0u32..10_000,
            hero_level in 1u32..30,
            start in 0i64..100,
        ) {
            let mut hero = Hero::restore(HeroId::new(), "Prop Hero", hero_level, start, 0).unwrap();
            let mut enemy = Enemy::restore(
                EnemyId::new(), "Prop Enemy", EnemyType::Dragon, enemy_level, 0, None,
            ).unwrap();

            let outcome = kill_enemy(&mut hero, &mut enemy).unwrap();

            prop_assert_eq!(outcome.experience_gained, i64::from(enemy_level) * 10);
            prop_assert_eq!(hero.enemies_killed_amount(), 1);
            prop_assert_eq!(enemy.killed_by(), Some(hero.id_typed()));
            prop_assert_eq!(outcome.leveled_up, hero.level() > hero_level);
        }
    }
}
