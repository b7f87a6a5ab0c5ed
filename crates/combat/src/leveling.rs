//! Experience and leveling rule shared by heroes and enemies.

use serde::{Deserialize, Serialize};

/// Experience needed per level: leaving level `n` costs `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: i64 = 100;

/// Experience that must be banked to leave `level`.
pub fn level_threshold(level: u32) -> i64 {
    i64::from(level) * XP_PER_LEVEL
}

/// Level/experience pair after applying a gain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub experience: i64,
    /// True when at least one threshold was crossed.
    pub leveled_up: bool,
}

/// Add `amount` to `experience`, then consume thresholds while
/// `experience >= level * 100`, incrementing the level each time.
///
/// A single gain may cross several thresholds. Negative experience is kept as
/// is: the hero simply needs more gain before the check fires.
pub fn gain_experience(level: u32, experience: i64, amount: i64) -> LevelProgress {
    let start = level;
    let mut level = level;
    let mut experience = experience.saturating_add(amount);

    while experience >= level_threshold(level) {
        let Some(next) = level.checked_add(1) else {
            break;
        };
        experience -= level_threshold(level);
        level = next;
    }

    LevelProgress {
        level,
        experience,
        leveled_up: level > start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_threshold_levels_once_and_leaves_zero() {
        let p = gain_experience(1, 0, 100);
        assert_eq!(p, LevelProgress { level: 2, experience: 0, leveled_up: true });
    }

    #[test]
    fn large_gain_crosses_multiple_thresholds() {
        // 100 for 1 -> 2, 200 for 2 -> 3, 50 left over.
        let p = gain_experience(1, 0, 350);
        assert_eq!(p, LevelProgress { level: 3, experience: 50, leveled_up: true });
    }

    #[test]
    fn just_below_threshold_does_not_level() {
        let p = gain_experience(1, 0, 99);
        assert_eq!(p, LevelProgress { level: 1, experience: 99, leveled_up: false });

        let p = gain_experience(p.level, p.experience, 1);
        assert_eq!(p, LevelProgress { level: 2, experience: 0, leveled_up: true });
    }

    #[test]
    fn higher_levels_need_proportionally_more() {
        let p = gain_experience(5, 0, 499);
        assert_eq!(p.level, 5);
        let p = gain_experience(5, 0, 500);
        assert_eq!((p.level, p.experience), (6, 0));
    }

    #[test]
    fn negative_experience_is_preserved_not_clamped() {
        let p = gain_experience(1, -50, 30);
        assert_eq!(p, LevelProgress { level: 1, experience: -20, leveled_up: false });

        // Needs 120 to get from -20 over the 100 threshold.
        let p = gain_experience(1, -20, 119);
        assert_eq!((p.level, p.experience), (1, 99));
        let p = gain_experience(1, -20, 120);
        assert_eq!((p.level, p.experience), (2, 0));
    }

    #[test]
    fn level_stops_at_u32_max_without_consuming() {
        let p = gain_experience(u32::MAX, 0, i64::MAX);
        assert_eq!(p, LevelProgress { level: u32::MAX, experience: i64::MAX, leveled_up: false });

        let p = gain_experience(u32::MAX - 1, 0, i64::MAX);
        assert_eq!(p.level, u32::MAX);
        assert!(p.leveled_up);
    }

    #[test]
    fn zero_gain_is_a_no_op() {
        let p = gain_experience(3, 42, 0);
        assert_eq!(p, LevelProgress { level: 3, experience: 42, leveled_up: false });
    }

    #[test]
    fn level_zero_promotes_immediately() {
        // Threshold at level 0 is 0, so any non-negative balance moves to level 1.
        let p = gain_experience(0, 0, 0);
        assert_eq!((p.level, p.experience), (1, 0));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after a non-negative gain from a non-negative balance,
        /// the remaining experience sits strictly below the next threshold.
        #[test]
        fn remainder_is_below_current_threshold(
            level in 1u32..50,
            experience in 0i64..5_000,
            amount in 0i64..1_000_000,
        ) {
            let p = gain_experience(level, experience, amount);
            prop_assert!(p.experience >= 0);
            prop_assert!(p.experience < level_threshold(p.level));
        }

        /// Property: level never decreases and total experience is conserved.
        #[test]
        fn level_is_monotonic_and_experience_is_conserved(
            level in 1u32..50,
            experience in -10_000i64..10_000,
            amount in -10_000i64..1_000_000,
        ) {
            let p = gain_experience(level, experience, amount);
            prop_assert!(p.level >= level);
            prop_assert_eq!(p.leveled_up, p.level > level);

            let consumed: i64 = (level..p.level).map(level_threshold).sum();
            prop_assert_eq!(p.experience + consumed, experience + amount);
        }
    }
}
