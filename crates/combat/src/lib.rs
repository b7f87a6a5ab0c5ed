//! Combat domain module.
//!
//! Heroes, enemies, the leveling rule and the in-memory effects of a kill,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod enemy;
pub mod hero;
pub mod kill;
pub mod leveling;

pub use enemy::{Enemy, EnemyType};
pub use hero::Hero;
pub use kill::{KillEnemy, KillOutcome, experience_for_kill, kill_enemy};
pub use leveling::{LevelProgress, XP_PER_LEVEL, gain_experience, level_threshold};
