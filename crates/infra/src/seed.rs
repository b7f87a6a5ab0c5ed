//! Demo data for local runs and tests.
//!
//! Attributes are derived from the row index only, so two runs with the same
//! plan produce the same names, types and levels (ids are fresh each time).

use tracing::{info, instrument};

use arena_combat::{Enemy, EnemyType, Hero};
use arena_core::{DomainError, EnemyId, HeroId};

use crate::store::{CombatStore, StoreError};

const HERO_TITLES: [&str; 6] = ["Sir", "Dame", "Ranger", "Warden", "Sellsword", "Oracle"];
const HERO_NAMES: [&str; 7] = ["Aldric", "Brenna", "Corvin", "Dalia", "Emeric", "Fenna", "Garrick"];

type NameParts = (&'static [&'static str], &'static [&'static str]);

const DRAGON_PARTS: NameParts = (&["Ashen", "Frost", "Gilded", "Storm"], &["Wyrm", "Drake", "Serpent"]);
const ORC_PARTS: NameParts = (&["Blood", "Iron", "Skull", "Bone"], &["Crusher", "Raider", "Warlord"]);
const GOBLIN_PARTS: NameParts = (&["Sneak", "Rust", "Mud", "Rot"], &["Stabber", "Thief", "Shaman"]);
const TROLL_PARTS: NameParts = (&["Cave", "Bridge", "Moss", "Stone"], &["Brute", "Hulk", "Lurker"]);

fn enemy_parts(enemy_type: EnemyType) -> NameParts {
    match enemy_type {
        EnemyType::Dragon => DRAGON_PARTS,
        EnemyType::Orc => ORC_PARTS,
        EnemyType::Goblin => GOBLIN_PARTS,
        EnemyType::Troll => TROLL_PARTS,
    }
}

/// How much demo data to insert.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub heroes: usize,
    pub enemies: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            heroes: 10,
            enemies: 50,
        }
    }
}

/// Ids of the inserted rows, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub heroes: Vec<HeroId>,
    pub enemies: Vec<EnemyId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seed row rejected by the domain: {0}")]
    Domain(#[from] DomainError),
    #[error("seed insert failed: {0}")]
    Store(#[from] StoreError),
}

/// Number of enemies of each type for a total of `total`: an even split, the
/// first `total % 4` types taking one extra.
pub fn enemies_per_type(total: usize) -> [(EnemyType, usize); 4] {
    let base = total / EnemyType::ALL.len();
    let extra = total % EnemyType::ALL.len();
    let mut out = [(EnemyType::Dragon, 0); 4];
    for (i, t) in EnemyType::ALL.into_iter().enumerate() {
        out[i] = (t, base + usize::from(i < extra));
    }
    out
}

/// Hero number `index` (level 1..=10, experience 0..=99, no kills).
pub fn demo_hero(index: usize) -> Result<Hero, DomainError> {
    let name = format!(
        "{} {}",
        HERO_TITLES[index % HERO_TITLES.len()],
        HERO_NAMES[index % HERO_NAMES.len()]
    );
    let level = 1 + (index * 7 % 10) as u32;
    let experience = (index * 37 % 100) as i64;
    Hero::restore(HeroId::new(), name, level, experience, 0)
}

/// Enemy `ordinal` of `enemy_type` (alive, level 1..=10).
pub fn demo_enemy(enemy_type: EnemyType, ordinal: usize) -> Result<Enemy, DomainError> {
    let (prefixes, suffixes) = enemy_parts(enemy_type);
    let name = format!(
        "{} {} {}",
        prefixes[ordinal % prefixes.len()],
        suffixes[ordinal % suffixes.len()],
        ordinal + 1
    );
    let level = 1 + (ordinal * 3 % 10) as u32;
    Enemy::restore(EnemyId::new(), name, enemy_type, level, 0, None)
}

/// Insert the plan's heroes and enemies into `store`.
#[instrument(skip(store))]
pub async fn seed_demo_data<S>(store: &S, plan: SeedPlan) -> Result<SeedSummary, SeedError>
where
    S: CombatStore + ?Sized,
{
    let mut summary = SeedSummary::default();

    for i in 0..plan.heroes {
        let hero = demo_hero(i)?;
        store.insert_hero(&hero).await?;
        summary.heroes.push(hero.id_typed());
    }

    for (enemy_type, count) in enemies_per_type(plan.enemies) {
        for ordinal in 0..count {
            let enemy = demo_enemy(enemy_type, ordinal)?;
            store.insert_enemy(&enemy).await?;
            summary.enemies.push(enemy.id_typed());
        }
    }

    info!(
        heroes = summary.heroes.len(),
        enemies = summary.enemies.len(),
        "demo data seeded"
    );
    Ok(summary)
}
