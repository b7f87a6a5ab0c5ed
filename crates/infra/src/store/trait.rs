use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use arena_combat::{Enemy, Hero};
use arena_core::{EnemyId, ExpectedSlot, HeroId};

/// Combat store operation error.
///
/// These are **infrastructure errors** (storage, concurrency guards) as opposed
/// to domain errors (validation, invariants).
///
/// ## Error Categories
///
/// - **Conflict**: the write-once guard on the enemy marker rejected the commit
/// - **MissingRow**: a row the commit needs does not exist
/// - **Duplicate**: an insert collided with an existing id
/// - **InvalidCommit**: the transaction is internally inconsistent
/// - **Corrupt**: a stored row cannot be turned back into a domain value
/// - **Backend**: anything else (connection, pool, poisoned lock, ...)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("missing row: {0}")]
    MissingRow(String),

    #[error("duplicate row: {0}")]
    Duplicate(String),

    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Both halves of a kill, committed as one atomic unit.
///
/// `hero` and `enemy` are the snapshots computed by the domain model.
/// The enemy snapshot is written subject to `guard`, re-checked against the
/// marker as it is at commit time. The hero row is **not** overwritten with the
/// snapshot: the store applies one kill plus `experience_gained` to the hero
/// row as it is at commit time, so concurrent kills by the same hero compose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillTransaction {
    pub hero: Hero,
    pub enemy: Enemy,
    pub experience_gained: i64,
    pub guard: ExpectedSlot,
}

impl KillTransaction {
    /// The enemy snapshot must be killed by the hero it is committed with.
    pub fn validate(&self) -> Result<HeroId, StoreError> {
        let hero_id = self.hero.id_typed();
        match self.enemy.killed_by() {
            Some(killer) if killer == hero_id => Ok(hero_id),
            Some(killer) => Err(StoreError::InvalidCommit(format!(
                "enemy {} is marked as killed by {killer}, not by hero {hero_id}",
                self.enemy.id_typed()
            ))),
            None => Err(StoreError::InvalidCommit(format!(
                "enemy {} carries no killed-by marker",
                self.enemy.id_typed()
            ))),
        }
    }
}

/// Rows as they stand after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedKill {
    pub hero: Hero,
    pub enemy: Enemy,
    pub leveled_up: bool,
}

/// A hero row plus bookkeeping timestamps (read side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroRecord {
    pub hero: Hero,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An enemy row plus bookkeeping timestamps (read side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyRecord {
    pub enemy: Enemy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transactional storage for heroes and enemies.
///
/// Rows are keyed by id (arena style): heroes never hold references to enemy
/// rows, and a hero's kill list is recomputed from the enemies' markers.
///
/// ## Commit Semantics
///
/// `commit_kill()` must:
/// - reject the commit with `StoreError::Conflict` if the enemy marker does not
///   satisfy the transaction's guard **at commit time**
/// - write the enemy marker and the hero progress atomically (both or neither)
/// - apply the hero progress to the row as it is at commit time, not to the
///   snapshot the caller read
///
/// Implementations must leave no partial state behind when the caller's future
/// is dropped mid-commit.
#[async_trait]
pub trait CombatStore: Send + Sync {
    /// Point lookup. The returned hero carries its kill projection.
    async fn read_hero(&self, id: HeroId) -> Result<Option<Hero>, StoreError>;

    /// Point lookup.
    async fn read_enemy(&self, id: EnemyId) -> Result<Option<Enemy>, StoreError>;

    /// Commit both halves of a kill atomically, guarded on the enemy marker.
    async fn commit_kill(&self, tx: KillTransaction) -> Result<CommittedKill, StoreError>;

    /// Create a hero row (seeding/admin).
    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError>;

    /// Create an enemy row (seeding/admin).
    async fn insert_enemy(&self, enemy: &Enemy) -> Result<(), StoreError>;

    /// All heroes: level desc, kill count desc, name asc.
    async fn list_heroes(&self) -> Result<Vec<HeroRecord>, StoreError>;

    /// All enemies: type (declaration order), level desc, name asc.
    async fn list_enemies(&self) -> Result<Vec<EnemyRecord>, StoreError>;

    /// Enemies whose marker names `hero_id`, by name.
    async fn enemies_killed_by(&self, hero_id: HeroId) -> Result<Vec<EnemyRecord>, StoreError>;
}

#[async_trait]
impl<S> CombatStore for Arc<S>
where
    S: CombatStore + ?Sized,
{
    async fn read_hero(&self, id: HeroId) -> Result<Option<Hero>, StoreError> {
        (**self).read_hero(id).await
    }

    async fn read_enemy(&self, id: EnemyId) -> Result<Option<Enemy>, StoreError> {
        (**self).read_enemy(id).await
    }

    async fn commit_kill(&self, tx: KillTransaction) -> Result<CommittedKill, StoreError> {
        (**self).commit_kill(tx).await
    }

    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        (**self).insert_hero(hero).await
    }

    async fn insert_enemy(&self, enemy: &Enemy) -> Result<(), StoreError> {
        (**self).insert_enemy(enemy).await
    }

    async fn list_heroes(&self) -> Result<Vec<HeroRecord>, StoreError> {
        (**self).list_heroes().await
    }

    async fn list_enemies(&self) -> Result<Vec<EnemyRecord>, StoreError> {
        (**self).list_enemies().await
    }

    async fn enemies_killed_by(&self, hero_id: HeroId) -> Result<Vec<EnemyRecord>, StoreError> {
        (**self).enemies_killed_by(hero_id).await
    }
}
