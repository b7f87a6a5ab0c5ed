//! Kill transition coordinator (application-level orchestration).
//!
//! Turns a `KillEnemy` command into at most one committed change of two rows.
//!
//! ## Kill Flow
//!
//! ```text
//! KillEnemy
//!   ↓
//! 1. Read hero and enemy (concurrently)
//!   ↓
//! 2. Pre-checks: hero exists, enemy exists, enemy alive, type matches
//!   ↓
//! 3. Apply the kill to the loaded snapshots (pure domain logic)
//!   ↓
//! 4. Commit both rows, guarded on the enemy marker still being empty
//! ```
//!
//! The pre-checks only save a write when the answer is already known. The
//! guarded commit is what decides a race: of N concurrent attempts on one alive
//! enemy exactly one commits, and the rest fail the guard and report
//! `EnemyAlreadyKilled`.
//!
//! Nothing is retried. This module contains no IO itself; it composes the
//! `CombatStore` trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use arena_combat::{EnemyType, KillEnemy, kill_enemy};
use arena_core::{DomainError, EnemyId, ExpectedSlot, HeroId};

use crate::store::{CombatStore, KillTransaction, StoreError};

/// Why a kill attempt did not commit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KillError {
    #[error("hero {0} not found")]
    HeroNotFound(HeroId),

    #[error("enemy {0} not found")]
    EnemyNotFound(EnemyId),

    /// `killed_by` is `None` when the attempt lost a race at commit time and
    /// the winner was not re-read.
    #[error("enemy {enemy_id} has already been killed")]
    EnemyAlreadyKilled {
        enemy_id: EnemyId,
        killed_by: Option<HeroId>,
    },

    #[error("enemy {enemy_id} is a {actual}, not a {expected}")]
    EnemyTypeMismatch {
        enemy_id: EnemyId,
        expected: EnemyType,
        actual: EnemyType,
    },

    #[error("domain error: {0}")]
    Domain(DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

/// Successful kill acknowledgement. The action id is the killed enemy's id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillReceipt {
    pub action_id: EnemyId,
}

/// Executes kill attempts against a `CombatStore`.
///
/// Holds no lock of its own; attempts on different enemies never contend.
#[derive(Debug)]
pub struct KillCoordinator<S> {
    store: S,
}

impl<S> KillCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> KillCoordinator<S>
where
    S: CombatStore,
{
    /// Attempt `command`. On success both rows changed; on any error neither did.
    #[instrument(
        skip(self, command),
        fields(
            hero_id = %command.hero_id,
            enemy_id = %command.enemy_id,
            enemy_type = %command.enemy_type
        )
    )]
    pub async fn attempt_kill(&self, command: KillEnemy) -> Result<KillReceipt, KillError> {
        let KillEnemy {
            hero_id,
            enemy_id,
            enemy_type,
        } = command;

        // 1) Read both sides at once.
        let (hero, enemy) = tokio::join!(
            self.store.read_hero(hero_id),
            self.store.read_enemy(enemy_id)
        );

        // 2) Pre-checks, in a fixed order.
        let mut hero = hero
            .map_err(KillError::Store)?
            .ok_or(KillError::HeroNotFound(hero_id))?;
        let mut enemy = enemy
            .map_err(KillError::Store)?
            .ok_or(KillError::EnemyNotFound(enemy_id))?;

        if let Some(killer) = enemy.killed_by() {
            info!(killed_by = %killer, "enemy already killed");
            return Err(KillError::EnemyAlreadyKilled {
                enemy_id,
                killed_by: Some(killer),
            });
        }
        if enemy.enemy_type() != enemy_type {
            return Err(KillError::EnemyTypeMismatch {
                enemy_id,
                expected: enemy_type,
                actual: enemy.enemy_type(),
            });
        }

        // 3) Decide on the snapshots.
        let outcome = kill_enemy(&mut hero, &mut enemy).map_err(KillError::Domain)?;

        // 4) Guarded commit.
        let committed = self
            .store
            .commit_kill(KillTransaction {
                hero,
                enemy,
                experience_gained: outcome.experience_gained,
                guard: ExpectedSlot::Empty,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => {
                    info!(reason = %msg, "lost kill race at commit");
                    KillError::EnemyAlreadyKilled {
                        enemy_id,
                        killed_by: None,
                    }
                }
                other => {
                    tracing::error!(error = %other, "kill commit failed");
                    KillError::Store(other)
                }
            })?;

        info!(
            experience_gained = outcome.experience_gained,
            leveled_up = committed.leveled_up,
            hero_level = committed.hero.level(),
            hero_experience = committed.hero.experience(),
            hero_kills = committed.hero.enemies_killed_amount(),
            "enemy killed"
        );

        Ok(KillReceipt {
            action_id: enemy_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_combat::{Enemy, Hero};

    use crate::store::InMemoryCombatStore;

    async fn arena() -> (KillCoordinator<InMemoryCombatStore>, Hero, Enemy) {
        let store = InMemoryCombatStore::new();
        let hero = Hero::new(HeroId::new(), "Kestrel").unwrap();
        let enemy = Enemy::restore(EnemyId::new(), "Snagtooth", EnemyType::Goblin, 3, 0, None).unwrap();
        store.insert_hero(&hero).await.unwrap();
        store.insert_enemy(&enemy).await.unwrap();
        (KillCoordinator::new(store), hero, enemy)
    }

    fn command(hero: &Hero, enemy: &Enemy, enemy_type: EnemyType) -> KillEnemy {
        KillEnemy {
            hero_id: hero.id_typed(),
            enemy_id: enemy.id_typed(),
            enemy_type,
        }
    }

    #[tokio::test]
    async fn successful_kill_returns_enemy_id_and_updates_both_rows() {
        let (coordinator, hero, enemy) = arena().await;

        let receipt = coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Goblin))
            .await
            .unwrap();
        assert_eq!(receipt.action_id, enemy.id_typed());

        let store = coordinator.store();
        let hero_after = store.read_hero(hero.id_typed()).await.unwrap().unwrap();
        let enemy_after = store.read_enemy(enemy.id_typed()).await.unwrap().unwrap();
        assert_eq!(hero_after.experience(), 30);
        assert_eq!(hero_after.enemies_killed_amount(), 1);
        assert_eq!(hero_after.enemies_killed(), &[enemy.id_typed()]);
        assert_eq!(enemy_after.killed_by(), Some(hero.id_typed()));
    }

    #[tokio::test]
    async fn unknown_hero_is_reported_before_unknown_enemy() {
        let (coordinator, _, _) = arena().await;
        let cmd = KillEnemy {
            hero_id: HeroId::new(),
            enemy_id: EnemyId::new(),
            enemy_type: EnemyType::Goblin,
        };

        let err = coordinator.attempt_kill(cmd.clone()).await.unwrap_err();
        assert_eq!(err, KillError::HeroNotFound(cmd.hero_id));
    }

    #[tokio::test]
    async fn unknown_enemy_is_not_found() {
        let (coordinator, hero, _) = arena().await;
        let missing = EnemyId::new();
        let cmd = KillEnemy {
            hero_id: hero.id_typed(),
            enemy_id: missing,
            enemy_type: EnemyType::Orc,
        };

        let err = coordinator.attempt_kill(cmd).await.unwrap_err();
        assert_eq!(err, KillError::EnemyNotFound(missing));
    }

    #[tokio::test]
    async fn wrong_type_is_a_mismatch_and_changes_nothing() {
        let (coordinator, hero, enemy) = arena().await;

        let err = coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Dragon))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            KillError::EnemyTypeMismatch {
                enemy_id: enemy.id_typed(),
                expected: EnemyType::Dragon,
                actual: EnemyType::Goblin,
            }
        );
        let store = coordinator.store();
        assert_eq!(store.read_hero(hero.id_typed()).await.unwrap().unwrap(), hero);
        assert_eq!(store.read_enemy(enemy.id_typed()).await.unwrap().unwrap(), enemy);
    }

    #[tokio::test]
    async fn repeated_kill_by_same_hero_is_already_killed() {
        let (coordinator, hero, enemy) = arena().await;
        coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Goblin))
            .await
            .unwrap();

        let err = coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Goblin))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            KillError::EnemyAlreadyKilled {
                enemy_id: enemy.id_typed(),
                killed_by: Some(hero.id_typed()),
            }
        );
        let hero_after = coordinator.store().read_hero(hero.id_typed()).await.unwrap().unwrap();
        assert_eq!(hero_after.enemies_killed_amount(), 1);
    }

    #[tokio::test]
    async fn dead_enemy_wins_over_type_mismatch() {
        let (coordinator, hero, enemy) = arena().await;
        coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Goblin))
            .await
            .unwrap();

        let err = coordinator
            .attempt_kill(command(&hero, &enemy, EnemyType::Troll))
            .await
            .unwrap_err();
        assert!(matches!(err, KillError::EnemyAlreadyKilled { .. }));
    }

    #[test]
    fn receipt_serializes_as_action_id() {
        let id = EnemyId::new();
        let json = serde_json::to_value(KillReceipt { action_id: id }).unwrap();
        assert_eq!(json, serde_json::json!({ "actionId": id.to_string() }));
    }
}
