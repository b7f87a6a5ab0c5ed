use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use arena_combat::{Enemy, Hero};
use arena_core::{EnemyId, Entity, HeroId};

use super::r#trait::{
    CombatStore, CommittedKill, EnemyRecord, HeroRecord, KillTransaction, StoreError,
};

#[derive(Debug, Clone)]
struct Row<E> {
    entity: E,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<E> Row<E> {
    fn fresh(entity: E) -> Self {
        let now = Utc::now();
        Self {
            entity,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    heroes: HashMap<HeroId, Row<Hero>>,
    enemies: HashMap<EnemyId, Row<Enemy>>,
}

impl Tables {
    fn kills_of(&self, hero_id: HeroId) -> Vec<&Row<Enemy>> {
        let mut kills: Vec<&Row<Enemy>> = self
            .enemies
            .values()
            .filter(|r| r.entity.killed_by() == Some(hero_id))
            .collect();
        kills.sort_by(|a, b| {
            a.entity
                .name()
                .cmp(b.entity.name())
                .then_with(|| a.entity.id_typed().cmp(&b.entity.id_typed()))
        });
        kills
    }

    fn hero_with_kills(&self, row: &Row<Hero>) -> Hero {
        let kills = self
            .kills_of(row.entity.id_typed())
            .into_iter()
            .map(|r| r.entity.id_typed())
            .collect();
        row.entity.clone().with_enemies_killed(kills)
    }
}

/// In-memory combat store.
///
/// Intended for tests/dev. Every commit runs under one write lock and never
/// awaits while holding it, so the guard check and both writes are atomic.
#[derive(Debug, Default)]
pub struct InMemoryCombatStore {
    tables: RwLock<Tables>,
}

impl InMemoryCombatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

fn enemy_record(row: &Row<Enemy>) -> EnemyRecord {
    EnemyRecord {
        enemy: row.entity.clone(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl CombatStore for InMemoryCombatStore {
    async fn read_hero(&self, id: HeroId) -> Result<Option<Hero>, StoreError> {
        let tables = self.read()?;
        Ok(tables.heroes.get(&id).map(|row| tables.hero_with_kills(row)))
    }

    async fn read_enemy(&self, id: EnemyId) -> Result<Option<Enemy>, StoreError> {
        let tables = self.read()?;
        Ok(tables.enemies.get(&id).map(|row| row.entity.clone()))
    }

    async fn commit_kill(&self, tx: KillTransaction) -> Result<CommittedKill, StoreError> {
        let hero_id = tx.validate()?;
        let enemy_id = tx.enemy.id_typed();

        let mut tables = self.write()?;

        // Check everything before touching anything.
        let held = tables
            .enemies
            .get(&enemy_id)
            .ok_or_else(|| StoreError::MissingRow(format!("enemy {enemy_id}")))?
            .entity
            .killed_by();
        if !tables.heroes.contains_key(&hero_id) {
            return Err(StoreError::MissingRow(format!("hero {hero_id}")));
        }
        if !tx.guard.matches(held.as_ref()) {
            return Err(StoreError::Conflict(format!(
                "enemy {enemy_id} already killed by {} (expected: {:?})",
                held.map(|h| h.to_string()).unwrap_or_default(),
                tx.guard
            )));
        }

        let now = Utc::now();

        let enemy = {
            let row = tables
                .enemies
                .get_mut(&enemy_id)
                .ok_or_else(|| StoreError::MissingRow(format!("enemy {enemy_id}")))?;
            row.entity = tx.enemy;
            row.updated_at = now;
            row.entity.clone()
        };

        let leveled_up = {
            let row = tables
                .heroes
                .get_mut(&hero_id)
                .ok_or_else(|| StoreError::MissingRow(format!("hero {hero_id}")))?;
            let progress = row.entity.record_kill(tx.experience_gained);
            row.updated_at = now;
            progress.leveled_up
        };

        let hero = tables
            .heroes
            .get(&hero_id)
            .map(|row| tables.hero_with_kills(row))
            .ok_or_else(|| StoreError::MissingRow(format!("hero {hero_id}")))?;

        Ok(CommittedKill {
            hero,
            enemy,
            leveled_up,
        })
    }

    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let id = hero.id_typed();
        if tables.heroes.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("hero {id}")));
        }
        // The kill list is derived from enemy markers, never stored.
        tables
            .heroes
            .insert(id, Row::fresh(hero.clone().with_enemies_killed(Vec::new())));
        Ok(())
    }

    async fn insert_enemy(&self, enemy: &Enemy) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let id = enemy.id_typed();
        if tables.enemies.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("enemy {id}")));
        }
        if let Some(killer) = enemy.killed_by() {
            if !tables.heroes.contains_key(&killer) {
                return Err(StoreError::MissingRow(format!("killer hero {killer}")));
            }
        }
        tables.enemies.insert(id, Row::fresh(enemy.clone()));
        Ok(())
    }

    async fn list_heroes(&self) -> Result<Vec<HeroRecord>, StoreError> {
        let tables = self.read()?;
        let mut records: Vec<HeroRecord> = tables
            .heroes
            .values()
            .map(|row| HeroRecord {
                hero: tables.hero_with_kills(row),
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect();
        records.sort_by(|a, b| {
            b.hero
                .level()
                .cmp(&a.hero.level())
                .then_with(|| {
                    b.hero
                        .enemies_killed_amount()
                        .cmp(&a.hero.enemies_killed_amount())
                })
                .then_with(|| a.hero.name().cmp(b.hero.name()))
                .then_with(|| a.hero.id_typed().cmp(&b.hero.id_typed()))
        });
        Ok(records)
    }

    async fn list_enemies(&self) -> Result<Vec<EnemyRecord>, StoreError> {
        let tables = self.read()?;
        let mut records: Vec<EnemyRecord> = tables.enemies.values().map(enemy_record).collect();
        records.sort_by(|a, b| {
            a.enemy
                .enemy_type()
                .cmp(&b.enemy.enemy_type())
                .then_with(|| b.enemy.level().cmp(&a.enemy.level()))
                .then_with(|| a.enemy.name().cmp(b.enemy.name()))
                .then_with(|| a.enemy.id_typed().cmp(&b.enemy.id_typed()))
        });
        Ok(records)
    }

    async fn enemies_killed_by(&self, hero_id: HeroId) -> Result<Vec<EnemyRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .kills_of(hero_id)
            .into_iter()
            .map(enemy_record)
            .collect())
    }
}
