use chrono::{DateTime, Utc};
use serde::Serialize;

use arena_combat::EnemyType;
use arena_core::{EnemyId, Entity, HeroId};
use arena_infra::store::{EnemyRecord, HeroRecord};

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroResponse {
    pub id: HeroId,
    pub name: String,
    pub level: u32,
    pub experience: i64,
    pub enemies_killed_amount: u64,
    pub enemies_killed: Vec<EnemyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HeroRecord> for HeroResponse {
    fn from(r: HeroRecord) -> Self {
        Self {
            id: r.hero.id_typed(),
            name: r.hero.name().to_string(),
            level: r.hero.level(),
            experience: r.hero.experience(),
            enemies_killed_amount: r.hero.enemies_killed_amount(),
            enemies_killed: r.hero.enemies_killed().to_vec(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyResponse {
    pub id: EnemyId,
    pub name: String,
    pub enemy_type: EnemyType,
    pub level: u32,
    pub experience: i64,
    pub alive: bool,
    pub killed_by: Option<HeroId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EnemyRecord> for EnemyResponse {
    fn from(r: EnemyRecord) -> Self {
        Self {
            id: r.enemy.id_typed(),
            name: r.enemy.name().to_string(),
            enemy_type: r.enemy.enemy_type(),
            level: r.enemy.level(),
            experience: r.enemy.experience(),
            alive: r.enemy.is_alive(),
            killed_by: r.enemy.killed_by(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
