//! Postgres-backed combat store implementation.
//!
//! The kill guard is enforced by the database itself: the enemy marker is set
//! with a conditional `UPDATE ... WHERE killed_by_hero_id IS NULL`, so of any
//! number of concurrent transactions racing for one enemy exactly one matches
//! a row. Losers see zero rows and get `StoreError::Conflict`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Duplicate` | Insert with an existing id |
//! | Database (foreign key violation) | `23503` | `MissingRow` | Marker names a hero that does not exist |
//! | Database (check constraint violation) | `23514` | `Corrupt` | Row outside the domain (e.g. level 0 hero) |
//! | Database (other) | Any other | `Backend` | Includes deadlock / serialization failures |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! `Conflict` is never produced by error mapping; only the guard raises it.
//!
//! ## Cancellation
//!
//! Every write runs inside a `sqlx::Transaction`. Dropping the future before
//! `commit()` drops the transaction, which rolls back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use arena_combat::{Enemy, EnemyType, Hero};
use arena_core::{EnemyId, Entity, ExpectedSlot, HeroId};

use super::r#trait::{
    CombatStore, CommittedKill, EnemyRecord, HeroRecord, KillTransaction, StoreError,
};

/// Schema, applied statement by statement by [`PostgresCombatStore::migrate`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS heroes (
        id                    UUID PRIMARY KEY,
        name                  TEXT NOT NULL,
        level                 BIGINT NOT NULL CHECK (level >= 1),
        experience            BIGINT NOT NULL DEFAULT 0,
        enemies_killed_amount BIGINT NOT NULL DEFAULT 0 CHECK (enemies_killed_amount >= 0),
        created_at            TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at            TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS enemies (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        enemy_type        TEXT NOT NULL CHECK (enemy_type IN ('DRAGON', 'ORC', 'GOBLIN', 'TROLL')),
        level             BIGINT NOT NULL CHECK (level >= 0),
        experience        BIGINT NOT NULL DEFAULT 0,
        killed_by_hero_id UUID NULL REFERENCES heroes (id),
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS enemies_killed_by_hero_id_idx
        ON enemies (killed_by_hero_id)
        WHERE killed_by_hero_id IS NOT NULL
    "#,
];

const HERO_COLUMNS: &str =
    "id, name, level, experience, enemies_killed_amount, created_at, updated_at";

const ENEMY_COLUMNS: &str =
    "id, name, enemy_type, level, experience, killed_by_hero_id, created_at, updated_at";

/// Declaration order of `EnemyType`, for listings.
const ENEMY_TYPE_ORDER: &str = "CASE enemy_type \
     WHEN 'DRAGON' THEN 0 WHEN 'ORC' THEN 1 WHEN 'GOBLIN' THEN 2 WHEN 'TROLL' THEN 3 ELSE 4 END";

/// Postgres-backed combat store.
///
/// ## Commit Flow
///
/// `commit_kill()` runs one transaction (READ COMMITTED):
/// 1. Set the enemy marker, guarded on the expected slot (row lock on the enemy)
/// 2. Lock the hero row with `SELECT ... FOR NO KEY UPDATE`
/// 3. Apply one kill plus the gained experience to the locked row
/// 4. Write the hero row and commit
///
/// Locks are always taken enemy first, then hero.
#[derive(Debug, Clone)]
pub struct PostgresCombatStore {
    pool: Arc<PgPool>,
}

impl PostgresCombatStore {
    /// Create a new PostgresCombatStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn kill_ids_in(
        tx: &mut Transaction<'_, Postgres>,
        hero_id: HeroId,
    ) -> Result<Vec<EnemyId>, StoreError> {
        let rows = sqlx::query(
            "SELECT id FROM enemies WHERE killed_by_hero_id = $1 ORDER BY name ASC, id ASC",
        )
        .bind(hero_id.as_uuid())
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("kill_ids", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<uuid::Uuid, _>("id")
                    .map(EnemyId::from_uuid)
                    .map_err(|e| StoreError::Corrupt(format!("enemy id: {e}")))
            })
            .collect()
    }

    async fn set_marker(
        tx: &mut Transaction<'_, Postgres>,
        enemy: &Enemy,
        hero_id: HeroId,
        guard: ExpectedSlot,
    ) -> Result<Option<EnemyRow>, StoreError> {
        let sql = match guard {
            ExpectedSlot::Empty => format!(
                "UPDATE enemies SET killed_by_hero_id = $1, updated_at = NOW() \
                 WHERE id = $2 AND killed_by_hero_id IS NULL RETURNING {ENEMY_COLUMNS}"
            ),
            ExpectedSlot::Any => format!(
                "UPDATE enemies SET killed_by_hero_id = $1, updated_at = NOW() \
                 WHERE id = $2 RETURNING {ENEMY_COLUMNS}"
            ),
        };

        let row = sqlx::query(&sql)
            .bind(hero_id.as_uuid())
            .bind(enemy.id_typed().as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("commit_kill", e))?;

        row.map(|r| EnemyRow::from_row(&r).map_err(corrupt("enemy")))
            .transpose()
    }
}

#[async_trait]
impl CombatStore for PostgresCombatStore {
    #[instrument(skip(self), fields(hero_id = %id), err)]
    async fn read_hero(&self, id: HeroId) -> Result<Option<Hero>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("read_hero", e))?;

        let row = sqlx::query(&format!("SELECT {HERO_COLUMNS} FROM heroes WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("read_hero", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let record = HeroRecord::try_from(HeroRow::from_row(&row).map_err(corrupt("hero"))?)?;
        let kills = Self::kill_ids_in(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("read_hero", e))?;

        Ok(Some(record.hero.with_enemies_killed(kills)))
    }

    #[instrument(skip(self), fields(enemy_id = %id), err)]
    async fn read_enemy(&self, id: EnemyId) -> Result<Option<Enemy>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ENEMY_COLUMNS} FROM enemies WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_enemy", e))?;

        row.map(|r| {
            let row = EnemyRow::from_row(&r).map_err(corrupt("enemy"))?;
            EnemyRecord::try_from(row).map(|rec| rec.enemy)
        })
        .transpose()
    }

    #[instrument(
        skip(self, kill),
        fields(
            hero_id = %kill.hero.id_typed(),
            enemy_id = %kill.enemy.id_typed(),
            guard = ?kill.guard
        ),
        err
    )]
    async fn commit_kill(&self, kill: KillTransaction) -> Result<CommittedKill, StoreError> {
        let hero_id = kill.validate()?;
        let enemy_id = kill.enemy.id_typed();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("commit_kill", e))?;

        // 1) Guarded marker write.
        let Some(enemy_row) = Self::set_marker(&mut tx, &kill.enemy, hero_id, kill.guard).await?
        else {
            let held = sqlx::query("SELECT killed_by_hero_id FROM enemies WHERE id = $1")
                .bind(enemy_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("commit_kill", e))?;
            return Err(match held {
                None => StoreError::MissingRow(format!("enemy {enemy_id}")),
                Some(row) => {
                    let held: Option<uuid::Uuid> = row
                        .try_get("killed_by_hero_id")
                        .map_err(corrupt("enemy"))?;
                    StoreError::Conflict(format!(
                        "enemy {enemy_id} already killed by {} (expected: {:?})",
                        held.map(|h| h.to_string()).unwrap_or_default(),
                        kill.guard
                    ))
                }
            });
        };
        let enemy = EnemyRecord::try_from(enemy_row)?.enemy;

        // 2) Lock the hero row as it is now. Must stay compatible with the
        // KEY SHARE lock the marker's FK check holds on the same row.
        let hero_row = sqlx::query(&format!(
            "SELECT {HERO_COLUMNS} FROM heroes WHERE id = $1 FOR NO KEY UPDATE"
        ))
        .bind(hero_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit_kill", e))?
        .ok_or_else(|| StoreError::MissingRow(format!("hero {hero_id}")))?;
        let mut hero =
            HeroRecord::try_from(HeroRow::from_row(&hero_row).map_err(corrupt("hero"))?)?.hero;

        // 3) Apply the delta.
        let progress = hero.record_kill(kill.experience_gained);

        // 4) Write back.
        sqlx::query(
            r#"
            UPDATE heroes
            SET level = $1, experience = $2, enemies_killed_amount = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(i64::from(hero.level()))
        .bind(hero.experience())
        .bind(to_i64(hero.enemies_killed_amount())?)
        .bind(hero_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit_kill", e))?;

        let kills = Self::kill_ids_in(&mut tx, hero_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_kill", e))?;

        Ok(CommittedKill {
            hero: hero.with_enemies_killed(kills),
            enemy,
            leveled_up: progress.leveled_up,
        })
    }

    #[instrument(skip(self, hero), fields(hero_id = %hero.id_typed()), err)]
    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO heroes (id, name, level, experience, enemies_killed_amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(hero.id_typed().as_uuid())
        .bind(hero.name())
        .bind(i64::from(hero.level()))
        .bind(hero.experience())
        .bind(to_i64(hero.enemies_killed_amount())?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_hero", e))?;
        Ok(())
    }

    #[instrument(skip(self, enemy), fields(enemy_id = %enemy.id_typed()), err)]
    async fn insert_enemy(&self, enemy: &Enemy) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO enemies (id, name, enemy_type, level, experience, killed_by_hero_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(enemy.id_typed().as_uuid())
        .bind(enemy.name())
        .bind(enemy.enemy_type().as_str())
        .bind(i64::from(enemy.level()))
        .bind(enemy.experience())
        .bind(enemy.killed_by().map(uuid::Uuid::from))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_enemy", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_heroes(&self) -> Result<Vec<HeroRecord>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("list_heroes", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {HERO_COLUMNS} FROM heroes \
             ORDER BY level DESC, enemies_killed_amount DESC, name ASC, id ASC"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_heroes", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = HeroRecord::try_from(HeroRow::from_row(&row).map_err(corrupt("hero"))?)?;
            let kills = Self::kill_ids_in(&mut tx, record.hero.id_typed()).await?;
            record.hero = record.hero.with_enemies_killed(kills);
            records.push(record);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("list_heroes", e))?;

        tracing::debug!(hero_count = records.len(), "listed heroes");
        Ok(records)
    }

    #[instrument(skip(self), err)]
    async fn list_enemies(&self) -> Result<Vec<EnemyRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENEMY_COLUMNS} FROM enemies \
             ORDER BY {ENEMY_TYPE_ORDER} ASC, level DESC, name ASC, id ASC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_enemies", e))?;

        rows.iter()
            .map(|r| EnemyRecord::try_from(EnemyRow::from_row(r).map_err(corrupt("enemy"))?))
            .collect()
    }

    #[instrument(skip(self), fields(hero_id = %hero_id), err)]
    async fn enemies_killed_by(&self, hero_id: HeroId) -> Result<Vec<EnemyRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENEMY_COLUMNS} FROM enemies \
             WHERE killed_by_hero_id = $1 ORDER BY name ASC, id ASC"
        ))
        .bind(hero_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("enemies_killed_by", e))?;

        rows.iter()
            .map(|r| EnemyRecord::try_from(EnemyRow::from_row(r).map_err(corrupt("enemy"))?))
            .collect()
    }
}

fn to_i64(n: u64) -> Result<i64, StoreError> {
    i64::try_from(n).map_err(|_| StoreError::InvalidCommit(format!("{n} does not fit in BIGINT")))
}

fn corrupt(what: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Corrupt(format!("failed to deserialize {what} row: {e}"))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") => StoreError::MissingRow(msg),
                Some("23514") => StoreError::Corrupt(msg),
                // 40P01 deadlock, 40001 serialization failure: not guard conflicts.
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct HeroRow {
    id: uuid::Uuid,
    name: String,
    level: i64,
    experience: i64,
    enemies_killed_amount: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for HeroRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(HeroRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            level: row.try_get("level")?,
            experience: row.try_get("experience")?,
            enemies_killed_amount: row.try_get("enemies_killed_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<HeroRow> for HeroRecord {
    type Error = StoreError;

    fn try_from(row: HeroRow) -> Result<Self, Self::Error> {
        let level = u32::try_from(row.level)
            .map_err(|_| StoreError::Corrupt(format!("hero {} level {}", row.id, row.level)))?;
        let kills = u64::try_from(row.enemies_killed_amount).map_err(|_| {
            StoreError::Corrupt(format!(
                "hero {} kill count {}",
                row.id, row.enemies_killed_amount
            ))
        })?;
        let hero = Hero::restore(
            HeroId::from_uuid(row.id),
            row.name,
            level,
            row.experience,
            kills,
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(HeroRecord {
            hero,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct EnemyRow {
    id: uuid::Uuid,
    name: String,
    enemy_type: String,
    level: i64,
    experience: i64,
    killed_by_hero_id: Option<uuid::Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for EnemyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(EnemyRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            enemy_type: row.try_get("enemy_type")?,
            level: row.try_get("level")?,
            experience: row.try_get("experience")?,
            killed_by_hero_id: row.try_get("killed_by_hero_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<EnemyRow> for EnemyRecord {
    type Error = StoreError;

    fn try_from(row: EnemyRow) -> Result<Self, Self::Error> {
        let enemy_type: EnemyType = row
            .enemy_type
            .parse()
            .map_err(|e: arena_core::DomainError| StoreError::Corrupt(e.to_string()))?;
        let level = u32::try_from(row.level)
            .map_err(|_| StoreError::Corrupt(format!("enemy {} level {}", row.id, row.level)))?;
        let enemy = Enemy::restore(
            EnemyId::from_uuid(row.id),
            row.name,
            enemy_type,
            level,
            row.experience,
            row.killed_by_hero_id.map(HeroId::from_uuid),
        )
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(EnemyRecord {
            enemy,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
