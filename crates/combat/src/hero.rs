use arena_core::{DomainError, DomainResult, EnemyId, Entity, HeroId};

use crate::enemy::Enemy;
use crate::kill::{KillOutcome, experience_for_kill};
use crate::leveling::{LevelProgress, gain_experience};

/// Hero entity.
///
/// `enemies_killed` is a projection of `Enemy::killed_by`; the enemy marker is
/// the source of truth and stores never persist this list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hero {
    id: HeroId,
    name: String,
    level: u32,
    experience: i64,
    enemies_killed_amount: u64,
    enemies_killed: Vec<EnemyId>,
}

impl Hero {
    /// A fresh hero at level 1 with no experience and no kills.
    pub fn new(id: HeroId, name: impl Into<String>) -> DomainResult<Self> {
        Self::restore(id, name, 1, 0, 0)
    }

    /// Rebuild a hero from stored state.
    pub fn restore(
        id: HeroId,
        name: impl Into<String>,
        level: u32,
        experience: i64,
        enemies_killed_amount: u64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("hero name cannot be empty"));
        }
        if level == 0 {
            return Err(DomainError::invariant("hero level starts at 1"));
        }
        Ok(Self {
            id,
            name,
            level,
            experience,
            enemies_killed_amount,
            enemies_killed: Vec::new(),
        })
    }

    /// Attach the kill projection computed by the store.
    pub fn with_enemies_killed(mut self, enemies: Vec<EnemyId>) -> Self {
        self.enemies_killed = enemies;
        self
    }

    pub fn id_typed(&self) -> HeroId {
        self.id
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> i64 {
        self.experience
    }

    pub fn enemies_killed_amount(&self) -> u64 {
        self.enemies_killed_amount
    }

    pub fn enemies_killed(&self) -> &[EnemyId] {
        &self.enemies_killed
    }

    /// Returns true if the hero leveled up at least once.
    pub fn gain_experience(&mut self, amount: i64) -> bool {
        let p = gain_experience(self.level, self.experience, amount);
        self.level = p.level;
        self.experience = p.experience;
        p.leveled_up
    }

    /// Count one kill and bank its experience.
    ///
    /// Stores call this on the row as it is at commit time, so concurrent
    /// kills by the same hero compose instead of overwriting each other.
    pub fn record_kill(&mut self, experience_gained: i64) -> LevelProgress {
        self.enemies_killed_amount = self.enemies_killed_amount.saturating_add(1);
        let p = gain_experience(self.level, self.experience, experience_gained);
        self.level = p.level;
        self.experience = p.experience;
        p
    }

    /// Kill `enemy`: mark it, project it, count it, and gain `level * 10`.
    ///
    /// Fails with `DomainError::Conflict` (and changes nothing) if the enemy
    /// already carries a killed-by marker.
    pub fn kill_enemy(&mut self, enemy: &mut Enemy) -> DomainResult<KillOutcome> {
        enemy.mark_killed_by(self.id)?;
        self.enemies_killed.push(enemy.id_typed());

        let experience_gained = experience_for_kill(enemy.level());
        let p = self.record_kill(experience_gained);

        Ok(KillOutcome {
            leveled_up: p.leveled_up,
            experience_gained,
        })
    }
}

impl Entity for Hero {
    type Id = HeroId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
