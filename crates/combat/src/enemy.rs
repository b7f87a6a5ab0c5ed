use core::str::FromStr;

use serde::{Deserialize, Serialize};

use arena_core::{DomainError, DomainResult, EnemyId, Entity, ExpectedSlot, HeroId};

use crate::leveling::gain_experience;

/// Enemy category. Closed set, fixed at creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnemyType {
    Dragon,
    Orc,
    Goblin,
    Troll,
}

impl EnemyType {
    /// All categories, in declaration (and listing) order.
    pub const ALL: [EnemyType; 4] = [
        EnemyType::Dragon,
        EnemyType::Orc,
        EnemyType::Goblin,
        EnemyType::Troll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyType::Dragon => "DRAGON",
            EnemyType::Orc => "ORC",
            EnemyType::Goblin => "GOBLIN",
            EnemyType::Troll => "TROLL",
        }
    }
}

impl core::fmt::Display for EnemyType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnemyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnemyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown enemy type '{s}' (expected one of: DRAGON, ORC, GOBLIN, TROLL)"
                ))
            })
    }
}

/// Enemy entity.
///
/// `killed_by` is the only piece of state contested between concurrent kill
/// attempts. It is write-once: empty while alive, then one hero id forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    id: EnemyId,
    name: String,
    enemy_type: EnemyType,
    level: u32,
    experience: i64,
    killed_by: Option<HeroId>,
}

impl Enemy {
    /// A fresh, alive enemy at level 1 with no experience.
    pub fn new(id: EnemyId, name: impl Into<String>, enemy_type: EnemyType) -> DomainResult<Self> {
        Self::restore(id, name, enemy_type, 1, 0, None)
    }

    /// Rebuild an enemy from stored state.
    pub fn restore(
        id: EnemyId,
        name: impl Into<String>,
        enemy_type: EnemyType,
        level: u32,
        experience: i64,
        killed_by: Option<HeroId>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("enemy name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            enemy_type,
            level,
            experience,
            killed_by,
        })
    }

    pub fn id_typed(&self) -> EnemyId {
        self.id
    }

    pub fn enemy_type(&self) -> EnemyType {
        self.enemy_type
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> i64 {
        self.experience
    }

    pub fn killed_by(&self) -> Option<HeroId> {
        self.killed_by
    }

    pub fn is_alive(&self) -> bool {
        self.killed_by.is_none()
    }

    /// Same leveling rule as heroes. Combat never calls this on enemies today.
    pub fn gain_experience(&mut self, amount: i64) -> bool {
        let p = gain_experience(self.level, self.experience, amount);
        self.level = p.level;
        self.experience = p.experience;
        p.leveled_up
    }

    /// Set the killed-by marker. Refuses to overwrite an existing marker.
    pub(crate) fn mark_killed_by(&mut self, hero_id: HeroId) -> DomainResult<()> {
        ExpectedSlot::Empty.check(self.killed_by.as_ref())?;
        self.killed_by = Some(hero_id);
        Ok(())
    }
}

impl Entity for Enemy {
    type Id = EnemyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
