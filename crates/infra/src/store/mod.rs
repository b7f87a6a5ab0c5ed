//! Transactional hero/enemy storage boundary.
//!
//! This module defines an infrastructure-facing abstraction for reading heroes
//! and enemies and for committing a kill (both rows, guarded on the enemy's
//! killed-by marker) without making any storage assumptions.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCombatStore;
pub use postgres::PostgresCombatStore;
pub use r#trait::{
    CombatStore, CommittedKill, EnemyRecord, HeroRecord, KillTransaction, StoreError,
};
