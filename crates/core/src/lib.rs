//! `arena-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod guard;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use guard::ExpectedSlot;
pub use id::{EnemyId, HeroId};
