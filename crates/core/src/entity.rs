//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Human-readable name, used for ordering in listings.
    fn name(&self) -> &str;
}
