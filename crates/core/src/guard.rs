//! Optimistic concurrency guard for write-once slots.

use crate::error::{DomainError, DomainResult};

/// Expectation about a write-once slot (an `Option` that may only go from
/// `None` to `Some` once) at the moment a write lands.
///
/// Stores re-validate this at commit time, so a stale read can never
/// overwrite a slot another writer already filled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ExpectedSlot {
    /// Skip the check (admin tooling, fixtures).
    Any,
    /// Require the slot to still be empty.
    #[default]
    Empty,
}

impl ExpectedSlot {
    pub fn matches<T>(self, actual: Option<&T>) -> bool {
        match self {
            ExpectedSlot::Any => true,
            ExpectedSlot::Empty => actual.is_none(),
        }
    }

    pub fn check<T: core::fmt::Display>(self, actual: Option<&T>) -> DomainResult<()> {
        if self.matches(actual) {
            return Ok(());
        }
        let held = actual.map(ToString::to_string).unwrap_or_default();
        Err(DomainError::conflict(format!(
            "write-once slot already holds {held} (expected: {self:?})"
        )))
    }
}
