//! Typed identifier for persisted entities.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A strongly-typed wrapper for store-assigned entity IDs.
///
/// IDs are 64-bit surrogate keys handed out by the store on insert and never
/// reused. Before insert an entity carries [`EntityId::UNASSIGNED`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Identity of an entity that has not been persisted yet.
    pub const UNASSIGNED: Self = Self(0);

    /// Creates an ID from a raw key.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns true if the store has assigned this ID.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != Self::UNASSIGNED.0
    }

    /// Returns the inner key.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_id() {
        assert!(!EntityId::UNASSIGNED.is_assigned());
        assert!(!EntityId::default().is_assigned());
        assert!(EntityId::new(1).is_assigned());
    }

    #[test]
    fn test_entity_id_parsing() {
        let id: EntityId = "42".parse().unwrap();
        assert_eq!(id, EntityId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_serializes_as_number() {
        let json = serde_json::to_string(&EntityId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
