//! Cache key generators for consistent key naming.

use keystone_core::{Entity, EntityId};

/// Prefix for all cache keys to namespace them.
pub const CACHE_PREFIX: &str = "keystone:cache";

/// Key for a resource looked up by ID.
#[must_use]
pub fn resource_by_id(resource: &str, id: EntityId) -> String {
    format!("{}:{}:id:{}", CACHE_PREFIX, resource, id)
}

/// Key for an entity looked up by ID.
#[must_use]
pub fn entity_by_id<E: Entity>(id: EntityId) -> String {
    resource_by_id(E::RESOURCE, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::User;

    #[test]
    fn test_entity_by_id_key() {
        assert_eq!(entity_by_id::<User>(EntityId::new(42)), "keystone:cache:user:id:42");
    }

    #[test]
    fn test_resource_by_id_key() {
        assert_eq!(
            resource_by_id("order", EntityId::new(3)),
            "keystone:cache:order:id:3"
        );
    }
}
