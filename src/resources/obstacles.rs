//! Obstacle registry resource.
//!
//! The [`ObstacleRegistry`] associates semantic obstacle names (`"spikes"`,
//! `"snowman"`, `"water"`) with the physical bodies that carry them. It is a
//! pure lookup table consulted by
//! [`CollisionRouter`](crate::components::collisionrouter::CollisionRouter)
//! on every contact, so a miss is the common case and never an error.
//!
//! Level setup registers bodies once; registering the same (name, body) pair
//! twice is a wiring bug and fails loudly.

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ConfigurationError;

/// Name-scoped sets of obstacle bodies.
#[derive(Debug, Clone, Default, Resource)]
pub struct ObstacleRegistry {
    by_name: FxHashMap<String, FxHashSet<Entity>>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `body` under `name`.
    ///
    /// Fails with [`ConfigurationError::DuplicateObstacle`] if the pair is
    /// already present; the registry is left unchanged.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        body: Entity,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        let bodies = self.by_name.entry(name.clone()).or_default();
        if !bodies.insert(body) {
            return Err(ConfigurationError::DuplicateObstacle { name, body });
        }
        Ok(())
    }

    /// Is `body` registered under `name`?
    pub fn is_registered(&self, name: &str, body: Entity) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|bodies| bodies.contains(&body))
    }

    /// Remove one (name, body) pair. Returns whether it was present.
    pub fn unregister(&mut self, name: &str, body: Entity) -> bool {
        let Some(bodies) = self.by_name.get_mut(name) else {
            return false;
        };
        let removed = bodies.remove(&body);
        if bodies.is_empty() {
            self.by_name.remove(name);
        }
        removed
    }

    /// Drop every registration of `body`, e.g. when it is despawned.
    /// Returns the number of names it was removed from.
    pub fn remove_body(&mut self, body: Entity) -> usize {
        let mut removed = 0;
        self.by_name.retain(|_, bodies| {
            if bodies.remove(&body) {
                removed += 1;
            }
            !bodies.is_empty()
        });
        removed
    }

    /// Number of registered (name, body) pairs.
    pub fn len(&self) -> usize {
        self.by_name.values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    fn bodies(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_register_and_query() {
        let b = bodies(2);
        let mut registry = ObstacleRegistry::new();
        registry.register("spikes", b[0]).unwrap();

        assert!(registry.is_registered("spikes", b[0]));
        assert!(!registry.is_registered("spikes", b[1]));
        assert!(!registry.is_registered("water", b[0]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let b = bodies(1);
        let mut registry = ObstacleRegistry::new();
        registry.register("spikes", b[0]).unwrap();

        let err = registry.register("spikes", b[0]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateObstacle {
                name: "spikes".into(),
                body: b[0],
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_body_under_two_names() {
        let b = bodies(1);
        let mut registry = ObstacleRegistry::new();
        registry.register("enemy", b[0]).unwrap();
        registry.register("snowman", b[0]).unwrap();

        assert!(registry.is_registered("enemy", b[0]));
        assert!(registry.is_registered("snowman", b[0]));
        assert_eq!(registry.remove_body(b[0]), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_body_is_a_silent_miss() {
        let b = bodies(3);
        let registry = ObstacleRegistry::new();
        for body in b {
            assert!(!registry.is_registered("hazard", body));
        }
    }

    #[test]
    fn test_unregister() {
        let b = bodies(2);
        let mut registry = ObstacleRegistry::new();
        registry.register("water", b[0]).unwrap();
        registry.register("water", b[1]).unwrap();

        assert!(registry.unregister("water", b[0]));
        assert!(!registry.unregister("water", b[0]));
        assert!(!registry.unregister("lava", b[1]));
        assert!(registry.is_registered("water", b[1]));
        // re-registration after removal is allowed
        registry.register("water", b[0]).unwrap();
    }
}
