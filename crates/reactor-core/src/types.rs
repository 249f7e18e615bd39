//! Core types used throughout the reactor engine

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

/// Unique identifier for a combat entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a v4 entity ID from caller-supplied random bytes.
    ///
    /// Simulations draw these bytes from their seeded RNG so that ids are
    /// reproducible run to run.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first block is enough to tell entities apart in logs
        let text = self.0.simple().to_string();
        write!(f, "{}", &text[..8])
    }
}

/// A circular area on the ground plane, used for area-of-effect hitboxes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec3,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether a point lies inside the circle. Height is ignored.
    pub fn contains(&self, point: Vec3) -> bool {
        let dx = point.x - self.center.x;
        let dz = point.z - self.center.z;
        dx * dx + dz * dz <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_from_bytes_is_stable() {
        let a = EntityId::from_random_bytes([7; 16]);
        let b = EntityId::from_random_bytes([7; 16]);
        assert_eq!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
    }

    #[test]
    fn test_entity_id_display_is_short() {
        let id = EntityId::from_random_bytes([0xab; 16]);
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_circle_contains_ignores_height() {
        let circle = Circle::new(Vec3::ZERO, 2.0);
        assert!(circle.contains(Vec3::new(1.0, 50.0, 1.0)));
        assert!(circle.contains(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!circle.contains(Vec3::new(2.0, 0.0, 0.5)));
    }

    #[test]
    fn test_entity_id_serde() {
        let id = EntityId::from_random_bytes([3; 16]);
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
