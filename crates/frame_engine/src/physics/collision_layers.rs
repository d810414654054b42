//! Collision layer system for filtering collision detection
//!
//! Every collider sits on one or more layers and carries a mask of layers it
//! is willing to touch. A pair is only tested when each side's layers appear
//! in the other side's mask.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// Layer for colliders that never asked for one
        const DEFAULT = 1 << 0;
        /// Static level geometry
        const ENVIRONMENT = 1 << 1;
        /// Colliders skipped by raycasts
        const IGNORE_RAYCAST = 1 << 2;
        /// Trigger volumes
        const TRIGGER = 1 << 3;
        /// Player-controlled bodies
        const PLAYER = 1 << 4;
        /// Collectibles
        const PICKUP = 1 << 5;
        /// Small debris that only touches the environment
        const DEBRIS = 1 << 6;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CollisionLayers {
    /// Build a user layer from its bit index (0..=31)
    pub fn user(bit: u32) -> Self {
        Self::from_bits_retain(1u32.checked_shl(bit).unwrap_or(0))
    }

    /// Check if two colliders should collide based on their layers and masks
    ///
    /// A's layer must be in B's mask and B's layer must be in A's mask.
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }

    /// Mask accepting every layer, including user layers
    pub fn everything() -> Self {
        Self::from_bits_retain(u32::MAX)
    }
}
