//! Collider description and material

use serde::{Deserialize, Serialize};

use super::collision::ColliderShape;
use super::collision_layers::CollisionLayers;
use super::PhysicsError;

/// Surface response coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Bounciness in `[0, 1]`
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.4,
            restitution: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// Create a material
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}

/// Authored collider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Shape in local space
    pub shape: ColliderShape,
    /// Triggers report overlaps but produce no contact response
    pub is_trigger: bool,
    /// Surface coefficients
    pub material: PhysicsMaterial,
    /// Layers this collider sits on
    pub layers: CollisionLayers,
    /// Layers this collider accepts contact with
    pub mask: CollisionLayers,
}

impl ColliderDesc {
    /// Collider for `shape` with default material and layers
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            is_trigger: false,
            material: PhysicsMaterial::default(),
            layers: CollisionLayers::DEFAULT,
            mask: CollisionLayers::everything(),
        }
    }

    /// Sphere collider; 0.5 matches a unit-diameter mesh
    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::sphere(radius))
    }

    /// Box collider from half extents
    pub fn cuboid(half_extents: crate::foundation::math::Vec3) -> Self {
        Self::new(ColliderShape::cuboid(half_extents))
    }

    /// Mark as trigger
    pub fn with_trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set layers and mask
    pub fn with_layers(mut self, layers: CollisionLayers, mask: CollisionLayers) -> Self {
        self.layers = layers;
        self.mask = mask;
        self
    }

    /// Reject degenerate shapes and out-of-range materials
    pub fn validate(&self) -> Result<(), PhysicsError> {
        self.shape.validate()?;
        let PhysicsMaterial {
            friction,
            restitution,
        } = self.material;
        if !(friction.is_finite() && friction >= 0.0) {
            return Err(PhysicsError::InvalidMaterial(format!(
                "friction must be non-negative, got {friction}"
            )));
        }
        if !(0.0..=1.0).contains(&restitution) {
            return Err(PhysicsError::InvalidMaterial(format!(
                "restitution must be within [0, 1], got {restitution}"
            )));
        }
        Ok(())
    }
}
