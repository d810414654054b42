//! Rigidbody description
//!
//! The authored settings of a body. `Physics` turns a validated description
//! into a [`PhysicsActor`](super::actor::PhysicsActor) when the owning
//! component awakens.

use serde::{Deserialize, Serialize};

use super::PhysicsError;

/// Authored rigidbody settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidbodyDesc {
    /// Mass in kilograms; ignored for kinematic bodies
    pub mass: f32,
    /// Kinematic bodies follow their velocity and are not pushed by contacts
    pub is_kinematic: bool,
    /// Whether world gravity applies
    pub use_gravity: bool,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Fraction of linear velocity removed per second
    pub linear_damping: f32,
    /// Fraction of angular velocity removed per second
    pub angular_damping: f32,
}

impl Default for RigidbodyDesc {
    fn default() -> Self {
        Self {
            mass: 1.0,
            is_kinematic: false,
            use_gravity: true,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.05,
        }
    }
}

impl RigidbodyDesc {
    /// Dynamic body with the given mass
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }

    /// Kinematic body
    pub fn kinematic() -> Self {
        Self {
            is_kinematic: true,
            use_gravity: false,
            ..Default::default()
        }
    }

    /// Toggle gravity
    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.use_gravity = enabled;
        self
    }

    /// Set damping coefficients
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Reject settings the solver cannot use
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.is_kinematic && !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(PhysicsError::InvalidMass(self.mass));
        }
        if !(self.linear_damping >= 0.0 && self.angular_damping >= 0.0) {
            return Err(PhysicsError::InvalidMaterial(
                "damping must be non-negative".to_string(),
            ));
        }
        if !self.gravity_scale.is_finite() {
            return Err(PhysicsError::InvalidMaterial(
                "gravity scale must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Inverse mass used by the solver; zero for kinematic bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_kinematic {
            0.0
        } else {
            1.0 / self.mass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_mass_dynamic_rejected() {
        assert_eq!(RigidbodyDesc::dynamic(0.0).validate(), Err(PhysicsError::InvalidMass(0.0)));
        assert!(RigidbodyDesc::dynamic(-2.0).validate().is_err());
    }

    #[test]
    fn test_zero_mass_kinematic_accepted() {
        let mut desc = RigidbodyDesc::kinematic();
        desc.mass = 0.0;
        assert!(desc.validate().is_ok());
        assert_relative_eq!(desc.inverse_mass(), 0.0);
    }

    #[test]
    fn test_inverse_mass() {
        assert_relative_eq!(RigidbodyDesc::dynamic(4.0).inverse_mass(), 0.25);
    }
}
