//! Math utilities and types
//!
//! Provides the fundamental math types shared by the scene hierarchy and the
//! physics pipeline.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Translation, rotation and scale triple
///
/// Composes as `T * R * S`, so scale is applied first and translation last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Trs {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(point)
    }

    /// Apply this transform to a direction, ignoring translation
    pub fn transform_vector(&self, vector: &Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(vector)
    }

    /// Map a world-space point back into this transform's local space
    pub fn inverse_transform_point(&self, point: &Vec3) -> Vec3 {
        let unrotated = self.rotation.inverse() * (point - self.position);
        unrotated.component_div(&utils::non_zero(self.scale))
    }

    /// Compose `self` (parent) with `child`, yielding the child's transform in parent space
    ///
    /// Exact for uniform scale; non-uniform parent scale combined with a rotated
    /// child keeps the per-axis scale and drops the resulting shear.
    pub fn combine(&self, child: &Trs) -> Trs {
        Trs {
            position: self.transform_point(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Express `self` (a world transform) in the space of `parent`
    ///
    /// Inverse of [`combine`](Self::combine): `parent.combine(&self.relative_to(parent)) == self`.
    pub fn relative_to(&self, parent: &Trs) -> Trs {
        Trs {
            position: parent.inverse_transform_point(&self.position),
            rotation: parent.rotation.inverse() * self.rotation,
            scale: self.scale.component_div(&utils::non_zero(parent.scale)),
        }
    }
}

/// Position and orientation of a rigid body in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World-space position
    pub position: Vec3,
    /// World-space rotation
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Pose {
    /// Create a pose at `position` with identity rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Math constants
pub mod constants {
    /// Lengths below this are treated as zero when normalizing
    pub const NORMAL_EPSILON: f32 = 1.0e-6;

    /// Tolerance used to pick a box face from a surface point
    pub const FACE_EPSILON: f32 = 1.0e-3;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat3, Vec3};

    /// Normalize `v`, or `None` when its length is too small to define a direction
    pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
        v.try_normalize(constants::NORMAL_EPSILON)
    }

    /// True when every component is finite
    pub fn is_finite(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }

    /// Replace zero components with 1 so the vector can be used as a divisor
    pub fn non_zero(v: Vec3) -> Vec3 {
        v.map(|c| if c.abs() < f32::EPSILON { 1.0 } else { c })
    }

    /// Largest absolute component
    pub fn max_abs_component(v: &Vec3) -> f32 {
        v.abs().max()
    }

    /// Half extents of the axis-aligned box enclosing a box rotated and scaled by `basis`
    pub fn rotated_extents(basis: &Mat3, half_extents: &Vec3) -> Vec3 {
        basis.abs() * half_extents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combine_matches_matrix_product() {
        let parent = Trs {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.5),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let child = Trs::from_position(Vec3::new(0.0, 1.0, -1.0));

        let combined = parent.combine(&child).to_matrix();
        let product = parent.to_matrix() * child.to_matrix();
        assert_relative_eq!(combined, product, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_transform_point_round_trips() {
        let trs = Trs {
            position: Vec3::new(-4.0, 0.5, 2.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), 1.2),
            scale: Vec3::new(1.0, 3.0, 0.5),
        };
        let local = Vec3::new(0.25, -1.0, 8.0);
        let world = trs.transform_point(&local);
        assert_relative_eq!(trs.inverse_transform_point(&world), local, epsilon = 1e-4);
    }

    #[test]
    fn test_relative_to_inverts_combine() {
        let parent = Trs {
            position: Vec3::new(2.0, -1.0, 0.5),
            rotation: Quat::from_axis_angle(&Vec3::x_axis(), -0.7),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let world = Trs {
            position: Vec3::new(0.0, 4.0, 1.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.3),
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        let restored = parent.combine(&world.relative_to(&parent));
        assert_relative_eq!(restored.position, world.position, epsilon = 1e-5);
        assert_relative_eq!(restored.rotation, world.rotation, epsilon = 1e-5);
        assert_relative_eq!(restored.scale, world.scale, epsilon = 1e-5);
    }

    #[test]
    fn test_try_normalize_rejects_degenerate() {
        assert!(utils::try_normalize(&Vec3::zeros()).is_none());
        assert!(utils::try_normalize(&Vec3::new(0.0, 2.0, 0.0)).is_some());
    }
}
