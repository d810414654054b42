//! Collision shape definitions
//!
//! [`ColliderShape`] is authored in the owner's local space. Each step it is
//! re-derived in world space from the owner's transform as a [`WorldShape`].

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, utils, Mat3, Trs, Vec3};
use crate::physics::PhysicsError;

use super::bounds::Bounds;
use super::primitives::{Ray, Sphere};

/// Collision shape in local (model) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere around a local center
    Sphere {
        /// Local center offset
        center: Vec3,
        /// Radius before scaling
        radius: f32,
    },
    /// Axis-aligned box around a local center
    Box {
        /// Local center offset
        center: Vec3,
        /// Half extents before scaling
        half_extents: Vec3,
    },
}

impl ColliderShape {
    /// Unit sphere of radius `radius` centered on the owner
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere {
            center: Vec3::zeros(),
            radius,
        }
    }

    /// Box with the given half extents centered on the owner
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box {
            center: Vec3::zeros(),
            half_extents,
        }
    }

    /// Reject shapes that cannot produce meaningful contacts
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match self {
            Self::Sphere { center, radius } => {
                if !utils::is_finite(center) || !radius.is_finite() || *radius <= 0.0 {
                    return Err(PhysicsError::DegenerateShape(format!(
                        "sphere radius must be positive and finite, got {radius}"
                    )));
                }
            }
            Self::Box {
                center,
                half_extents,
            } => {
                if !utils::is_finite(center)
                    || !utils::is_finite(half_extents)
                    || half_extents.iter().any(|e| *e <= 0.0)
                {
                    return Err(PhysicsError::DegenerateShape(format!(
                        "box half extents must be positive and finite, got {half_extents:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Derive the world-space shape from the owner's world transform
    ///
    /// Sphere radii scale by the largest absolute axis scale. Boxes stay axis
    /// aligned and grow to enclose their rotated, scaled extents.
    pub fn to_world(&self, world: &Trs) -> WorldShape {
        match self {
            Self::Sphere { center, radius } => WorldShape::Sphere(Sphere::new(
                world.transform_point(center),
                radius * utils::max_abs_component(&world.scale),
            )),
            Self::Box {
                center,
                half_extents,
            } => {
                let basis = world.rotation.to_rotation_matrix().into_inner()
                    * Mat3::from_diagonal(&world.scale);
                WorldShape::Box(Bounds::new(
                    world.transform_point(center),
                    utils::rotated_extents(&basis, half_extents),
                ))
            }
        }
    }
}

/// Collision shape in world space, recomputed every step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    /// World-space sphere
    Sphere(Sphere),
    /// World-space axis-aligned box
    Box(Bounds),
}

impl WorldShape {
    /// World-space center
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Sphere(sphere) => sphere.center,
            Self::Box(bounds) => bounds.center,
        }
    }

    /// Tight axis-aligned bounds
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Sphere(sphere) => Bounds::new(sphere.center, Vec3::repeat(sphere.radius)),
            Self::Box(bounds) => *bounds,
        }
    }

    /// The same shape moved by `offset`
    pub fn translated(&self, offset: &Vec3) -> WorldShape {
        match self {
            Self::Sphere(sphere) => Self::Sphere(Sphere::new(sphere.center + offset, sphere.radius)),
            Self::Box(bounds) => Self::Box(Bounds::new(bounds.center + offset, bounds.extents)),
        }
    }

    /// The same shape recentered at `center`
    pub fn recentered(&self, center: &Vec3) -> WorldShape {
        self.translated(&(center - self.center()))
    }

    /// Check if a point lies inside the shape
    pub fn contains(&self, point: &Vec3) -> bool {
        match self {
            Self::Sphere(sphere) => sphere.contains(point),
            Self::Box(bounds) => bounds.contains(point),
        }
    }

    /// Check overlap with an axis-aligned box
    pub fn overlaps_bounds(&self, other: &Bounds) -> bool {
        match self {
            Self::Sphere(sphere) => other.sqr_distance(&sphere.center) <= sphere.radius * sphere.radius,
            Self::Box(bounds) => bounds.intersects(other),
        }
    }

    /// Ray test returning `(distance, surface normal)`
    ///
    /// Rays whose origin is inside the shape do not hit it.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        if ray.is_degenerate() || self.contains(&ray.origin) {
            return None;
        }
        match self {
            Self::Sphere(sphere) => {
                let t = sphere.intersect_ray(ray)?;
                let normal = utils::try_normalize(&(ray.point_at(t) - sphere.center))
                    .unwrap_or_else(|| -ray.direction);
                Some((t, normal))
            }
            Self::Box(bounds) => {
                let t = bounds.intersect_ray(ray)?;
                Some((t, box_face_normal(bounds, &ray.point_at(t), &ray.direction)))
            }
        }
    }
}

/// Outward normal of the box face containing `point`
fn box_face_normal(bounds: &Bounds, point: &Vec3, direction: &Vec3) -> Vec3 {
    let min = bounds.min();
    let max = bounds.max();
    for axis in 0..3 {
        let mut normal = Vec3::zeros();
        if (point[axis] - min[axis]).abs() < constants::FACE_EPSILON {
            normal[axis] = -1.0;
            return normal;
        }
        if (point[axis] - max[axis]).abs() < constants::FACE_EPSILON {
            normal[axis] = 1.0;
            return normal;
        }
    }
    -direction
}
