//! Axis-aligned bounding volume
//!
//! Stored as center and half extents. Used for broad-phase proxies, overlap
//! queries and as the world-space form of box colliders.

use crate::foundation::math::Vec3;

use super::primitives::Ray;

/// Axis-aligned bounding box described by center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Center of the box
    pub center: Vec3,
    /// Half size along each axis
    pub extents: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl Bounds {
    /// Create bounds from center and full size
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self::new(center, size * 0.5)
    }

    /// Create bounds from center and half extents
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Create bounds spanning two corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Full size of the box
    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    /// Reset the box to span `min`..`max`
    pub fn set_min_max(&mut self, min: Vec3, max: Vec3) {
        *self = Self::from_min_max(min, max);
    }

    /// Check if this box contains a point (boundary inclusive)
    pub fn contains(&self, point: &Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        (0..3).all(|i| point[i] >= min[i] && point[i] <= max[i])
    }

    /// Point on or inside the box nearest to `point`
    pub fn closest_point(&self, point: &Vec3) -> Vec3 {
        let min = self.min();
        let max = self.max();
        Vec3::new(
            point.x.clamp(min.x, max.x),
            point.y.clamp(min.y, max.y),
            point.z.clamp(min.z, max.z),
        )
    }

    /// Squared distance from `point` to the box; zero inside
    pub fn sqr_distance(&self, point: &Vec3) -> f32 {
        (self.closest_point(point) - point).magnitude_squared()
    }

    /// Grow the full size by `amount` on every axis
    pub fn expand(&mut self, amount: f32) {
        self.extents += Vec3::repeat(amount * 0.5);
    }

    /// Grow the box to include `point`
    pub fn encapsulate(&mut self, point: &Vec3) {
        let min = self.min().inf(point);
        let max = self.max().sup(point);
        self.set_min_max(min, max);
    }

    /// Grow the box to include `other`
    pub fn encapsulate_bounds(&mut self, other: &Bounds) {
        let min = self.min().inf(&other.min());
        let max = self.max().sup(&other.max());
        self.set_min_max(min, max);
    }

    /// Bounds swept along `motion`
    pub fn swept(&self, motion: &Vec3) -> Bounds {
        let mut swept = *self;
        swept.center += motion * 0.5;
        swept.extents += motion.abs() * 0.5;
        swept
    }

    /// Check if this box intersects another (touching counts)
    pub fn intersects(&self, other: &Bounds) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.extents + other.extents;
        d.x <= reach.x && d.y <= reach.y && d.z <= reach.z
    }

    /// Test ray intersection using the slab method
    ///
    /// Returns the entry distance along the ray, or 0 when the origin is inside.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let min = self.min();
        let max = self.max();
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < f32::EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let t1 = (min[axis] - origin) * inv;
            let t2 = (max[axis] - origin) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}
