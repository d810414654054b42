//! Primitive collision shapes and intersection algorithms

use crate::foundation::math::{utils, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray; the direction is normalized
    ///
    /// A zero direction is kept as zero and such a ray never hits anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: utils::try_normalize(&direction).unwrap_or_else(Vec3::zeros),
        }
    }

    /// True if the direction could not be normalized
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::zeros()
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A sphere in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another (touching counts)
    pub fn intersects(&self, other: &Sphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if a point lies inside the sphere
    pub fn contains(&self, point: &Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Test ray intersection with this sphere
    ///
    /// Returns the distance along the ray of the first surface crossing in front
    /// of the origin. Rays starting inside the sphere report no hit.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let c = oc.dot(&oc) - self.radius * self.radius;
        if c < 0.0 {
            return None;
        }

        // direction is unit length, so a == 1
        let b = oc.dot(&ray.direction);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(ray.direction, Vec3::z());
        assert_relative_eq!(ray.point_at(2.0), Vec3::new(0.0, 0.0, 2.0));
        assert!(Ray::new(Vec3::zeros(), Vec3::zeros()).is_degenerate());
    }

    #[test]
    fn test_sphere_ray_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::z());
        assert_relative_eq!(sphere.intersect_ray(&ray).unwrap(), 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_ray_ignores_inside_and_behind() {
        let sphere = Sphere::new(Vec3::zeros(), 1.0);
        assert!(sphere.intersect_ray(&Ray::new(Vec3::zeros(), Vec3::x())).is_none());

        let behind = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::x());
        assert!(sphere.intersect_ray(&behind).is_none());
    }

    #[test]
    fn test_sphere_intersection() {
        let a = Sphere::new(Vec3::zeros(), 1.0);
        let b = Sphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);
        let c = Sphere::new(Vec3::new(2.5, 0.0, 0.0), 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
