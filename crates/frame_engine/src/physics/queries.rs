//! Raycast and overlap queries
//!
//! Queries read the world shapes stored at the end of the last completed
//! step (or at registration for colliders added since), never mid-step state.

use crate::foundation::collections::{ActorId, GameObjectId, ShapeId};
use crate::foundation::math::Vec3;

use super::collision::{Bounds, Ray, Sphere, WorldShape};
use super::collision_layers::CollisionLayers;
use super::narrow_phase::{self, ContactTest};
use super::physics_shape::PhysicsShape;
use super::world::Physics;

/// Result of a successful raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Collider that was hit
    pub shape: ShapeId,
    /// Game object owning the collider
    pub object: GameObjectId,
    /// Body the collider moves with, if any
    pub actor: Option<ActorId>,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
}

impl Physics {
    /// Closest hit along `ray` within `max_distance`
    ///
    /// A zero direction or a non-positive distance never hits. Colliders on
    /// [`CollisionLayers::IGNORE_RAYCAST`] and colliders containing the ray
    /// origin are skipped.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RaycastHit> {
        self.raycast_filtered(ray, max_distance, |_| true)
    }

    /// [`Physics::raycast`] restricted to colliders accepted by `filter`
    pub fn raycast_filtered<F>(&self, ray: &Ray, max_distance: f32, filter: F) -> Option<RaycastHit>
    where
        F: Fn(&PhysicsShape) -> bool,
    {
        self.raycast_candidates(ray, max_distance, filter)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Every hit along `ray` within `max_distance`, nearest first
    pub fn raycast_all(&self, ray: &Ray, max_distance: f32) -> Vec<RaycastHit> {
        let mut hits: Vec<RaycastHit> = self.raycast_candidates(ray, max_distance, |_| true).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn raycast_candidates<'a, F>(
        &'a self,
        ray: &'a Ray,
        max_distance: f32,
        accept: F,
    ) -> impl Iterator<Item = RaycastHit> + 'a
    where
        F: Fn(&PhysicsShape) -> bool + 'a,
    {
        let usable = !ray.is_degenerate() && max_distance > 0.0;
        self.shapes()
            .filter(move |_| usable)
            .filter(|shape| !shape.desc().layers.intersects(CollisionLayers::IGNORE_RAYCAST))
            .filter(move |shape| accept(*shape))
            .filter_map(move |shape| {
                let (distance, normal) = shape.world_shape().intersect_ray(ray)?;
                (distance <= max_distance).then(|| RaycastHit {
                    shape: shape.id(),
                    object: shape.owner(),
                    actor: shape.actor(),
                    point: ray.point_at(distance),
                    normal,
                    distance,
                })
            })
    }

    /// Colliders whose shape overlaps `bounds`
    pub fn overlap_bounds(&self, bounds: &Bounds) -> Vec<ShapeId> {
        self.shapes()
            .filter(|shape| shape.world_shape().overlaps_bounds(bounds))
            .map(PhysicsShape::id)
            .collect()
    }

    /// Colliders whose shape overlaps the sphere
    pub fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<ShapeId> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        let probe = WorldShape::Sphere(Sphere::new(center, radius));
        self.shapes()
            .filter(|shape| {
                !matches!(
                    narrow_phase::collide(&probe, shape.world_shape(), 1),
                    ContactTest::Separated
                )
            })
            .map(PhysicsShape::id)
            .collect()
    }
}
