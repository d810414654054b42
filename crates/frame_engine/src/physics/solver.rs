//! Sequential-impulse contact solver
//!
//! Velocities are solved first: restitution targets are fixed from the
//! pre-solve velocities, cached impulses are applied as a warm start, then each
//! contact point of each manifold is visited in canonical pair order for the
//! configured number of passes. Overlap left after integration is removed by
//! a separate position pass so the correction never feeds energy into the
//! velocities.

use std::collections::BTreeMap;

use crate::core::config::PhysicsConfig;
use crate::foundation::collections::{ActorId, OrderedPair, ShapeId, SlotMap};
use crate::foundation::math::{utils, Vec3};

use super::actor::PhysicsActor;
use super::collision::WorldShape;
use super::contact::ContactManifold;
use super::narrow_phase::{self, ContactTest};
use super::physics_shape::PhysicsShape;

/// Manifold cache keyed and iterated by canonical pair
pub(crate) type ManifoldMap = BTreeMap<OrderedPair<ShapeId>, ContactManifold>;

#[derive(Debug, Clone, Copy)]
struct Body {
    velocity: Vec3,
    inverse_mass: f32,
}

/// Solver view of one side; static and sleeping sides are immovable
fn body(actors: &SlotMap<ActorId, PhysicsActor>, id: Option<ActorId>) -> Body {
    match id.and_then(|id| actors.get(id)) {
        Some(actor) if !actor.is_sleeping() => Body {
            velocity: actor.velocity,
            inverse_mass: actor.inverse_mass(),
        },
        _ => Body {
            velocity: Vec3::zeros(),
            inverse_mass: 0.0,
        },
    }
}

fn store_velocity(actors: &mut SlotMap<ActorId, PhysicsActor>, id: Option<ActorId>, velocity: Vec3) {
    if let Some(actor) = id.and_then(|id| actors.get_mut(id)) {
        if actor.is_dynamic() && !actor.is_sleeping() {
            actor.velocity = velocity;
        }
    }
}

fn translate(actors: &mut SlotMap<ActorId, PhysicsActor>, id: Option<ActorId>, delta: Vec3) {
    if let Some(actor) = id.and_then(|id| actors.get_mut(id)) {
        actor.pose.position += delta;
    }
}

/// Manifolds the solver acts on this step
pub(crate) fn is_solvable(manifold: &ContactManifold, step: u64) -> bool {
    !manifold.is_trigger && manifold.touched_step == step && !manifold.points.is_empty()
}

/// World shape of `id` at its actor's current position
pub(crate) fn current_world(
    shapes: &SlotMap<ShapeId, PhysicsShape>,
    actors: &SlotMap<ActorId, PhysicsActor>,
    id: ShapeId,
) -> Option<WorldShape> {
    let shape = shapes.get(id)?;
    Some(match shape.actor.and_then(|actor| actors.get(actor)) {
        Some(actor) => shape.world.recentered(&(actor.pose.position + shape.offset)),
        None => shape.world,
    })
}

/// Fix restitution targets and apply the warm start
pub(crate) fn prepare(
    actors: &mut SlotMap<ActorId, PhysicsActor>,
    manifolds: &mut ManifoldMap,
    config: &PhysicsConfig,
    step: u64,
) {
    for manifold in manifolds.values_mut().filter(|m| is_solvable(m, step)) {
        let normal = manifold.normal;
        let restitution = manifold.restitution;
        let mut a = body(actors, manifold.actor_a());
        let mut b = body(actors, manifold.actor_b());

        for point in &mut manifold.points {
            let approach = (b.velocity - a.velocity).dot(&normal);
            point.velocity_bias = if -approach > config.restitution_threshold {
                -restitution * approach
            } else {
                0.0
            };

            if config.warm_starting {
                // drop the part of the cached friction that no longer lies in the contact plane
                point.tangent_impulse -= normal * point.tangent_impulse.dot(&normal);
                let impulse = normal * point.normal_impulse + point.tangent_impulse;
                a.velocity -= impulse * a.inverse_mass;
                b.velocity += impulse * b.inverse_mass;
            } else {
                point.normal_impulse = 0.0;
                point.tangent_impulse = Vec3::zeros();
            }
        }

        store_velocity(actors, manifold.actor_a(), a.velocity);
        store_velocity(actors, manifold.actor_b(), b.velocity);
    }
}

/// One velocity pass over every solvable manifold
pub(crate) fn solve_velocities(
    actors: &mut SlotMap<ActorId, PhysicsActor>,
    manifolds: &mut ManifoldMap,
    step: u64,
) {
    for manifold in manifolds.values_mut().filter(|m| is_solvable(m, step)) {
        let normal = manifold.normal;
        let friction = manifold.friction;
        let mut a = body(actors, manifold.actor_a());
        let mut b = body(actors, manifold.actor_b());
        let inverse_mass_sum = a.inverse_mass + b.inverse_mass;
        if inverse_mass_sum <= 0.0 {
            continue;
        }

        for point in &mut manifold.points {
            // friction, bounded by the normal impulse accumulated so far
            let relative = b.velocity - a.velocity;
            let tangential = relative - normal * relative.dot(&normal);
            if let Some(tangent) = utils::try_normalize(&tangential) {
                let lambda = -relative.dot(&tangent) / inverse_mass_sum;
                let max_friction = friction * point.normal_impulse;
                let previous = point.tangent_impulse;
                let mut accumulated = previous + tangent * lambda;
                let magnitude = accumulated.magnitude();
                if magnitude > max_friction {
                    accumulated *= max_friction / magnitude;
                }
                let applied = accumulated - previous;
                point.tangent_impulse = accumulated;
                a.velocity -= applied * a.inverse_mass;
                b.velocity += applied * b.inverse_mass;
            }

            // non-penetration, clamped so the accumulated impulse only pushes
            let approach = (b.velocity - a.velocity).dot(&normal);
            let lambda = (point.velocity_bias - approach) / inverse_mass_sum;
            let previous = point.normal_impulse;
            point.normal_impulse = (previous + lambda).max(0.0);
            let applied = normal * (point.normal_impulse - previous);
            a.velocity -= applied * a.inverse_mass;
            b.velocity += applied * b.inverse_mass;
        }

        store_velocity(actors, manifold.actor_a(), a.velocity);
        store_velocity(actors, manifold.actor_b(), b.velocity);
    }
}

/// One position pass: push overlapping pairs apart by a fraction of their
/// penetration beyond the slop
pub(crate) fn solve_positions(
    actors: &mut SlotMap<ActorId, PhysicsActor>,
    shapes: &SlotMap<ShapeId, PhysicsShape>,
    manifolds: &ManifoldMap,
    config: &PhysicsConfig,
    step: u64,
) {
    for manifold in manifolds.values().filter(|m| is_solvable(m, step)) {
        let inverse_a = body(actors, manifold.actor_a()).inverse_mass;
        let inverse_b = body(actors, manifold.actor_b()).inverse_mass;
        let inverse_mass_sum = inverse_a + inverse_b;
        if inverse_mass_sum <= 0.0 {
            continue;
        }

        let (Some(world_a), Some(world_b)) = (
            current_world(shapes, actors, manifold.shape_a()),
            current_world(shapes, actors, manifold.shape_b()),
        ) else {
            continue;
        };
        let ContactTest::Touching(contact) = narrow_phase::collide(&world_a, &world_b, 1) else {
            continue;
        };

        let correction = (config.baumgarte * (-contact.min_separation() - config.linear_slop))
            .clamp(0.0, config.max_linear_correction);
        if correction <= 0.0 {
            continue;
        }
        let push = contact.normal * (correction / inverse_mass_sum);
        translate(actors, manifold.actor_a(), -push * inverse_a);
        translate(actors, manifold.actor_b(), push * inverse_b);
    }
}
