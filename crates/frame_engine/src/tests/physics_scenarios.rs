use approx::assert_relative_eq;

use crate::core::config::PhysicsConfig;
use crate::foundation::collections::{ActorId, GameObjectId, ShapeId};
use crate::foundation::math::{Pose, Trs, Vec3};
use crate::physics::test_support::FlatTransforms;
use crate::physics::{ColliderDesc, ContactPhase, Physics, PhysicsMaterial, RigidbodyDesc};

const DT: f32 = 1.0 / 60.0;

fn weightless() -> PhysicsConfig {
    PhysicsConfig::default().with_gravity(Vec3::zeros())
}

fn dynamic_sphere(
    physics: &mut Physics,
    transforms: &mut FlatTransforms,
    position: Vec3,
    radius: f32,
    material: PhysicsMaterial,
) -> (GameObjectId, ActorId, ShapeId) {
    let owner = transforms.spawn(position);
    let actor = physics
        .register_rigidbody(owner, RigidbodyDesc::default(), Pose::from_position(position))
        .unwrap();
    let shape = physics
        .register_collider(
            owner,
            ColliderDesc::sphere(radius).with_material(material),
            Some(actor),
            &Trs::from_position(position),
        )
        .unwrap();
    (owner, actor, shape)
}

fn static_sphere(physics: &mut Physics, transforms: &mut FlatTransforms, position: Vec3, radius: f32) -> ShapeId {
    let owner = transforms.spawn(position);
    physics
        .register_collider(owner, ColliderDesc::sphere(radius), None, &Trs::from_position(position))
        .unwrap()
}

/// Final position of a sphere dropped past a static one, with the two
/// colliders registered in the given order
fn glancing_drop(static_first: bool) -> Vec3 {
    let mut transforms = FlatTransforms::default();
    let mut physics = Physics::default();
    let obstacle = Vec3::new(0.2, 0.0, 0.0);
    let start = Vec3::new(0.0, 1.2, 0.0);

    let ball = if static_first {
        static_sphere(&mut physics, &mut transforms, obstacle, 0.5);
        dynamic_sphere(&mut physics, &mut transforms, start, 0.5, PhysicsMaterial::default()).0
    } else {
        let ball = dynamic_sphere(&mut physics, &mut transforms, start, 0.5, PhysicsMaterial::default()).0;
        static_sphere(&mut physics, &mut transforms, obstacle, 0.5);
        ball
    };

    for _ in 0..40 {
        physics.step(&mut transforms, DT);
    }
    transforms.position(ball)
}

#[test]
fn test_pair_order_does_not_change_the_outcome() {
    let a = glancing_drop(true);
    let b = glancing_drop(false);
    assert_relative_eq!(a, b, epsilon = 1.0e-4);
    // the ball was deflected away from the obstacle
    assert!(a.x < 0.0);
}

#[test]
fn test_pair_events_mirror_each_other() {
    let mut transforms = FlatTransforms::default();
    let mut physics = Physics::new(weightless());
    let (_, actor, moving) =
        dynamic_sphere(&mut physics, &mut transforms, Vec3::new(-0.9, 0.0, 0.0), 0.5, PhysicsMaterial::default());
    let resting = static_sphere(&mut physics, &mut transforms, Vec3::zeros(), 0.5);
    physics.set_velocity(actor, Vec3::new(1.0, 0.0, 0.0)).unwrap();

    physics.step(&mut transforms, DT);

    let forward = physics.manifold(moving, resting).unwrap();
    let backward = physics.manifold(resting, moving).unwrap();
    assert!(std::ptr::eq(forward, backward));

    let events = physics.events();
    assert_eq!(events.len(), 2);
    let (first, second) = (&events[0], &events[1]);
    assert_eq!(first.phase, ContactPhase::Enter);
    assert_eq!(first.phase, second.phase);
    assert_eq!((first.shape, first.other_shape), (second.other_shape, second.shape));
    assert_eq!((first.object, first.other_object), (second.other_object, second.object));
    assert_relative_eq!(first.normal, -second.normal);
    assert_relative_eq!(first.relative_velocity, -second.relative_velocity);

    // the normal points from the receiving collider towards the other one
    let from_moving = events.iter().find(|e| e.shape == moving).unwrap();
    assert!(from_moving.normal.x > 0.0);
}

#[test]
fn test_zero_step_leaves_contacts_untouched() {
    let mut transforms = FlatTransforms::default();
    let mut physics = Physics::default();
    let (ball, actor, shape) =
        dynamic_sphere(&mut physics, &mut transforms, Vec3::new(0.0, 0.95, 0.0), 0.5, PhysicsMaterial::default());
    let floor = static_sphere(&mut physics, &mut transforms, Vec3::zeros(), 0.5);
    physics.step(&mut transforms, DT);

    let contact = |physics: &Physics| {
        physics
            .manifold(shape, floor)
            .map(|m| (m.normal, m.points.clone()))
    };
    let manifold = contact(&physics);
    assert!(manifold.is_some());
    let velocity = physics.velocity(actor).unwrap();
    let position = transforms.position(ball);
    let steps = physics.step_count();

    physics.step(&mut transforms, 0.0);
    physics.step(&mut transforms, -DT);

    assert_eq!(physics.step_count(), steps);
    assert_eq!(contact(&physics), manifold);
    assert_eq!(physics.velocity(actor).unwrap(), velocity);
    assert_eq!(transforms.position(ball), position);
}

#[test]
fn test_elastic_head_on_collision_conserves_momentum_and_energy() {
    let mut transforms = FlatTransforms::default();
    let mut physics = Physics::new(weightless());
    let bouncy = PhysicsMaterial::new(0.0, 1.0);
    let (_, left, _) = dynamic_sphere(&mut physics, &mut transforms, Vec3::new(-0.99, 0.0, 0.0), 1.0, bouncy);
    let (_, right, _) = dynamic_sphere(&mut physics, &mut transforms, Vec3::new(0.99, 0.0, 0.0), 1.0, bouncy);
    physics.set_velocity(left, Vec3::new(2.0, 0.0, 0.0)).unwrap();
    physics.set_velocity(right, Vec3::new(-2.0, 0.0, 0.0)).unwrap();

    let energy = |physics: &Physics| {
        [left, right]
            .iter()
            .map(|id| 0.5 * physics.velocity(*id).unwrap().magnitude_squared())
            .sum::<f32>()
    };
    let initial_energy = energy(&physics);

    for _ in 0..10 {
        physics.step(&mut transforms, DT);
        let momentum = physics.velocity(left).unwrap() + physics.velocity(right).unwrap();
        assert_relative_eq!(momentum, Vec3::zeros(), epsilon = 1.0e-4);
        assert!(energy(&physics) <= initial_energy * 1.001);
    }

    // the spheres swapped velocities and are separating
    assert_relative_eq!(physics.velocity(left).unwrap(), Vec3::new(-2.0, 0.0, 0.0), epsilon = 1.0e-3);
    assert_relative_eq!(physics.velocity(right).unwrap(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1.0e-3);
}

#[test]
fn test_more_position_iterations_never_leave_more_overlap() {
    let remaining = |iterations: u32| {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(weightless().with_iterations(8, iterations));
        static_sphere(&mut physics, &mut transforms, Vec3::zeros(), 1.0);
        let (ball, _, _) =
            dynamic_sphere(&mut physics, &mut transforms, Vec3::new(1.5, 0.0, 0.0), 1.0, PhysicsMaterial::default());
        physics.step(&mut transforms, DT);
        2.0 - transforms.position(ball).x
    };

    let overlaps: Vec<f32> = [0, 1, 2, 4, 8].into_iter().map(remaining).collect();
    assert_relative_eq!(overlaps[0], 0.5, epsilon = 1.0e-5);
    for window in overlaps.windows(2) {
        assert!(window[1] <= window[0] + 1.0e-6, "overlap grew: {overlaps:?}");
    }
    assert!(overlaps[4] < overlaps[1]);
    // settles within twice the slop, never pushed apart past it
    assert!(overlaps[4] < 0.01, "overlap left: {overlaps:?}");
    assert!(overlaps[4] > 0.0);
}

#[test]
fn test_sleeping_bodies_leave_the_broad_phase() {
    let mut transforms = FlatTransforms::default();
    let mut physics = Physics::default();
    let owner = transforms.spawn(Vec3::new(0.0, 0.5, 0.0));
    let actor = physics
        .register_rigidbody(owner, RigidbodyDesc::default(), Pose::from_position(Vec3::new(0.0, 0.5, 0.0)))
        .unwrap();
    physics
        .register_collider(owner, ColliderDesc::sphere(0.5), Some(actor), &Trs::from_position(Vec3::new(0.0, 0.5, 0.0)))
        .unwrap();
    let ground = transforms.spawn(Vec3::new(0.0, -0.5, 0.0));
    physics
        .register_collider(
            ground,
            ColliderDesc::cuboid(Vec3::new(5.0, 0.5, 5.0)),
            None,
            &Trs::from_position(Vec3::new(0.0, -0.5, 0.0)),
        )
        .unwrap();

    physics.step(&mut transforms, DT);
    assert_eq!(physics.last_step_stats().broad_phase_proxies, 1);

    for _ in 0..120 {
        physics.step(&mut transforms, DT);
    }
    assert!(physics.is_sleeping(actor).unwrap());
    let stats = physics.last_step_stats();
    assert_eq!(stats.broad_phase_proxies, 0);
    assert_eq!(stats.candidate_pairs, 0);
    assert_eq!(stats.sleeping_actors, 1);
    // the resting contact is frozen, not reported as separated
    assert_eq!(physics.manifolds().count(), 1);
    assert!(physics.events().is_empty());

    physics.add_impulse(actor, Vec3::new(0.0, 3.0, 0.0)).unwrap();
    physics.step(&mut transforms, DT);
    assert!(!physics.is_sleeping(actor).unwrap());
    assert_eq!(physics.last_step_stats().broad_phase_proxies, 1);
}
