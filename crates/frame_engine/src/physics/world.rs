//! The physics simulation manager
//!
//! [`Physics`] owns every actor, shape and cached manifold. One call to
//! [`Physics::step`] advances the simulation by exactly one fixed step:
//!
//! 1. sync actor poses and world shapes from the owners' transforms
//! 2. integrate forces into velocities
//! 3. broad phase over swept bounds
//! 4. narrow phase, merging contacts into the manifold cache
//! 5. sequential-impulse velocity solve
//! 6. integrate velocities into poses
//! 7. position correction
//! 8. write poses back to the transforms
//! 9. diff the manifold cache into enter/stay/exit events
//! 10. sleep bookkeeping
//!
//! Removal of actors and shapes is synchronous and purges every manifold that
//! references them, so nothing dangles into the next step.

use crate::core::config::PhysicsConfig;
use crate::foundation::collections::{ActorId, GameObjectId, OrderedPair, ShapeId, SlotMap};
use crate::foundation::math::{utils, Pose, Trs, Vec3};
use crate::foundation::time::Stopwatch;

use super::actor::PhysicsActor;
use super::broad_phase::{self, BroadPhase, Proxy};
use super::collider::ColliderDesc;
use super::collision_layers::CollisionLayers;
use super::contact::ContactManifold;
use super::events::{ContactEvent, ContactPhase};
use super::narrow_phase::{self, ContactTest};
use super::physics_shape::PhysicsShape;
use super::rigidbody::RigidbodyDesc;
use super::solver::{self, ManifoldMap};
use super::PhysicsError;

/// Poses closer than this are considered unchanged when detecting teleports
const SYNC_TOLERANCE: f32 = 1.0e-5;

/// Read and write access to game object transforms
///
/// Implemented by `Scene`; physics never sees the hierarchy itself.
pub trait TransformAccess {
    /// World-space transform of `object`, or `None` if it no longer exists
    fn world_trs(&self, object: GameObjectId) -> Option<Trs>;

    /// Move `object` so its world position and rotation match `pose`
    fn set_world_pose(&mut self, object: GameObjectId, pose: &Pose);
}

/// Counters describing the most recent step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Step number, starting at 1
    pub step: u64,
    /// Bodies simulated this step
    pub awake_actors: usize,
    /// Bodies skipped because they sleep
    pub sleeping_actors: usize,
    /// Broad-phase proxies belonging to awake bodies
    pub broad_phase_proxies: usize,
    /// Pairs returned by the broad phase
    pub candidate_pairs: usize,
    /// Pairs that reached a shape test
    pub narrow_phase_tests: usize,
    /// Manifolds cached after the step
    pub manifolds: usize,
    /// Contact points produced this step
    pub contact_points: usize,
    /// Events emitted, counting each side separately
    pub events: usize,
    /// Contacts or bodies skipped for numerical reasons
    pub skipped_degenerate: usize,
    /// Wall-clock duration of the step
    pub step_micros: u64,
}

/// Rigid-body simulation manager
pub struct Physics {
    config: PhysicsConfig,
    actors: SlotMap<ActorId, PhysicsActor>,
    shapes: SlotMap<ShapeId, PhysicsShape>,
    manifolds: ManifoldMap,
    broad_phase: Box<dyn BroadPhase>,
    events: Vec<ContactEvent>,
    step_count: u64,
    stats: StepStats,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl Physics {
    /// Create an empty simulation
    pub fn new(config: PhysicsConfig) -> Self {
        let broad_phase = broad_phase::create(config.broad_phase);
        log::debug!("Physics created with {} broad phase", broad_phase.name());
        Self {
            config,
            actors: SlotMap::with_key(),
            shapes: SlotMap::with_key(),
            manifolds: ManifoldMap::new(),
            broad_phase,
            events: Vec::new(),
            step_count: 0,
            stats: StepStats::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Replace the configuration; the broad phase is rebuilt if its kind changed
    pub fn set_config(&mut self, config: PhysicsConfig) {
        if config.broad_phase != self.config.broad_phase {
            self.broad_phase = broad_phase::create(config.broad_phase);
        }
        self.config = config;
    }

    /// Change gravity and wake every body so the change takes effect
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        for actor in self.actors.values_mut() {
            actor.wake_up();
        }
    }

    // ------------------------------------------------------------------
    // Registration

    /// Admit a rigidbody; fails for non-kinematic bodies without positive mass
    pub fn register_rigidbody(
        &mut self,
        owner: GameObjectId,
        desc: RigidbodyDesc,
        pose: Pose,
    ) -> Result<ActorId, PhysicsError> {
        desc.validate()?;
        let id = self
            .actors
            .insert_with_key(|id| PhysicsActor::new(id, owner, desc, pose));
        log::debug!("Registered actor {id:?} for object {owner:?}");
        Ok(id)
    }

    /// Remove a rigidbody; its colliders stay registered as static colliders
    pub fn remove_actor(&mut self, id: ActorId) -> Result<(), PhysicsError> {
        let actor = self.actors.remove(id).ok_or(PhysicsError::UnknownActor)?;
        for shape_id in actor.shapes() {
            if let Some(shape) = self.shapes.get_mut(*shape_id) {
                shape.actor = None;
            }
        }
        self.purge_manifolds(|_, m| m.involves_actor(id));
        log::debug!("Removed actor {id:?}");
        Ok(())
    }

    /// Admit a collider, optionally attached to a body
    ///
    /// Degenerate shapes and out-of-range materials are rejected here so the
    /// step never sees them.
    pub fn register_collider(
        &mut self,
        owner: GameObjectId,
        desc: ColliderDesc,
        actor: Option<ActorId>,
        world: &Trs,
    ) -> Result<ShapeId, PhysicsError> {
        desc.validate()?;
        if let Some(actor) = actor {
            if !self.actors.contains_key(actor) {
                return Err(PhysicsError::UnknownActor);
            }
        }

        let world_shape = desc.shape.to_world(world);
        let id = self
            .shapes
            .insert_with_key(|id| PhysicsShape::new(id, owner, desc, actor, world_shape));
        if let Some(actor) = actor.and_then(|a| self.actors.get_mut(a)) {
            actor.shapes.push(id);
            actor.wake_up();
        }
        log::debug!("Registered shape {id:?} for object {owner:?} on actor {actor:?}");
        Ok(id)
    }

    /// Remove a collider and every manifold that references it
    pub fn remove_collider(&mut self, id: ShapeId) -> Result<(), PhysicsError> {
        let shape = self.shapes.remove(id).ok_or(PhysicsError::UnknownShape)?;
        if let Some(actor) = shape.actor.and_then(|a| self.actors.get_mut(a)) {
            actor.shapes.retain(|s| *s != id);
            actor.wake_up();
        }
        self.purge_shape(id);
        log::debug!("Removed shape {id:?}");
        Ok(())
    }

    /// Move a collider to another body, or make it static with `None`
    pub fn attach_collider(&mut self, id: ShapeId, actor: Option<ActorId>) -> Result<(), PhysicsError> {
        if let Some(actor) = actor {
            if !self.actors.contains_key(actor) {
                return Err(PhysicsError::UnknownActor);
            }
        }
        let shape = self.shapes.get_mut(id).ok_or(PhysicsError::UnknownShape)?;
        let previous = std::mem::replace(&mut shape.actor, actor);
        if previous == actor {
            return Ok(());
        }
        if let Some(old) = previous.and_then(|a| self.actors.get_mut(a)) {
            old.shapes.retain(|s| *s != id);
            old.wake_up();
        }
        if let Some(new) = actor.and_then(|a| self.actors.get_mut(a)) {
            new.shapes.push(id);
            new.wake_up();
        }
        self.purge_shape(id);
        Ok(())
    }

    fn purge_shape(&mut self, id: ShapeId) {
        self.purge_manifolds(|pair, _| pair.contains(id));
    }

    /// Drop the manifolds matching `doomed` and wake the bodies they held
    ///
    /// A body resting on a removed collider has no other reason to wake up.
    fn purge_manifolds<F>(&mut self, doomed: F)
    where
        F: Fn(&OrderedPair<ShapeId>, &ContactManifold) -> bool,
    {
        let mut touched = Vec::new();
        self.manifolds.retain(|pair, manifold| {
            let purge = doomed(pair, manifold);
            if purge {
                touched.extend([manifold.actor_a(), manifold.actor_b()].into_iter().flatten());
            }
            !purge
        });
        for id in touched {
            if let Some(actor) = self.actors.get_mut(id) {
                actor.wake_up();
            }
        }
    }

    /// Register a handler for collision events on `shape`
    pub fn add_collide_handler<F>(&mut self, shape: ShapeId, handler: F) -> Result<(), PhysicsError>
    where
        F: FnMut(&ContactEvent) + 'static,
    {
        let shape = self.shapes.get_mut(shape).ok_or(PhysicsError::UnknownShape)?;
        shape.add_collide(Box::new(handler));
        Ok(())
    }

    /// Register a handler for trigger events on `shape`
    pub fn add_trigger_handler<F>(&mut self, shape: ShapeId, handler: F) -> Result<(), PhysicsError>
    where
        F: FnMut(&ContactEvent) + 'static,
    {
        let shape = self.shapes.get_mut(shape).ok_or(PhysicsError::UnknownShape)?;
        shape.add_trigger(Box::new(handler));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Access

    /// Look up an actor
    pub fn actor(&self, id: ActorId) -> Option<&PhysicsActor> {
        self.actors.get(id)
    }

    /// Look up a shape
    pub fn shape(&self, id: ShapeId) -> Option<&PhysicsShape> {
        self.shapes.get(id)
    }

    /// All actors in canonical order
    pub fn actors(&self) -> impl Iterator<Item = &PhysicsActor> {
        self.actors.values()
    }

    /// All shapes in canonical order
    pub fn shapes(&self) -> impl Iterator<Item = &PhysicsShape> {
        self.shapes.values()
    }

    /// Number of registered actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Number of registered shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Cached manifolds in canonical pair order
    pub fn manifolds(&self) -> impl Iterator<Item = &ContactManifold> {
        self.manifolds.values()
    }

    /// Cached manifold between two shapes, in either order
    pub fn manifold(&self, a: ShapeId, b: ShapeId) -> Option<&ContactManifold> {
        self.manifolds.get(&OrderedPair::new(a, b))
    }

    /// Statistics of the most recent step
    pub fn last_step_stats(&self) -> StepStats {
        self.stats
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Events of the most recent step
    pub fn events(&self) -> &[ContactEvent] {
        &self.events
    }

    /// Take the events of the most recent step
    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Body control

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut PhysicsActor, PhysicsError> {
        self.actors.get_mut(id).ok_or(PhysicsError::UnknownActor)
    }

    /// Linear velocity of a body
    pub fn velocity(&self, id: ActorId) -> Result<Vec3, PhysicsError> {
        self.actors.get(id).map(PhysicsActor::velocity).ok_or(PhysicsError::UnknownActor)
    }

    /// Set linear velocity; wakes the body
    pub fn set_velocity(&mut self, id: ActorId, velocity: Vec3) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.set_velocity(velocity);
        Ok(())
    }

    /// Set angular velocity; wakes the body
    pub fn set_angular_velocity(&mut self, id: ActorId, angular_velocity: Vec3) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.set_angular_velocity(angular_velocity);
        Ok(())
    }

    /// Accumulate a force applied during the next step
    pub fn add_force(&mut self, id: ActorId, force: Vec3) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.add_force(force);
        Ok(())
    }

    /// Apply an instantaneous change in momentum at the next step
    pub fn add_impulse(&mut self, id: ActorId, impulse: Vec3) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.add_impulse(impulse);
        Ok(())
    }

    /// Teleport a body; the transform follows at the end of the next step
    pub fn move_position(&mut self, id: ActorId, position: Vec3) -> Result<(), PhysicsError> {
        let actor = self.actor_mut(id)?;
        let pose = Pose {
            position,
            rotation: actor.pose.rotation,
        };
        actor.move_to(pose);
        Ok(())
    }

    /// Wake a sleeping body
    pub fn wake_up(&mut self, id: ActorId) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.wake_up();
        Ok(())
    }

    /// Force a body to sleep
    pub fn sleep(&mut self, id: ActorId) -> Result<(), PhysicsError> {
        self.actor_mut(id)?.put_to_sleep();
        Ok(())
    }

    /// Whether a body is sleeping
    pub fn is_sleeping(&self, id: ActorId) -> Result<bool, PhysicsError> {
        self.actors.get(id).map(PhysicsActor::is_sleeping).ok_or(PhysicsError::UnknownActor)
    }

    // ------------------------------------------------------------------
    // Simulation

    /// Advance the simulation by one fixed step of `dt` seconds
    ///
    /// A non-positive `dt` leaves every body and transform untouched.
    pub fn step<T: TransformAccess + ?Sized>(&mut self, transforms: &mut T, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let stopwatch = Stopwatch::start_new();
        self.step_count += 1;
        let step = self.step_count;
        let mut stats = StepStats {
            step,
            ..Default::default()
        };

        self.sync_from_transforms(transforms);

        let gravity = self.config.gravity;
        for actor in self.actors.values_mut().filter(|a| !a.is_sleeping()) {
            actor.integrate_velocity(&gravity, dt);
        }

        let proxies = self.build_proxies(dt);
        stats.broad_phase_proxies = proxies.iter().filter(|p| p.active).count();
        let pairs = self.broad_phase.find_pairs(&proxies);
        stats.candidate_pairs = pairs.len();

        self.update_manifolds(&pairs, step, &mut stats);

        solver::prepare(&mut self.actors, &mut self.manifolds, &self.config, step);
        for _ in 0..self.config.velocity_iterations {
            solver::solve_velocities(&mut self.actors, &mut self.manifolds, step);
        }

        for actor in self.actors.values_mut().filter(|a| !a.is_sleeping()) {
            actor.integrate_position(dt);
        }
        for _ in 0..self.config.position_iterations {
            solver::solve_positions(&mut self.actors, &self.shapes, &self.manifolds, &self.config, step);
        }

        self.write_back(transforms, &mut stats);
        self.emit_events(step, &mut stats);
        self.update_sleep(step, dt);

        stats.awake_actors = self.actors.values().filter(|a| !a.is_sleeping()).count();
        stats.sleeping_actors = self.actors.len() - stats.awake_actors;
        stats.manifolds = self.manifolds.len();
        stats.step_micros = stopwatch.elapsed_micros();
        log::trace!("Physics step {step}: {stats:?}");
        self.stats = stats;
    }

    /// Pull external transform edits into the bodies and rebuild world shapes
    fn sync_from_transforms<T: TransformAccess + ?Sized>(&mut self, transforms: &T) {
        for actor in self.actors.values_mut() {
            let Some(trs) = transforms.world_trs(actor.owner()) else {
                debug_assert!(false, "actor {:?} outlived its game object", actor.id());
                log::error!("Actor {:?} has no game object; skipping sync", actor.id());
                continue;
            };
            let pose = Pose {
                position: trs.position,
                rotation: trs.rotation,
            };
            let moved = (pose.position - actor.synced_pose.position).magnitude() > SYNC_TOLERANCE
                || pose.rotation.angle_to(&actor.synced_pose.rotation) > SYNC_TOLERANCE;
            if moved {
                actor.sync_external(pose);
            }
        }

        let actors = &self.actors;
        for shape in self.shapes.values_mut() {
            let Some(trs) = transforms.world_trs(shape.owner()) else {
                continue;
            };
            shape.world = shape.desc().shape.to_world(&trs);
            shape.offset = match shape.actor.and_then(|a| actors.get(a)) {
                Some(actor) => {
                    // carry a pending move_position into this step's geometry
                    let pending = actor.pose.position - actor.synced_pose.position;
                    shape.world = shape.world.translated(&pending);
                    shape.world.center() - actor.pose.position
                }
                None => Vec3::zeros(),
            };
        }
    }

    fn build_proxies(&self, dt: f32) -> Vec<Proxy> {
        self.shapes
            .values()
            .map(|shape| {
                let awake = shape
                    .actor
                    .and_then(|a| self.actors.get(a))
                    .filter(|a| !a.is_sleeping());
                let bounds = shape.world.bounds();
                Proxy {
                    shape: shape.id(),
                    bounds: awake.map_or(bounds, |a| bounds.swept(&(a.velocity * dt))),
                    active: awake.is_some(),
                }
            })
            .collect()
    }

    fn update_manifolds(&mut self, pairs: &[OrderedPair<ShapeId>], step: u64, stats: &mut StepStats) {
        let Self {
            config,
            actors,
            shapes,
            manifolds,
            ..
        } = self;
        let wake_speed_squared = config.sleep_linear_velocity * config.sleep_linear_velocity;

        for pair in pairs {
            let (Some(a), Some(b)) = (shapes.get(pair.first()), shapes.get(pair.second())) else {
                debug_assert!(false, "broad phase returned an unknown shape");
                continue;
            };
            if a.actor.is_some() && a.actor == b.actor {
                continue;
            }
            let (da, db) = (a.desc(), b.desc());
            if !CollisionLayers::should_collide(da.layers, da.mask, db.layers, db.mask) {
                continue;
            }

            stats.narrow_phase_tests += 1;
            let test = narrow_phase::collide(&a.world, &b.world, config.max_contact_points);
            if matches!(test, ContactTest::Separated) {
                continue;
            }

            // a moving body wakes a sleeping one it touches
            for (sleeper, other) in [(a.actor, b.actor), (b.actor, a.actor)] {
                let other_moving = other
                    .and_then(|id| actors.get(id))
                    .is_some_and(|o| !o.is_sleeping() && o.velocity.magnitude_squared() > wake_speed_squared);
                if other_moving {
                    if let Some(sleeper) = sleeper.and_then(|id| actors.get_mut(id)) {
                        sleeper.wake_up();
                    }
                }
            }

            let manifold = manifolds.entry(*pair).or_insert_with(|| {
                ContactManifold::new(
                    *pair,
                    (a.actor, b.actor),
                    da.is_trigger || db.is_trigger,
                    config.friction_combine.combine(da.material.friction, db.material.friction),
                    config
                        .restitution_combine
                        .combine(da.material.restitution, db.material.restitution),
                    step,
                )
            });

            match test {
                ContactTest::Touching(contact) if !manifold.is_trigger => {
                    stats.contact_points += contact.points.len();
                    manifold.update(contact, step);
                }
                ContactTest::Touching(_) => manifold.touch_without_points(step),
                ContactTest::Degenerate => {
                    stats.skipped_degenerate += 1;
                    log::warn!("Degenerate contact between {:?} and {:?}; skipping its response", a.id(), b.id());
                    manifold.touch_without_points(step);
                }
                ContactTest::Separated => {}
            }
        }
    }

    fn write_back<T: TransformAccess + ?Sized>(&mut self, transforms: &mut T, stats: &mut StepStats) {
        for actor in self.actors.values_mut().filter(|a| !a.is_sleeping()) {
            if actor.sanitize() || !utils::is_finite(&actor.pose.position) {
                stats.skipped_degenerate += 1;
                log::warn!("Actor {:?} produced a non-finite state; restoring its last pose", actor.id());
                actor.pose = actor.synced_pose;
                actor.velocity = Vec3::zeros();
                actor.angular_velocity = Vec3::zeros();
            }

            transforms.set_world_pose(actor.owner(), &actor.pose);
            // re-read so rounding through the hierarchy is not mistaken for an edit
            if let Some(trs) = transforms.world_trs(actor.owner()) {
                actor.synced_pose = Pose {
                    position: trs.position,
                    rotation: trs.rotation,
                };
            }
        }

        let actors = &self.actors;
        for shape in self.shapes.values_mut() {
            if let Some(actor) = shape.actor.and_then(|a| actors.get(a)) {
                shape.world = shape.world.recentered(&(actor.pose.position + shape.offset));
            }
        }
    }

    fn is_awake(&self, actor: Option<ActorId>) -> bool {
        actor
            .and_then(|id| self.actors.get(id))
            .is_some_and(|a| !a.is_sleeping())
    }

    fn velocity_of(&self, actor: Option<ActorId>) -> Vec3 {
        actor
            .and_then(|id| self.actors.get(id))
            .map_or_else(Vec3::zeros, PhysicsActor::velocity)
    }

    fn emit_events(&mut self, step: u64, stats: &mut StepStats) {
        let mut events = Vec::new();
        let mut expired = Vec::new();

        for (key, manifold) in &self.manifolds {
            let phase = if manifold.touched_step == step {
                if manifold.is_new(step) {
                    ContactPhase::Enter
                } else {
                    ContactPhase::Stay
                }
            } else if self.is_awake(manifold.actor_a()) || self.is_awake(manifold.actor_b()) {
                expired.push(*key);
                ContactPhase::Exit
            } else {
                // both sides asleep or static: the pair is frozen, not separated
                continue;
            };

            let (Some(a), Some(b)) = (self.shapes.get(manifold.shape_a()), self.shapes.get(manifold.shape_b())) else {
                debug_assert!(false, "manifold outlived one of its shapes");
                expired.push(*key);
                continue;
            };
            let points = if manifold.is_trigger || phase == ContactPhase::Exit {
                Vec::new()
            } else {
                manifold.points.clone()
            };
            let relative = self.velocity_of(manifold.actor_b()) - self.velocity_of(manifold.actor_a());

            events.push(ContactEvent {
                phase,
                is_trigger: manifold.is_trigger,
                shape: a.id(),
                object: a.owner(),
                other_shape: b.id(),
                other_object: b.owner(),
                normal: manifold.normal,
                points: points.clone(),
                relative_velocity: relative,
            });
            events.push(ContactEvent {
                phase,
                is_trigger: manifold.is_trigger,
                shape: b.id(),
                object: b.owner(),
                other_shape: a.id(),
                other_object: a.owner(),
                normal: -manifold.normal,
                points,
                relative_velocity: -relative,
            });
        }

        for key in expired {
            self.manifolds.remove(&key);
        }

        for event in &events {
            if let Some(shape) = self.shapes.get_mut(event.shape) {
                shape.dispatch(event);
            }
        }
        stats.events = events.len();
        self.events = events;
    }

    fn update_sleep(&mut self, step: u64, dt: f32) {
        let Self {
            config,
            actors,
            manifolds,
            ..
        } = self;
        let tolerated = 2.0 * config.linear_slop;

        for manifold in manifolds.values().filter(|m| solver::is_solvable(m, step)) {
            if manifold.max_penetration() > tolerated {
                for id in [manifold.actor_a(), manifold.actor_b()].into_iter().flatten() {
                    if let Some(actor) = actors.get_mut(id) {
                        actor.wake_up();
                    }
                }
            }
        }

        for actor in actors.values_mut() {
            if actor.update_sleep(config, dt) {
                log::debug!("Actor {:?} fell asleep", actor.id());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use super::*;

    /// Flat transform store for exercising `Physics` without a scene
    #[derive(Default)]
    pub struct FlatTransforms {
        pub objects: SlotMap<GameObjectId, Trs>,
    }

    impl FlatTransforms {
        pub fn spawn(&mut self, position: Vec3) -> GameObjectId {
            self.objects.insert(Trs::from_position(position))
        }

        pub fn position(&self, id: GameObjectId) -> Vec3 {
            self.objects[id].position
        }

        pub fn snapshot(&self) -> HashMap<GameObjectId, Trs> {
            self.objects.iter().map(|(k, v)| (k, *v)).collect()
        }
    }

    impl TransformAccess for FlatTransforms {
        fn world_trs(&self, object: GameObjectId) -> Option<Trs> {
            self.objects.get(object).copied()
        }

        fn set_world_pose(&mut self, object: GameObjectId, pose: &Pose) {
            if let Some(trs) = self.objects.get_mut(object) {
                trs.position = pose.position;
                trs.rotation = pose.rotation;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FlatTransforms;
    use super::*;
    use crate::physics::ColliderShape;
    use approx::assert_relative_eq;

    fn no_gravity() -> PhysicsConfig {
        PhysicsConfig::default().with_gravity(Vec3::zeros())
    }

    #[test]
    fn test_registration_rejects_invalid_input() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::default();
        let owner = transforms.spawn(Vec3::zeros());

        assert_eq!(
            physics.register_rigidbody(owner, RigidbodyDesc::dynamic(0.0), Pose::default()),
            Err(PhysicsError::InvalidMass(0.0))
        );
        let degenerate = ColliderDesc::new(ColliderShape::cuboid(Vec3::new(1.0, -1.0, 1.0)));
        assert!(matches!(
            physics.register_collider(owner, degenerate, None, &Trs::identity()),
            Err(PhysicsError::DegenerateShape(_))
        ));
        assert_eq!(physics.actor_count(), 0);
        assert_eq!(physics.shape_count(), 0);
    }

    #[test]
    fn test_collider_with_removed_actor_is_rejected() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::default();
        let owner = transforms.spawn(Vec3::zeros());
        let actor = physics
            .register_rigidbody(owner, RigidbodyDesc::default(), Pose::default())
            .unwrap();
        physics.remove_actor(actor).unwrap();

        let result = physics.register_collider(owner, ColliderDesc::sphere(1.0), Some(actor), &Trs::identity());
        assert_eq!(result, Err(PhysicsError::UnknownActor));
        assert_eq!(physics.remove_actor(actor), Err(PhysicsError::UnknownActor));
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::default();
        let owner = transforms.spawn(Vec3::new(0.0, 5.0, 0.0));
        let actor = physics
            .register_rigidbody(owner, RigidbodyDesc::default(), Pose::from_position(Vec3::new(0.0, 5.0, 0.0)))
            .unwrap();

        physics.step(&mut transforms, 0.0);
        assert_eq!(physics.step_count(), 0);
        assert_relative_eq!(transforms.position(owner), Vec3::new(0.0, 5.0, 0.0));
        assert_relative_eq!(physics.velocity(actor).unwrap(), Vec3::zeros());
    }

    #[test]
    fn test_external_transform_edit_is_adopted() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let owner = transforms.spawn(Vec3::zeros());
        let actor = physics
            .register_rigidbody(owner, RigidbodyDesc::default(), Pose::default())
            .unwrap();

        transforms.objects[owner].position = Vec3::new(3.0, 0.0, 0.0);
        physics.step(&mut transforms, 1.0 / 60.0);
        assert_relative_eq!(physics.actor(actor).unwrap().pose().position, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_move_position_reaches_transform() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let owner = transforms.spawn(Vec3::zeros());
        let actor = physics
            .register_rigidbody(owner, RigidbodyDesc::default(), Pose::default())
            .unwrap();

        physics.move_position(actor, Vec3::new(0.0, 0.0, -4.0)).unwrap();
        physics.step(&mut transforms, 1.0 / 60.0);
        assert_relative_eq!(transforms.position(owner), Vec3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn test_shapes_on_one_body_never_pair() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let owner = transforms.spawn(Vec3::zeros());
        let actor = physics
            .register_rigidbody(owner, RigidbodyDesc::default(), Pose::default())
            .unwrap();
        physics
            .register_collider(owner, ColliderDesc::sphere(1.0), Some(actor), &Trs::identity())
            .unwrap();
        physics
            .register_collider(owner, ColliderDesc::cuboid(Vec3::repeat(1.0)), Some(actor), &Trs::identity())
            .unwrap();

        physics.step(&mut transforms, 1.0 / 60.0);
        assert_eq!(physics.last_step_stats().candidate_pairs, 1);
        assert_eq!(physics.last_step_stats().narrow_phase_tests, 0);
        assert_eq!(physics.manifolds().count(), 0);
    }

    #[test]
    fn test_layer_mask_filters_pairs() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let a = transforms.spawn(Vec3::zeros());
        let b = transforms.spawn(Vec3::new(0.5, 0.0, 0.0));
        let actor = physics
            .register_rigidbody(a, RigidbodyDesc::default(), Pose::default())
            .unwrap();
        let debris = ColliderDesc::sphere(1.0)
            .with_layers(CollisionLayers::DEBRIS, CollisionLayers::ENVIRONMENT);
        physics.register_collider(a, debris, Some(actor), &Trs::identity()).unwrap();
        physics
            .register_collider(b, ColliderDesc::sphere(1.0), None, &Trs::from_position(Vec3::new(0.5, 0.0, 0.0)))
            .unwrap();

        physics.step(&mut transforms, 1.0 / 60.0);
        assert_eq!(physics.manifolds().count(), 0);
        assert_relative_eq!(transforms.position(a), Vec3::zeros());
    }

    #[test]
    fn test_remove_collider_purges_manifolds() {
        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let a = transforms.spawn(Vec3::zeros());
        let b = transforms.spawn(Vec3::new(1.5, 0.0, 0.0));
        let actor = physics
            .register_rigidbody(a, RigidbodyDesc::default(), Pose::default())
            .unwrap();
        let sa = physics
            .register_collider(a, ColliderDesc::sphere(1.0), Some(actor), &Trs::identity())
            .unwrap();
        let sb = physics
            .register_collider(b, ColliderDesc::sphere(1.0), None, &Trs::from_position(Vec3::new(1.5, 0.0, 0.0)))
            .unwrap();

        physics.step(&mut transforms, 1.0 / 60.0);
        assert!(physics.manifold(sa, sb).is_some());

        physics.remove_collider(sb).unwrap();
        assert!(physics.manifold(sa, sb).is_none());
        assert_eq!(physics.manifolds().count(), 0);
    }

    #[test]
    fn test_handlers_see_each_event_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut transforms = FlatTransforms::default();
        let mut physics = Physics::new(no_gravity());
        let a = transforms.spawn(Vec3::zeros());
        let b = transforms.spawn(Vec3::new(1.0, 0.0, 0.0));
        let actor = physics
            .register_rigidbody(a, RigidbodyDesc::default(), Pose::default())
            .unwrap();
        let sensor = physics
            .register_collider(a, ColliderDesc::sphere(1.0), Some(actor), &Trs::identity())
            .unwrap();
        let zone = physics
            .register_collider(
                b,
                ColliderDesc::sphere(1.0).with_trigger(true),
                None,
                &Trs::from_position(Vec3::new(1.0, 0.0, 0.0)),
            )
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        physics
            .add_trigger_handler(zone, move |event| sink.borrow_mut().push(event.phase))
            .unwrap();
        let collisions = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&collisions);
        physics
            .add_collide_handler(sensor, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        physics.step(&mut transforms, 1.0 / 60.0);
        physics.step(&mut transforms, 1.0 / 60.0);
        physics.move_position(actor, Vec3::new(-10.0, 0.0, 0.0)).unwrap();
        physics.step(&mut transforms, 1.0 / 60.0);
        physics.step(&mut transforms, 1.0 / 60.0);

        assert_eq!(
            *seen.borrow(),
            vec![ContactPhase::Enter, ContactPhase::Stay, ContactPhase::Exit]
        );
        // trigger overlaps never reach collide handlers
        assert_eq!(*collisions.borrow(), 0);
        // a trigger overlap produces no contact response
        assert_relative_eq!(physics.velocity(actor).unwrap(), Vec3::zeros());
    }
}
