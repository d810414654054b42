//! Simulated rigid body state
//!
//! A [`PhysicsActor`] mirrors one Rigidbody component. Actors are addressed by
//! [`ActorId`], whose `Ord` is the canonical total order used to key actor
//! pairs and to fix iteration order.

use crate::core::config::PhysicsConfig;
use crate::foundation::collections::{ActorId, GameObjectId, ShapeId};
use crate::foundation::math::{utils, Pose, Quat, Vec3};

use super::rigidbody::RigidbodyDesc;

/// Dynamic state of one rigid body
#[derive(Debug, Clone)]
pub struct PhysicsActor {
    id: ActorId,
    owner: GameObjectId,
    desc: RigidbodyDesc,
    inverse_mass: f32,
    pub(crate) pose: Pose,
    /// Pose as last exchanged with the owner's transform
    pub(crate) synced_pose: Pose,
    pub(crate) velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    force: Vec3,
    pending_impulse: Vec3,
    sleeping: bool,
    sleep_timer: f32,
    pub(crate) shapes: Vec<ShapeId>,
}

impl PhysicsActor {
    pub(crate) fn new(id: ActorId, owner: GameObjectId, desc: RigidbodyDesc, pose: Pose) -> Self {
        Self {
            id,
            owner,
            inverse_mass: desc.inverse_mass(),
            desc,
            pose,
            synced_pose: pose,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            pending_impulse: Vec3::zeros(),
            sleeping: false,
            sleep_timer: 0.0,
            shapes: Vec::new(),
        }
    }

    /// Handle of this actor
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Game object carrying the Rigidbody
    pub fn owner(&self) -> GameObjectId {
        self.owner
    }

    /// Authored settings
    pub fn desc(&self) -> &RigidbodyDesc {
        &self.desc
    }

    /// Inverse mass; zero when kinematic
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// True if contacts can push this body
    pub fn is_dynamic(&self) -> bool {
        !self.desc.is_kinematic
    }

    /// World-space pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Linear velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Angular velocity in radians per second
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Colliders attached to this body
    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    /// True while excluded from simulation
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Strict ordering used to canonicalize actor pairs
    pub fn less(&self, other: &Self) -> bool {
        self.id < other.id
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.wake_up();
    }

    pub(crate) fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
        self.wake_up();
    }

    pub(crate) fn add_force(&mut self, force: Vec3) {
        self.force += force;
        self.wake_up();
    }

    pub(crate) fn add_impulse(&mut self, impulse: Vec3) {
        self.pending_impulse += impulse;
        self.wake_up();
    }

    /// Move without sweeping; the transform catches up on write-back
    pub(crate) fn move_to(&mut self, pose: Pose) {
        self.pose = pose;
        self.wake_up();
    }

    /// Adopt a pose that was set on the transform from outside the simulation
    pub(crate) fn sync_external(&mut self, pose: Pose) {
        self.pose = pose;
        self.synced_pose = pose;
        self.wake_up();
    }

    pub(crate) fn wake_up(&mut self) {
        if self.sleeping {
            log::trace!("Actor {:?} woke up", self.id);
        }
        self.sleeping = false;
        self.sleep_timer = 0.0;
    }

    pub(crate) fn put_to_sleep(&mut self) {
        self.sleeping = true;
        self.sleep_timer = 0.0;
        self.velocity = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
        self.force = Vec3::zeros();
        self.pending_impulse = Vec3::zeros();
    }

    /// Apply gravity, accumulated forces, impulses and damping to velocity
    pub(crate) fn integrate_velocity(&mut self, gravity: &Vec3, dt: f32) {
        if self.is_dynamic() {
            let mut acceleration = self.force * self.inverse_mass;
            if self.desc.use_gravity {
                acceleration += gravity * self.desc.gravity_scale;
            }
            self.velocity += acceleration * dt + self.pending_impulse * self.inverse_mass;
            self.velocity *= 1.0 / (1.0 + dt * self.desc.linear_damping);
            self.angular_velocity *= 1.0 / (1.0 + dt * self.desc.angular_damping);
        }
        self.force = Vec3::zeros();
        self.pending_impulse = Vec3::zeros();
    }

    /// Move the pose along the current velocities
    pub(crate) fn integrate_position(&mut self, dt: f32) {
        self.pose.position += self.velocity * dt;
        let spin = self.angular_velocity * dt;
        if spin.magnitude_squared() > 0.0 {
            self.pose.rotation = Quat::from_scaled_axis(spin) * self.pose.rotation;
        }
    }

    /// Zero out non-finite velocities; returns true if anything was reset
    pub(crate) fn sanitize(&mut self) -> bool {
        let mut reset = false;
        if !utils::is_finite(&self.velocity) {
            self.velocity = Vec3::zeros();
            reset = true;
        }
        if !utils::is_finite(&self.angular_velocity) {
            self.angular_velocity = Vec3::zeros();
            reset = true;
        }
        reset
    }

    /// Advance the sleep timer; returns true when the body falls asleep this step
    pub(crate) fn update_sleep(&mut self, config: &PhysicsConfig, dt: f32) -> bool {
        if self.sleeping || !self.is_dynamic() {
            return false;
        }
        let linear = config.sleep_linear_velocity;
        let angular = config.sleep_angular_velocity;
        let resting = self.velocity.magnitude_squared() <= linear * linear
            && self.angular_velocity.magnitude_squared() <= angular * angular;

        if resting {
            self.sleep_timer += dt;
        } else {
            self.sleep_timer = 0.0;
        }

        if resting && self.sleep_timer >= config.time_to_sleep {
            self.put_to_sleep();
            return true;
        }
        false
    }
}
