//! Physics module for collision detection and response
//!
//! Rigid bodies ([`PhysicsActor`]) and colliders ([`PhysicsShape`]) are owned
//! by the [`Physics`] manager. Each fixed step runs a broad phase, shape
//! specific narrow-phase tests, a cached manifold per touching pair, a
//! sequential-impulse solver and sleep bookkeeping, then writes the result
//! back to the game object transforms.

pub mod actor;
pub mod broad_phase;
pub mod collider;
pub mod collision;
pub mod collision_layers;
pub mod contact;
pub mod events;
pub mod narrow_phase;
pub mod physics_shape;
pub mod queries;
pub mod rigidbody;
mod error;
mod solver;
mod world;

pub use actor::PhysicsActor;
pub use broad_phase::{BroadPhase, BruteForce, Proxy, SweepAndPrune};
pub use collider::{ColliderDesc, PhysicsMaterial};
pub use collision::{Bounds, ColliderShape, Ray, Sphere, WorldShape};
pub use collision_layers::CollisionLayers;
pub use contact::{Contact, ContactManifold, ContactPoint};
pub use error::PhysicsError;
pub use events::{ContactEvent, ContactHandler, ContactPhase};
pub use physics_shape::PhysicsShape;
pub use queries::RaycastHit;
pub use rigidbody::RigidbodyDesc;
pub use world::{Physics, StepStats, TransformAccess};

#[cfg(test)]
pub(crate) use world::test_support;
