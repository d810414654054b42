//! Collision geometry
//!
//! Value types for the narrow phase and the query surface: rays, spheres,
//! axis-aligned bounds and collider shapes in local and world space.

pub mod bounds;
pub mod primitives;
pub mod shape;

pub use bounds::Bounds;
pub use primitives::{Ray, Sphere};
pub use shape::{ColliderShape, WorldShape};
