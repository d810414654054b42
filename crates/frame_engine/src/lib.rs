//! # Frame Engine
//!
//! A component-based game runtime core: a scene of game objects with a
//! transform hierarchy, rigid-body physics with cached contact manifolds, and
//! a player loop that runs component callbacks in a fixed per-frame order.
//!
//! ## Features
//!
//! - **Scene graph**: parent/child transforms with cached world matrices
//! - **Physics**: sphere and box colliders, sequential-impulse solver with
//!   friction, warm starting and sleeping
//! - **Contact events**: enter / stay / exit for collisions and triggers
//! - **Player loop**: Awake, Start, fixed-step accumulator, Update, LateUpdate
//!   and deferred destruction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let mut scene = Scene::new("Main");
//!         let ball = scene.create_object_at("Ball", Trs::from_position(Vec3::new(0.0, 5.0, 0.0)));
//!         scene.add_rigidbody(ball, RigidbodyDesc::default())?;
//!         scene.add_collider(ball, ColliderDesc::sphere(0.5))?;
//!         engine.load_scene(scene)?;
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(ApplicationConfig::new("My App"))?;
//!     engine.run(&mut MyApp, Some(600))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod foundation;
pub mod physics;
pub mod player_loop;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, EngineConfig, PhysicsConfig, TimeConfig},
        foundation::{
            collections::{ActorId, ComponentId, GameObjectId, ShapeId},
            math::{Quat, Trs, Vec3},
            time::Time,
        },
        physics::{
            ColliderDesc, ContactEvent, ContactPhase, Physics, PhysicsError, PhysicsMaterial, Ray,
            RaycastHit, RigidbodyDesc,
        },
        player_loop::{FrameStats, PlayerLoop},
        scene::{
            Behaviour, BehaviourContext, BehaviourError, BehaviourResult, Capabilities, Scene,
            SceneError, SceneManager,
        },
        AppError, Application, Engine, EngineError,
    };
}
