//! Scene management system
//!
//! Game objects, their transform hierarchy and their components live in a
//! [`Scene`]. The [`SceneManager`] owns the active scene and tears it down
//! when another one is loaded.
//!
//! ## Ownership
//!
//! ```text
//! SceneManager
//!      ↓ owns
//! Scene ── GameObject arena ── Transform (parent / children handles)
//!      └── Component arena ── Behaviour | Rigidbody | Collider
//! ```
//!
//! All cross references are slotmap handles. Removing an object is deferred
//! to the end of the frame and unregisters its physics entries
//! synchronously, so no handle is left pointing into freed state.

mod behaviour;
mod component;
mod error;
mod game_object;
mod lifecycle;
#[allow(clippy::module_inception)]
mod scene;
mod scene_manager;
mod transform;

pub use behaviour::{AsAny, Behaviour, BehaviourContext, BehaviourError, BehaviourResult, Capabilities};
pub use component::{Collider, Component, Rigidbody};
pub use error::SceneError;
pub use game_object::GameObject;
pub use lifecycle::DestroyReport;
pub use scene::Scene;
pub use scene_manager::SceneManager;
pub use transform::{axes, Transform};

pub(crate) use behaviour::{invoke, Hook};
pub(crate) use lifecycle::destroy_pending;
