//! Scene error types

use thiserror::Error;

use crate::foundation::collections::{ComponentId, GameObjectId};
use crate::physics::PhysicsError;

/// Errors raised by scene and hierarchy operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Handle of an object that does not exist in this scene
    #[error("Unknown game object {0:?}")]
    UnknownObject(GameObjectId),

    /// Handle of a component that does not exist in this scene
    #[error("Unknown component {0:?}")]
    UnknownComponent(ComponentId),

    /// Reparenting would make an object its own ancestor
    #[error("Cannot parent {child:?} under {parent:?}: the hierarchy would contain a cycle")]
    HierarchyCycle {
        /// Object being moved
        child: GameObjectId,
        /// Requested parent
        parent: GameObjectId,
    },

    /// An object already carries a rigidbody
    #[error("Game object {0:?} already has a rigidbody")]
    DuplicateRigidbody(GameObjectId),

    /// Parent/child links or physics handles disagree; the scene cannot be trusted
    #[error("Scene hierarchy corrupted: {0}")]
    HierarchyCorrupted(String),

    /// A physics description was rejected
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}
