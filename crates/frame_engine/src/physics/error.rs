//! Physics error types

use thiserror::Error;

/// Errors raised when registering or addressing physics objects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Shape with zero, negative or non-finite size
    #[error("Degenerate shape: {0}")]
    DegenerateShape(String),

    /// Non-kinematic body without positive finite mass
    #[error("Invalid mass {0}: dynamic bodies need a positive finite mass")]
    InvalidMass(f32),

    /// Friction or restitution outside the accepted range
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    /// Actor handle that is not registered
    #[error("Unknown physics actor")]
    UnknownActor,

    /// Shape handle that is not registered
    #[error("Unknown physics shape")]
    UnknownShape,
}
