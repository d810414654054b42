//! Application trait and lifecycle management

use crate::engine::{Engine, EngineError};
use crate::foundation::time::Time;
use crate::player_loop::FrameStats;
use crate::scene::{Scene, SceneError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive the engine from [`Engine::run`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the first frame. Build and load the initial scene
    /// here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Render hook
    ///
    /// Called once per frame after LateUpdate and the destroy queue, with the
    /// final transforms of the frame.
    fn render(&mut self, _scene: &Scene, _time: &Time) -> Result<(), AppError> {
        Ok(())
    }

    /// Called after every frame with its statistics
    fn on_frame_end(&mut self, _engine: &mut Engine, _stats: &FrameStats) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called when the main loop ends, whether or not it ended with an error.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene operation failed while setting up
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
