//! Core engine implementation

use crate::{
    application::{AppError, Application},
    core::config::{ApplicationConfig, Config, ConfigError},
    foundation::{logging, time::Time, time::Timer},
    physics::Physics,
    player_loop::{FrameStats, PlayerLoop},
    scene::{Scene, SceneError, SceneManager},
};
use thiserror::Error;

/// Main engine struct
///
/// The engine owns the subsystems of one running application: the scene
/// manager, the physics manager and the player loop. There is no global
/// state; everything is reached through the engine.
pub struct Engine {
    /// Active scene holder
    scene_manager: SceneManager,

    /// Rigid-body simulation
    physics: Physics,

    /// Frame scheduler and simulation clock
    player_loop: PlayerLoop,

    /// Engine configuration
    config: ApplicationConfig,

    /// Whether `run` should continue
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: ApplicationConfig) -> Result<Self, EngineError> {
        config.validate().map_err(ConfigError::Invalid)?;
        if config.engine.init_logging {
            logging::init_with_filter(&config.engine.log_filter);
        }
        log::info!("Initializing engine for '{}'...", config.engine.application_name);

        let physics = Physics::new(config.physics.clone());
        let player_loop = PlayerLoop::new(&config.time, config.engine.max_frame_delta);

        Ok(Self {
            scene_manager: SceneManager::new(),
            physics,
            player_loop,
            config,
            running: true,
        })
    }

    /// Create an engine from a `.toml` or `.ron` settings file
    pub fn from_config_file(path: &str) -> Result<Self, EngineError> {
        Self::new(ApplicationConfig::load_from_file(path)?)
    }

    /// Engine configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Scene manager
    pub fn scene_manager(&self) -> &SceneManager {
        &self.scene_manager
    }

    /// Active scene, if one is loaded
    pub fn active_scene(&self) -> Option<&Scene> {
        self.scene_manager.active_scene()
    }

    /// Mutable access to the active scene
    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene_manager.active_scene_mut()
    }

    /// Physics manager
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Mutable access to the physics manager
    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.physics
    }

    /// Active scene together with the physics manager, for code that needs both
    pub fn scene_and_physics_mut(&mut self) -> (Option<&mut Scene>, &mut Physics) {
        (self.scene_manager.active_scene_mut(), &mut self.physics)
    }

    /// Player loop
    pub fn player_loop(&self) -> &PlayerLoop {
        &self.player_loop
    }

    /// Simulation clock
    pub fn time(&self) -> &Time {
        self.player_loop.time()
    }

    /// Change the time scale
    pub fn set_time_scale(&mut self, scale: f32) {
        self.player_loop.set_time_scale(scale);
    }

    /// Replace the active scene, tearing down the previous one
    pub fn load_scene(&mut self, scene: Scene) -> Result<(), EngineError> {
        self.scene_manager
            .load_scene(scene, &mut self.physics, self.player_loop.time())?;
        Ok(())
    }

    /// Tear down the active scene
    pub fn unload_scene(&mut self) -> Result<Option<Scene>, EngineError> {
        Ok(self
            .scene_manager
            .unload_active(&mut self.physics, self.player_loop.time())?)
    }

    /// Advance one frame of `frame_delta` seconds without a render hook
    pub fn tick(&mut self, frame_delta: f32) -> Result<FrameStats, EngineError> {
        self.frame(frame_delta, |_, _| {})
    }

    /// Advance one frame, calling `render` after LateUpdate and destruction
    ///
    /// Without an active scene only the clock advances.
    pub fn frame<R>(&mut self, frame_delta: f32, render: R) -> Result<FrameStats, EngineError>
    where
        R: FnOnce(&Scene, &Time),
    {
        let Some(scene) = self.scene_manager.active_scene_mut() else {
            let mut empty = Scene::new("Empty");
            return Ok(self
                .player_loop
                .run_frame(&mut empty, &mut self.physics, frame_delta, render)?);
        };
        Ok(self
            .player_loop
            .run_frame(scene, &mut self.physics, frame_delta, render)?)
    }

    /// Run `app` for `frames` frames, or until [`quit`](Self::quit) with `None`
    ///
    /// Frame deltas come from a wall-clock [`Timer`].
    pub fn run<T: Application>(&mut self, app: &mut T, frames: Option<u64>) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::Application(format!("App initialization: {e}")))?;

        log::info!("Starting main loop...");
        self.running = true;
        let mut timer = Timer::new();
        let mut frame = 0_u64;

        let result = loop {
            if !self.running || frames.is_some_and(|limit| frame >= limit) {
                break Ok(());
            }
            timer.update();

            let mut render_error: Option<AppError> = None;
            let stats = match self.frame(timer.delta_time(), |scene, time| {
                if let Err(e) = app.render(scene, time) {
                    render_error = Some(e);
                }
            }) {
                Ok(stats) => stats,
                Err(e) => break Err(e),
            };
            if let Some(e) = render_error {
                break Err(EngineError::Application(format!("App render: {e}")));
            }
            if let Err(e) = app.on_frame_end(self, &stats) {
                break Err(EngineError::Application(format!("App frame end: {e}")));
            }
            frame += 1;
        };

        app.cleanup(self);
        log::info!("Engine shutdown complete after {frame} frames ({:.1} fps)", timer.average_fps());
        result
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// True until [`quit`](Self::quit) is called
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration could not be loaded or was invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene state is corrupt or an operation on it failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}
