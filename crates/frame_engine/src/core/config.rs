//! # Unified Configuration System
//!
//! All configuration structures for the engine, the frame clock and the
//! physics pipeline. Every struct is `#[serde(default)]`, so a config file only
//! needs the keys it overrides.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: application name, logging
//! - **Time Config**: fixed step length, catch-up cap, time scale
//! - **Physics Config**: gravity, solver iterations, correction and sleep tuning

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior: identification and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name reported in logs
    pub application_name: String,
    /// Whether `Engine::new` installs the `env_logger` backend
    pub init_logging: bool,
    /// Default log filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Upper bound on a single measured frame delta, in seconds
    pub max_frame_delta: f32,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            init_logging: false,
            log_filter: "info".to_string(),
            max_frame_delta: 0.25,
        }
    }

    /// Set log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Install the logger on engine creation
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Clamp measured frame deltas to `seconds`
    pub fn with_max_frame_delta(mut self, seconds: f32) -> Self {
        self.max_frame_delta = seconds;
        self
    }

    /// Validate engine settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_frame_delta > 0.0) {
            return Err(format!("max_frame_delta must be positive, got {}", self.max_frame_delta));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("Frame Engine Application")
    }
}

/// # Time Configuration
///
/// Controls how variable frame time is converted into fixed simulation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Length of one fixed step in seconds
    pub fixed_delta_time: f32,
    /// Most fixed steps run in a single frame; surplus time is dropped
    pub max_fixed_steps_per_frame: u32,
    /// Multiplier applied to frame deltas
    pub time_scale: f32,
}

impl TimeConfig {
    /// Set the fixed step length
    pub fn with_fixed_delta_time(mut self, seconds: f32) -> Self {
        self.fixed_delta_time = seconds;
        self
    }

    /// Set the catch-up cap
    pub fn with_max_fixed_steps(mut self, steps: u32) -> Self {
        self.max_fixed_steps_per_frame = steps;
        self
    }

    /// Set the time scale
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Validate time settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fixed_delta_time > 0.0) {
            return Err(format!("fixed_delta_time must be positive, got {}", self.fixed_delta_time));
        }
        if self.max_fixed_steps_per_frame == 0 {
            return Err("max_fixed_steps_per_frame must be at least 1".to_string());
        }
        if !(self.time_scale >= 0.0) {
            return Err(format!("time_scale must be non-negative, got {}", self.time_scale));
        }
        Ok(())
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            fixed_delta_time: 1.0 / 60.0,
            max_fixed_steps_per_frame: 8,
            time_scale: 1.0,
        }
    }
}

/// How two material coefficients are merged into one contact coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineRule {
    /// Arithmetic mean
    Average,
    /// Smaller of the two
    Minimum,
    /// Product
    Multiply,
    /// Larger of the two
    Maximum,
}

impl CombineRule {
    /// Merge two coefficients
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Average => 0.5 * (a + b),
            Self::Minimum => a.min(b),
            Self::Multiply => a * b,
            Self::Maximum => a.max(b),
        }
    }
}

/// Broad-phase algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadPhaseKind {
    /// Test every pair of proxies
    BruteForce,
    /// Sort proxies along x and only test overlapping intervals
    SweepAndPrune,
}

/// Hard ceiling on contact points per manifold
pub const MAX_CONTACT_POINTS: usize = 4;

/// # Physics Configuration
///
/// Solver and sleep tuning. Defaults are chosen to settle resting contact at
/// 60 Hz without visible jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration applied to non-kinematic bodies
    pub gravity: Vec3,
    /// Sequential-impulse passes per step
    pub velocity_iterations: u32,
    /// Position correction passes per step
    pub position_iterations: u32,
    /// Fraction of penetration beyond the slop removed per position pass
    pub baumgarte: f32,
    /// Penetration tolerated without correction
    pub linear_slop: f32,
    /// Largest positional correction per pass
    pub max_linear_correction: f32,
    /// Approach speed below which contacts do not bounce
    pub restitution_threshold: f32,
    /// Linear speed below which a body may fall asleep
    pub sleep_linear_velocity: f32,
    /// Angular speed below which a body may fall asleep
    pub sleep_angular_velocity: f32,
    /// Seconds a body must stay below the sleep thresholds
    pub time_to_sleep: f32,
    /// Seed the solver with last step's impulses
    pub warm_starting: bool,
    /// Friction combine rule
    pub friction_combine: CombineRule,
    /// Restitution combine rule
    pub restitution_combine: CombineRule,
    /// Broad-phase algorithm
    pub broad_phase: BroadPhaseKind,
    /// Contact points kept per manifold, at most [`MAX_CONTACT_POINTS`]
    pub max_contact_points: usize,
}

impl PhysicsConfig {
    /// Set gravity
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set solver iteration counts
    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    /// Set positional correction parameters
    pub fn with_correction(mut self, baumgarte: f32, linear_slop: f32) -> Self {
        self.baumgarte = baumgarte;
        self.linear_slop = linear_slop;
        self
    }

    /// Set sleep thresholds
    pub fn with_sleep(mut self, linear: f32, angular: f32, time_to_sleep: f32) -> Self {
        self.sleep_linear_velocity = linear;
        self.sleep_angular_velocity = angular;
        self.time_to_sleep = time_to_sleep;
        self
    }

    /// Select the broad phase
    pub fn with_broad_phase(mut self, kind: BroadPhaseKind) -> Self {
        self.broad_phase = kind;
        self
    }

    /// Toggle warm starting
    pub fn with_warm_starting(mut self, enabled: bool) -> Self {
        self.warm_starting = enabled;
        self
    }

    /// Set material combine rules
    pub fn with_combine_rules(mut self, friction: CombineRule, restitution: CombineRule) -> Self {
        self.friction_combine = friction;
        self.restitution_combine = restitution;
        self
    }

    /// Validate physics settings
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.iter().all(|c| c.is_finite()) {
            return Err("gravity must be finite".to_string());
        }
        if self.velocity_iterations == 0 {
            return Err("velocity_iterations must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(format!("baumgarte must be within [0, 1], got {}", self.baumgarte));
        }
        if !(self.linear_slop >= 0.0) || !(self.max_linear_correction > 0.0) {
            return Err("linear_slop must be >= 0 and max_linear_correction > 0".to_string());
        }
        if !(self.time_to_sleep >= 0.0) {
            return Err(format!("time_to_sleep must be non-negative, got {}", self.time_to_sleep));
        }
        if self.max_contact_points == 0 || self.max_contact_points > MAX_CONTACT_POINTS {
            return Err(format!(
                "max_contact_points must be within 1..={MAX_CONTACT_POINTS}, got {}",
                self.max_contact_points
            ));
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            velocity_iterations: 10,
            position_iterations: 4,
            baumgarte: 0.8,
            linear_slop: 0.005,
            max_linear_correction: 0.2,
            restitution_threshold: 1.0,
            sleep_linear_velocity: 0.05,
            sleep_angular_velocity: 0.05,
            time_to_sleep: 0.5,
            warm_starting: true,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Maximum,
            broad_phase: BroadPhaseKind::SweepAndPrune,
            max_contact_points: MAX_CONTACT_POINTS,
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Frame clock configuration
    pub time: TimeConfig,
    /// Physics configuration
    pub physics: PhysicsConfig,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            engine: EngineConfig::new(app_name),
            ..Default::default()
        }
    }

    /// Replace the time section
    pub fn with_time(mut self, time: TimeConfig) -> Self {
        self.time = time;
        self
    }

    /// Replace the physics section
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        self.time.validate()?;
        self.physics.validate()
    }
}

impl Config for ApplicationConfig {
    fn check(&self) -> Result<(), String> {
        self.validate()
    }
}
