//! # Core Engine Module
//!
//! Shared configuration for every subsystem. Each section is plain serde data
//! with `with_*` builders and a `validate` pass.

pub mod config;

pub use config::{
    ApplicationConfig, BroadPhaseKind, CombineRule, Config, ConfigError, EngineConfig,
    PhysicsConfig, TimeConfig,
};
