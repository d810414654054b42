//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Handle types for the object and physics arenas
//! - Frame time bookkeeping
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
