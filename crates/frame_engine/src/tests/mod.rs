//! Cross-module scenarios
//!
//! Unit tests live next to the code they cover. These drive a whole scene
//! through the player loop, or several physics subsystems at once, and check
//! behaviour that only shows up when they run together.

mod physics_scenarios;
