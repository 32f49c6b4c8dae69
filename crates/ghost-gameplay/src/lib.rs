//! # Ghost Gameplay
//!
//! Character controller for the Ghost platformer.
//!
//! This crate turns per-step input into motion for a single platformer
//! character and resolves it against host-supplied geometry:
//! - Input intents and edge tracking
//! - AABB obstacles, surfaces and sub-stepped collision resolution
//! - Jumps (ground, coyote, buffered, wall, double), wall slides, ground pound
//! - Hazard, collectible and checkpoint checks
//! - Controller events for the host to dispatch
//! - Tuning and level description files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod controller;
pub mod events;
pub mod input;
pub mod interaction;
pub mod level;
pub mod physics;
pub mod tuning;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::controller::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::interaction::*;
    pub use crate::level::*;
    pub use crate::physics::*;
    pub use crate::tuning::*;
}

pub use prelude::*;
