//! # Ghost Engine
//!
//! Headless host for the Ghost character controller.
//!
//! This crate owns everything outside the controller itself:
//! - Config: simulation settings and tuning from `ghost.toml`
//! - Timing: fixed timestep accumulation
//! - Script: recorded input played back frame by frame
//! - Scene: lives, score, checkpoints and crumbling platforms
//! - Runner: ties them together and summarizes a run

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod runner;
pub mod scene;
pub mod script;
pub mod timing;

pub use config::SimConfig;
pub use runner::{state_hash, RunEnd, RunSummary, Runner};
pub use scene::{PendingCrumble, Scene};
pub use script::{InputScript, ScriptFrame, ScriptPlayback};
pub use timing::FixedTimestep;
