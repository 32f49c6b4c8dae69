//! Level description files.
//!
//! A level is the spawn point plus the obstacles and interactables the host
//! hands to the controller. Levels are stored as RON.

use std::path::Path;

use ghost_common::{GhostResult, LevelError, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::input::Vec2;
use crate::interaction::Interactable;
use crate::physics::Obstacle;

/// A playable level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// File format version
    #[serde(default)]
    pub version: SchemaVersion,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Where the character starts and respawns without a checkpoint
    pub spawn: Vec2,
    /// Solid geometry
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Hazards, collectibles and checkpoints
    #[serde(default)]
    pub interactables: Vec<Interactable>,
}

impl Level {
    /// An empty level with the given spawn point.
    #[must_use]
    pub fn new(name: impl Into<String>, spawn: Vec2) -> Self {
        Self {
            version: SchemaVersion::LEVEL_FORMAT,
            name: name.into(),
            spawn,
            obstacles: Vec::new(),
            interactables: Vec::new(),
        }
    }

    /// Parse and validate a level from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self, LevelError> {
        let level: Self = ron::from_str(source).map_err(|e| LevelError::Parse(e.to_string()))?;
        level.validate()?;
        Ok(level)
    }

    /// Load and validate a level file.
    ///
    /// Read failures come back as [`GhostError::Io`](ghost_common::GhostError::Io),
    /// bad contents as [`GhostError::Level`](ghost_common::GhostError::Level).
    pub fn load_from(path: &Path) -> GhostResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let level = Self::from_ron_str(&source)?;
        info!(
            "Loaded level '{}' from {:?} ({} obstacles, {} interactables)",
            level.name,
            path,
            level.obstacles.len(),
            level.interactables.len()
        );
        Ok(level)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, LevelError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LevelError::Parse(e.to_string()))
    }

    /// Check that the level is usable.
    ///
    /// Malformed obstacles and interactables are allowed; the controller
    /// skips them at run time.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !SchemaVersion::LEVEL_FORMAT.can_read(&self.version) {
            return Err(LevelError::Invalid(format!(
                "unsupported level version {} (reader is {})",
                self.version,
                SchemaVersion::LEVEL_FORMAT
            )));
        }
        if !self.spawn.is_finite() {
            return Err(LevelError::Invalid(format!(
                "spawn ({}, {}) is not finite",
                self.spawn.x, self.spawn.y
            )));
        }

        let skipped = self.obstacles.iter().filter(|o| o.bounds().is_none()).count();
        if skipped > 0 {
            debug!("Level '{}' has {skipped} malformed obstacles", self.name);
        }
        Ok(())
    }
}
