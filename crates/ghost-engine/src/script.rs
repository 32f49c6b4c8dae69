//! Scripted input for headless runs.
//!
//! A script is a list of held-button snapshots, each repeated for a number
//! of steps. Playback runs them through an [`InputTracker`] so jump and
//! ground pound presses become edge-triggered intents exactly as they would
//! from a keyboard.

use std::path::Path;

use ghost_common::{GhostError, GhostResult, SchemaVersion};
use ghost_gameplay::{InputIntents, InputTracker, RawButtons};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Buttons held for `repeat` consecutive steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFrame {
    /// Number of steps
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Buttons held during those steps
    #[serde(default)]
    pub held: RawButtons,
}

fn default_repeat() -> u32 {
    1
}

impl ScriptFrame {
    /// Hold `held` for `repeat` steps.
    #[must_use]
    pub const fn new(repeat: u32, held: RawButtons) -> Self {
        Self { repeat, held }
    }

    /// Nothing held for `repeat` steps.
    #[must_use]
    pub fn idle(repeat: u32) -> Self {
        Self::new(repeat, RawButtons::default())
    }
}

fn default_version() -> SchemaVersion {
    SchemaVersion::INPUT_SCRIPT
}

/// A recorded or hand-written input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    /// File format version
    #[serde(default = "default_version")]
    pub version: SchemaVersion,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Frames in playback order
    pub frames: Vec<ScriptFrame>,
}

impl InputScript {
    /// Create a script from frames.
    #[must_use]
    pub fn new(name: impl Into<String>, frames: Vec<ScriptFrame>) -> Self {
        Self {
            version: SchemaVersion::INPUT_SCRIPT,
            name: name.into(),
            frames,
        }
    }

    /// Parse a script from RON text.
    pub fn from_ron_str(source: &str) -> GhostResult<Self> {
        let script: Self =
            ron::from_str(source).map_err(|e| GhostError::Serialization(e.to_string()))?;

        if !SchemaVersion::INPUT_SCRIPT.can_read(&script.version) {
            return Err(GhostError::VersionMismatch {
                expected: SchemaVersion::INPUT_SCRIPT.to_string(),
                actual: script.version.to_string(),
            });
        }
        Ok(script)
    }

    /// Load a script file.
    pub fn load_from(path: &Path) -> GhostResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let script = Self::from_ron_str(&source)?;
        info!(
            "Loaded input script '{}' from {:?} ({} steps)",
            script.name,
            path,
            script.total_steps()
        );
        Ok(script)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> GhostResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GhostError::Serialization(e.to_string()))
    }

    /// Number of controller steps the script covers.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.repeat)).sum()
    }

    /// Start playback.
    #[must_use]
    pub fn playback(&self) -> ScriptPlayback<'_> {
        ScriptPlayback {
            frames: &self.frames,
            index: 0,
            remaining: self.frames.first().map_or(0, |f| f.repeat),
            tracker: InputTracker::new(),
        }
    }
}

/// Iterator over the per-step intents of a script.
#[derive(Debug, Clone)]
pub struct ScriptPlayback<'a> {
    frames: &'a [ScriptFrame],
    index: usize,
    remaining: u32,
    tracker: InputTracker,
}

impl Iterator for ScriptPlayback<'_> {
    type Item = InputIntents;

    fn next(&mut self) -> Option<Self::Item> {
        // Skip exhausted and zero-length frames
        while self.remaining == 0 {
            self.index += 1;
            self.remaining = self.frames.get(self.index)?.repeat;
        }
        let held = self.frames.get(self.index)?.held;
        self.remaining -= 1;
        Some(self.tracker.sample(held))
    }
}
