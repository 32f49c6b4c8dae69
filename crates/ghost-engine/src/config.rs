//! Simulation configuration.
//!
//! Provides the file locations, timing, scene rules and controller tuning
//! for a headless run. Configuration can be loaded from and saved to a TOML
//! file.

use ghost_gameplay::ControllerTuning;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "ghost.toml";

/// Simulation configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Files ===
    /// Level description (RON)
    pub level_path: PathBuf,
    /// Scripted input (RON)
    pub script_path: PathBuf,
    /// Where to write the event log as JSON lines, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_path: Option<PathBuf>,

    // === Timing ===
    /// Controller step length in seconds
    pub fixed_dt: f32,
    /// Host frame length fed to the fixed-step accumulator
    pub frame_delta: f32,
    /// Stop after this many controller steps
    pub max_frames: u64,
    /// Most controller steps run for one host frame
    pub max_steps_per_frame: u32,

    // === Scene rules ===
    /// Lives at the start of a run
    pub starting_lives: u32,
    /// Delay between landing on a crumbling obstacle and its removal
    pub crumble_delay_ms: f32,
    /// Falling below this y costs a life
    pub kill_plane_y: f32,
    /// Undrained events kept by the event log
    pub event_log_capacity: usize,

    // === Controller ===
    /// Controller tuning
    pub tuning: ControllerTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            level_path: PathBuf::from("assets/levels/tutorial.ron"),
            script_path: PathBuf::from("assets/scripts/tutorial.ron"),
            events_path: None,

            fixed_dt: 1.0 / 60.0,
            frame_delta: 1.0 / 60.0,
            max_frames: 3600, // 1 minute at 60 Hz
            max_steps_per_frame: 10,

            starting_lives: 3,
            crumble_delay_ms: 500.0,
            kill_plane_y: 2000.0,
            event_log_capacity: 65_536,

            tuning: ControllerTuning::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from `ghost.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        // Timing
        if !self.fixed_dt.is_finite() {
            self.fixed_dt = defaults.fixed_dt;
        }
        self.fixed_dt = self.fixed_dt.clamp(0.001, 0.1);
        if !self.frame_delta.is_finite() {
            self.frame_delta = defaults.frame_delta;
        }
        self.frame_delta = self.frame_delta.clamp(0.001, 0.25);
        self.max_frames = self.max_frames.max(1);
        self.max_steps_per_frame = self.max_steps_per_frame.max(1);

        // Scene
        self.starting_lives = self.starting_lives.max(1);
        self.crumble_delay_ms = self.crumble_delay_ms.max(0.0);
        if !self.kill_plane_y.is_finite() {
            self.kill_plane_y = defaults.kill_plane_y;
        }
        self.event_log_capacity = self.event_log_capacity.max(1);

        self.tuning.validate();
    }
}
