//! Headless simulation runner.
//!
//! Drives one controller through a scene from scripted input at a fixed
//! timestep and reports how the run ended.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ghost_gameplay::{
    CharacterController, CharacterState, ControllerError, ControllerEvent, EventLog,
    InputIntents, Level, LoggedEvent, MovementState, Vec2,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::scene::Scene;
use crate::script::InputScript;
use crate::timing::FixedTimestep;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    /// The script ran out of input
    ScriptFinished,
    /// `max_frames` steps were taken
    FrameLimit,
    /// The last life was lost
    GameOver,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Controller steps taken
    pub frames: u64,
    /// Why the run stopped
    pub end: RunEnd,
    /// Final character position
    pub final_position: Vec2,
    /// Final movement mode
    pub final_state: MovementState,
    /// Lives left
    pub lives: u32,
    /// Lives lost
    pub deaths: u32,
    /// Collected value
    pub score: u64,
    /// Events recorded
    pub events: u64,
    /// Events dropped by a full log
    pub dropped_events: u64,
    /// Hash of the final character state
    pub state_hash: u64,
}

/// Hash of a character state, for determinism checks.
///
/// Floats are hashed by bit pattern so two runs only match if they are
/// bit-for-bit identical.
#[must_use]
pub fn state_hash(state: &CharacterState) -> u64 {
    let mut hasher = DefaultHasher::new();
    for value in [
        state.position.x,
        state.position.y,
        state.velocity.x,
        state.velocity.y,
        state.coyote_time,
        state.jump_buffer_time,
        state.wall_jump_cooldown,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    for flag in [
        state.on_floor,
        state.on_ice,
        state.on_sticky,
        state.can_double_jump,
        state.is_wall_sliding,
        state.is_ground_pounding,
        state.was_on_floor,
    ] {
        flag.hash(&mut hasher);
    }
    state.wall_slide_side.hash(&mut hasher);
    hasher.finish()
}

/// Owns everything a headless run needs.
#[derive(Debug)]
pub struct Runner {
    config: SimConfig,
    scene: Scene,
    ghost: CharacterController,
    timestep: FixedTimestep,
    log: EventLog,
    frame: u64,
    recorded: u64,
}

impl Runner {
    /// Set up a run of `level`. The config is validated.
    #[must_use]
    pub fn new(mut config: SimConfig, level: Level) -> Self {
        config.validate();
        let ghost = CharacterController::with_tuning(level.spawn, config.tuning.clone());
        let timestep =
            FixedTimestep::new(config.fixed_dt).with_max_updates(config.max_steps_per_frame);
        let log = EventLog::new(config.event_log_capacity);
        let scene = Scene::new(level, &config);

        info!(
            "Scene '{}' ready: {} obstacles, {} interactables, {} lives",
            scene.name(),
            scene.obstacles().len(),
            scene.interactables().len(),
            scene.lives()
        );

        Self {
            config,
            scene,
            ghost,
            timestep,
            log,
            frame: 0,
            recorded: 0,
        }
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The character.
    #[must_use]
    pub fn ghost(&self) -> &CharacterController {
        &self.ghost
    }

    /// Steps taken so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Take recorded events out of the log.
    pub fn drain_events(&mut self) -> Vec<LoggedEvent> {
        self.log.drain()
    }

    /// One controller step with `input`, then interactions, the kill plane
    /// and the scene update.
    pub fn step_frame(&mut self, input: &InputIntents) -> Result<(), ControllerError> {
        let dt = self.timestep.fixed_dt();

        let mut events = self.ghost.step(input, self.scene.obstacles(), dt)?;
        events.extend(self.ghost.check_interactions(self.scene.interactables()));
        if self.scene.below_kill_plane(&self.ghost) {
            debug!(frame = self.frame, "fell below kill plane");
            events.push(ControllerEvent::Damage);
        }

        self.recorded += events.len() as u64;
        self.log.extend(self.frame, self.ghost.entity_id(), &events);
        self.scene.apply(&mut self.ghost, &events);
        self.scene.advance(dt * 1000.0);
        self.frame += 1;
        Ok(())
    }

    /// Play `script` until it runs out, the frame limit is hit or the game
    /// is over.
    pub fn run(&mut self, script: &InputScript) -> Result<RunSummary, ControllerError> {
        let mut input = script.playback();

        let end = 'run: loop {
            let updates = self.timestep.accumulate(self.config.frame_delta);
            for _ in 0..updates {
                if self.scene.is_game_over() {
                    break 'run RunEnd::GameOver;
                }
                if self.frame >= self.config.max_frames {
                    break 'run RunEnd::FrameLimit;
                }
                let Some(intents) = input.next() else {
                    break 'run RunEnd::ScriptFinished;
                };
                self.step_frame(&intents)?;
            }
            if self.scene.is_game_over() {
                break RunEnd::GameOver;
            }
            if self.frame >= self.config.max_frames {
                break RunEnd::FrameLimit;
            }
        };

        let summary = self.summary(end);
        info!(
            "Run ended ({:?}) after {} frames: score {}, lives {}, state hash {:016x}",
            summary.end, summary.frames, summary.score, summary.lives, summary.state_hash
        );
        Ok(summary)
    }

    /// Snapshot of the run so far.
    #[must_use]
    pub fn summary(&self, end: RunEnd) -> RunSummary {
        let state = self.ghost.kinematics();
        RunSummary {
            frames: self.frame,
            end,
            final_position: state.position,
            final_state: self.ghost.state(),
            lives: self.scene.lives(),
            deaths: self.scene.deaths(),
            score: self.scene.score(),
            events: self.recorded,
            dropped_events: self.log.dropped(),
            state_hash: state_hash(state),
        }
    }
}
