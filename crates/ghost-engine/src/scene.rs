//! Scene state owned by the host.
//!
//! The controller only reports events. The scene turns them into lives,
//! score, respawns and crumbling platforms, and owns the obstacle and
//! interactable lists handed to the controller each step.

use ghost_gameplay::{
    CharacterController, ControllerEvent, Interactable, Level, Obstacle, Vec2,
};
use tracing::{debug, info, warn};

use crate::config::SimConfig;

/// A crumbling obstacle waiting to be removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCrumble {
    /// Index into the scene's obstacles
    pub obstacle: usize,
    /// Time left before removal (ms)
    pub remaining_ms: f32,
}

/// Host-side game state for one level.
#[derive(Debug, Clone)]
pub struct Scene {
    name: String,
    spawn: Vec2,
    obstacles: Vec<Obstacle>,
    interactables: Vec<Interactable>,
    checkpoint: Option<Vec2>,
    pending_crumbles: Vec<PendingCrumble>,
    lives: u32,
    deaths: u32,
    score: u64,
    game_over: bool,
    crumble_delay_ms: f32,
    kill_plane_y: f32,
}

impl Scene {
    /// Build a scene from a level and the scene rules in `config`.
    #[must_use]
    pub fn new(level: Level, config: &SimConfig) -> Self {
        Self {
            name: level.name,
            spawn: level.spawn,
            obstacles: level.obstacles,
            interactables: level.interactables,
            checkpoint: None,
            pending_crumbles: Vec::new(),
            lives: config.starting_lives,
            deaths: 0,
            score: 0,
            game_over: false,
            crumble_delay_ms: config.crumble_delay_ms,
            kill_plane_y: config.kill_plane_y,
        }
    }

    /// Level name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Solid geometry for the next step.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Remaining interactables.
    #[must_use]
    pub fn interactables(&self) -> &[Interactable] {
        &self.interactables
    }

    /// Active checkpoint, or the level spawn.
    #[must_use]
    pub fn respawn_point(&self) -> Vec2 {
        self.checkpoint.unwrap_or(self.spawn)
    }

    /// Most recently reached checkpoint.
    #[must_use]
    pub fn checkpoint(&self) -> Option<Vec2> {
        self.checkpoint
    }

    /// Crumbles waiting to happen.
    #[must_use]
    pub fn pending_crumbles(&self) -> &[PendingCrumble] {
        &self.pending_crumbles
    }

    /// Lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Lives lost so far.
    #[must_use]
    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Collected value.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Whether the last life has been lost.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Whether the character has fallen out of the level.
    #[must_use]
    pub fn below_kill_plane(&self, ghost: &CharacterController) -> bool {
        ghost.position().y > self.kill_plane_y
    }

    /// Apply one step's events.
    ///
    /// Indices in `Collect` and `CrumbleStart` refer to the lists as they
    /// were during that step. At most one life is lost per call.
    pub fn apply(&mut self, ghost: &mut CharacterController, events: &[ControllerEvent]) {
        let mut collected = Vec::new();
        let mut damaged = false;

        for event in events {
            match *event {
                ControllerEvent::Damage => damaged = true,
                ControllerEvent::Collect { item, value } => {
                    if !collected.contains(&item) {
                        collected.push(item);
                        self.score += u64::from(value);
                    }
                },
                ControllerEvent::Checkpoint { x, y } => {
                    info!("Checkpoint reached at ({x}, {y})");
                    self.checkpoint = Some(Vec2::new(x, y));
                },
                ControllerEvent::CrumbleStart { obstacle } => self.schedule_crumble(obstacle),
                _ => {},
            }
        }

        // Highest index first so earlier indices stay valid
        collected.sort_unstable_by(|a, b| b.cmp(a));
        for item in collected {
            if item < self.interactables.len() {
                self.interactables.remove(item);
            }
        }

        if damaged {
            self.lose_life(ghost);
        }
    }

    /// Count down pending crumbles and remove the obstacles whose time is
    /// up. Call between steps.
    pub fn advance(&mut self, elapsed_ms: f32) {
        for crumble in &mut self.pending_crumbles {
            crumble.remaining_ms -= elapsed_ms;
        }

        while let Some(pos) = self
            .pending_crumbles
            .iter()
            .position(|c| c.remaining_ms <= 0.0)
        {
            let removed = self.pending_crumbles.swap_remove(pos).obstacle;
            if removed >= self.obstacles.len() {
                continue;
            }
            self.obstacles.remove(removed);
            for crumble in &mut self.pending_crumbles {
                if crumble.obstacle > removed {
                    crumble.obstacle -= 1;
                }
            }
            debug!(obstacle = removed, "obstacle crumbled");
        }
    }

    fn schedule_crumble(&mut self, obstacle: usize) {
        if obstacle >= self.obstacles.len()
            || self.pending_crumbles.iter().any(|c| c.obstacle == obstacle)
        {
            return;
        }
        debug!(obstacle, delay_ms = self.crumble_delay_ms, "crumble scheduled");
        self.pending_crumbles.push(PendingCrumble {
            obstacle,
            remaining_ms: self.crumble_delay_ms,
        });
    }

    fn lose_life(&mut self, ghost: &mut CharacterController) {
        if self.game_over {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        self.deaths += 1;

        if self.lives == 0 {
            self.game_over = true;
            warn!("Game over after {} deaths", self.deaths);
            return;
        }

        let point = self.respawn_point();
        info!("Lost a life, {} left, respawning at ({}, {})", self.lives, point.x, point.y);
        ghost.respawn(point.x, point.y);
    }
}
