//! Character controller for the ghost.
//!
//! One controller owns one character's kinematic state and advances it a
//! step at a time: gravity, grace timers, wall slides, ground pounds, the
//! three jump kinds, surface-dependent running, then swept collision
//! against the host's obstacles. Everything that should affect the rest of
//! the game comes back as [`ControllerEvent`]s.

use ghost_common::EntityId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::events::{ControllerEvent, JumpKind};
use crate::input::{InputIntents, Vec2};
use crate::interaction::{self, Interactable, InteractableKind};
use crate::physics::{self, Body, Obstacle, SurfaceType, WallSide};
use crate::tuning::{ControllerTuning, SurfaceMovement};

/// Squash hint sent when a ground pound starts.
const POUND_START_SQUASH: (f32, f32) = (0.7, 1.3);
/// Squash hint sent when a ground pound lands.
const POUND_LAND_SQUASH: (f32, f32) = (1.4, 0.6);

/// Errors that can occur when stepping the controller.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ControllerError {
    /// The step length was zero, negative or not a number
    #[error("invalid delta time: {0} (must be finite and > 0)")]
    InvalidDeltaTime(f32),
}

/// Coarse movement mode, derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementState {
    /// Standing on something
    Grounded,
    /// In the air
    Airborne,
    /// Sliding down a wall
    WallSliding,
    /// Slamming downward
    GroundPounding,
}

/// Direction the character faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing left
    Left,
    /// Facing right (default)
    #[default]
    Right,
}

/// Kinematic state of one character.
///
/// Contact flags are recomputed every step. Timers are in milliseconds and
/// never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    /// Center of the collision box
    pub position: Vec2,
    /// Velocity in px/s
    pub velocity: Vec2,
    /// Standing on a floor
    pub on_floor: bool,
    /// Standing on ice
    pub on_ice: bool,
    /// Standing on a sticky surface
    pub on_sticky: bool,
    /// Double jump charge available
    pub can_double_jump: bool,
    /// Sliding down a wall
    pub is_wall_sliding: bool,
    /// Which wall, [`WallSide::None`] unless sliding
    pub wall_slide_side: WallSide,
    /// Ground pound in progress
    pub is_ground_pounding: bool,
    /// Remaining coyote window
    pub coyote_time: f32,
    /// Remaining jump buffer
    pub jump_buffer_time: f32,
    /// Remaining wall jump cooldown
    pub wall_jump_cooldown: f32,
    /// Floor flag lagged by one step, drives coyote decay
    pub was_on_floor: bool,
}

impl CharacterState {
    /// Fresh state at `position`: at rest, timers cleared, double jump ready.
    #[must_use]
    pub const fn spawn(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            on_floor: false,
            on_ice: false,
            on_sticky: false,
            can_double_jump: true,
            is_wall_sliding: false,
            wall_slide_side: WallSide::None,
            is_ground_pounding: false,
            coyote_time: 0.0,
            jump_buffer_time: 0.0,
            wall_jump_cooldown: 0.0,
            was_on_floor: false,
        }
    }

    /// The surface currently stood on, if any.
    #[must_use]
    pub fn standing_surface(&self) -> Option<SurfaceType> {
        if !self.on_floor {
            None
        } else if self.on_ice {
            Some(SurfaceType::Ice)
        } else if self.on_sticky {
            Some(SurfaceType::Sticky)
        } else {
            Some(SurfaceType::Normal)
        }
    }

    /// Coarse movement mode.
    #[must_use]
    pub fn movement_state(&self) -> MovementState {
        if self.is_ground_pounding {
            MovementState::GroundPounding
        } else if self.on_floor {
            MovementState::Grounded
        } else if self.is_wall_sliding {
            MovementState::WallSliding
        } else {
            MovementState::Airborne
        }
    }

    fn clear_contacts(&mut self) {
        self.on_floor = false;
        self.on_ice = false;
        self.on_sticky = false;
    }

    fn stand_on(&mut self, surface: SurfaceType) {
        self.on_floor = true;
        self.on_ice = surface == SurfaceType::Ice;
        self.on_sticky = surface == SurfaceType::Sticky;
        self.stop_wall_slide();
    }

    fn stop_wall_slide(&mut self) {
        self.is_wall_sliding = false;
        self.wall_slide_side = WallSide::None;
    }

    fn body(&self, tuning: &ControllerTuning) -> Body {
        Body {
            position: self.position,
            velocity: self.velocity,
            half_width: tuning.half_width,
            half_height: tuning.half_height,
        }
    }
}

/// The character controller.
#[derive(Debug, Clone)]
pub struct CharacterController {
    /// Unique entity ID
    entity_id: EntityId,
    /// Kinematic state
    state: CharacterState,
    /// Tuning constants
    tuning: ControllerTuning,
    /// Last nonzero horizontal input
    facing: Facing,
    /// Remaining hazard immunity (ms)
    invulnerable_time: f32,
    /// Most recently activated checkpoint
    last_checkpoint: Option<Vec2>,
    /// Mode reported after the previous step
    last_mode: MovementState,
}

impl CharacterController {
    /// Create a controller at `position` with the reference tuning.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self::with_tuning(position, ControllerTuning::default())
    }

    /// Create a controller with custom tuning. The tuning is validated.
    #[must_use]
    pub fn with_tuning(position: Vec2, mut tuning: ControllerTuning) -> Self {
        tuning.validate();
        let state = CharacterState::spawn(position);
        Self {
            entity_id: EntityId::new(),
            last_mode: state.movement_state(),
            state,
            tuning,
            facing: Facing::default(),
            invulnerable_time: 0.0,
            last_checkpoint: None,
        }
    }

    /// Get the controller's entity ID.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Full kinematic state.
    #[must_use]
    pub fn kinematics(&self) -> &CharacterState {
        &self.state
    }

    /// Current coarse movement mode.
    #[must_use]
    pub fn state(&self) -> MovementState {
        self.state.movement_state()
    }

    /// Center of the collision box.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    /// Teleport without touching any other state.
    pub fn set_position(&mut self, position: Vec2) {
        self.state.position = position;
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.state.velocity
    }

    /// Overwrite the velocity. Non-finite components become 0.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        self.state.velocity = Vec2::new(finite(velocity.x), finite(velocity.y));
    }

    /// Direction of the last nonzero horizontal input.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether a hazard would currently be ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_time > 0.0
    }

    /// Most recently activated checkpoint.
    #[must_use]
    pub fn last_checkpoint(&self) -> Option<Vec2> {
        self.last_checkpoint
    }

    /// Tuning in use.
    #[must_use]
    pub fn tuning(&self) -> &ControllerTuning {
        &self.tuning
    }

    /// Mutable tuning. Call [`ControllerTuning::validate`] after editing.
    pub fn tuning_mut(&mut self) -> &mut ControllerTuning {
        &mut self.tuning
    }

    /// Collision box at the current position.
    #[must_use]
    pub fn bounds(&self) -> physics::AABB {
        self.state.body(&self.tuning).aabb()
    }

    /// Put the character back at (x, y) at rest with every timer cleared and
    /// the double jump restored. The last checkpoint is kept.
    pub fn respawn(&mut self, x: f32, y: f32) {
        self.state = CharacterState::spawn(Vec2::new(x, y));
        self.invulnerable_time = 0.0;
        self.log_transition();
        debug!(entity = %self.entity_id, x, y, "respawned");
    }

    /// Advance the character by `dt` seconds.
    ///
    /// `obstacles` is only read during this call. Returns the events raised
    /// this step in the order they happened.
    pub fn step(
        &mut self,
        input: &InputIntents,
        obstacles: &[Obstacle],
        dt: f32,
    ) -> Result<Vec<ControllerEvent>, ControllerError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControllerError::InvalidDeltaTime(dt));
        }

        let tuning = &self.tuning;
        let state = &mut self.state;
        let elapsed = tuning.elapsed_ms(dt);
        let axis = input.horizontal_axis();
        let mut events = Vec::new();

        // Cooldowns
        state.wall_jump_cooldown = (state.wall_jump_cooldown - elapsed).max(0.0);
        self.invulnerable_time = (self.invulnerable_time - elapsed).max(0.0);

        // Gravity
        if !state.on_floor {
            state.velocity.y += tuning.gravity * dt;
            state.velocity.y = state.velocity.y.min(tuning.terminal_velocity);
        }

        // Floor-driven abilities and coyote time
        if state.on_floor {
            state.coyote_time = tuning.coyote_time_ms;
            state.was_on_floor = true;
            state.can_double_jump = true;
            state.is_ground_pounding = false;
        } else if state.was_on_floor {
            state.coyote_time = (state.coyote_time - elapsed).max(0.0);
            if state.coyote_time <= 0.0 {
                state.was_on_floor = false;
            }
        }

        // Jump buffer
        if input.jump_just_pressed {
            state.jump_buffer_time = tuning.jump_buffer_ms;
        } else {
            state.jump_buffer_time = (state.jump_buffer_time - elapsed).max(0.0);
        }

        // Wall slide
        let wall = physics::probe_wall(&state.body(tuning), obstacles, tuning);
        let pushing_into_wall = match wall {
            WallSide::Left => axis < 0.0,
            WallSide::Right => axis > 0.0,
            WallSide::None => false,
        };
        if !state.on_floor
            && pushing_into_wall
            && state.velocity.y > tuning.wall_slide_min_fall_speed
            && !state.is_ground_pounding
        {
            state.is_wall_sliding = true;
            state.wall_slide_side = wall;
            state.velocity.y = state.velocity.y.min(tuning.wall_slide_speed);
        } else {
            state.stop_wall_slide();
        }

        // Ground pound trigger
        if input.ground_pound_just_pressed && !state.on_floor && !state.is_ground_pounding {
            state.is_ground_pounding = true;
            state.velocity.y = tuning.ground_pound_velocity;
            state.can_double_jump = false;
            state.stop_wall_slide();
            events.push(ControllerEvent::GroundPoundStarted);
            events.push(ControllerEvent::Squash {
                scale_x: POUND_START_SQUASH.0,
                scale_y: POUND_START_SQUASH.1,
            });
        }

        // Jumps, at most one per step
        if state.jump_buffer_time > 0.0 && !state.is_ground_pounding {
            let fired = if state.on_floor || state.coyote_time > 0.0 {
                state.velocity.y = tuning.jump_velocity;
                state.coyote_time = 0.0;
                Some(JumpKind::Ground)
            } else if state.is_wall_sliding && state.wall_jump_cooldown <= 0.0 {
                let away = -f32::from(state.wall_slide_side.sign());
                state.velocity.x = away * tuning.wall_jump_velocity_x;
                state.velocity.y = tuning.wall_jump_velocity_y;
                state.can_double_jump = true;
                state.wall_jump_cooldown = tuning.wall_jump_cooldown_ms;
                state.stop_wall_slide();
                self.facing = if away > 0.0 { Facing::Right } else { Facing::Left };
                Some(JumpKind::Wall)
            } else if state.can_double_jump {
                state.velocity.y = tuning.double_jump_velocity;
                state.can_double_jump = false;
                Some(JumpKind::Double)
            } else {
                None
            };

            if let Some(kind) = fired {
                state.jump_buffer_time = 0.0;
                events.push(ControllerEvent::Jumped { kind });
            }
        }

        // Short hop when jump is released early
        if !input.jump_held
            && state.velocity.y < tuning.variable_jump_threshold
            && !state.is_ground_pounding
        {
            state.velocity.y *= tuning.variable_jump_damping;
        }

        // Horizontal control, suspended right after a wall jump
        if !state.is_ground_pounding && state.wall_jump_cooldown <= 0.0 {
            let profile = movement_profile(state, tuning);
            state.velocity.x = if axis == 0.0 {
                approach(state.velocity.x, 0.0, profile.friction * dt)
            } else {
                approach(
                    state.velocity.x,
                    axis * profile.max_speed,
                    profile.acceleration * dt,
                )
            };
            if axis < 0.0 {
                self.facing = Facing::Left;
            } else if axis > 0.0 {
                self.facing = Facing::Right;
            }
        }

        // Ground pound overrides vertical motion
        if state.is_ground_pounding {
            state.velocity.y = tuning.ground_pound_velocity;
            state.velocity.x *= tuning.ground_pound_horizontal_damping;
        }

        // Collision
        state.clear_contacts();
        let mut body = state.body(tuning);
        let contacts = physics::resolve_movement(&mut body, obstacles, tuning, dt);
        state.position = body.position;
        state.velocity = body.velocity;

        if contacts.bounced.is_some() {
            state.can_double_jump = true;
            state.is_ground_pounding = false;
            events.push(ControllerEvent::Bounce);
        }
        if let Some(floor) = contacts.floor {
            state.stand_on(floor.surface);
            events.push(ControllerEvent::Landed {
                surface: floor.surface,
            });
            if floor.surface == SurfaceType::Crumbling {
                events.push(ControllerEvent::CrumbleStart {
                    obstacle: floor.obstacle,
                });
            }
            if state.is_ground_pounding {
                state.is_ground_pounding = false;
                events.push(ControllerEvent::PoundLanded);
                events.push(ControllerEvent::Squash {
                    scale_x: POUND_LAND_SQUASH.0,
                    scale_y: POUND_LAND_SQUASH.1,
                });
            }
        }

        // Standing probe catches exact contact the sweep cannot see
        if !state.on_floor {
            if let Some(floor) = physics::probe_floor(&state.body(tuning), obstacles, tuning) {
                state.stand_on(floor.surface);
            }
        }

        trace!(
            entity = %self.entity_id,
            x = state.position.x,
            y = state.position.y,
            vx = state.velocity.x,
            vy = state.velocity.y,
            on_floor = state.on_floor,
            "step"
        );

        for event in &events {
            debug!(entity = %self.entity_id, event = event.name(), "controller event");
        }
        self.log_transition();

        Ok(events)
    }

    /// Test the character against hazards, collectibles and checkpoints.
    ///
    /// Meant to run after [`step`](Self::step). Damage is reported once per
    /// invulnerability window, a checkpoint only when it differs from the
    /// last one, and collectibles every call while in range.
    pub fn check_interactions(&mut self, items: &[Interactable]) -> Vec<ControllerEvent> {
        let bounds = self.bounds();
        let mut events = Vec::new();
        let mut hurt = false;

        for touch in interaction::scan(&bounds, items, self.tuning.collect_radius) {
            match touch.item.kind {
                InteractableKind::Hazard => {
                    if !hurt && !self.is_invulnerable() {
                        hurt = true;
                        self.invulnerable_time = self.tuning.invulnerability_ms;
                        events.push(ControllerEvent::Damage);
                    }
                },
                InteractableKind::Collectible { value } => {
                    events.push(ControllerEvent::Collect {
                        item: touch.index,
                        value,
                    });
                },
                InteractableKind::Checkpoint => {
                    let point = touch.item.center();
                    if self.last_checkpoint != Some(point) {
                        self.last_checkpoint = Some(point);
                        events.push(ControllerEvent::Checkpoint {
                            x: point.x,
                            y: point.y,
                        });
                    }
                },
            }
        }

        for event in &events {
            debug!(entity = %self.entity_id, event = event.name(), "interaction event");
        }
        events
    }

    fn log_transition(&mut self) {
        let mode = self.state.movement_state();
        if mode != self.last_mode {
            debug!(entity = %self.entity_id, from = ?self.last_mode, to = ?mode, "movement state");
            self.last_mode = mode;
        }
    }
}

fn movement_profile(state: &CharacterState, tuning: &ControllerTuning) -> SurfaceMovement {
    match state.standing_surface() {
        None => tuning.air,
        Some(SurfaceType::Ice) => tuning.ice,
        Some(SurfaceType::Sticky) => tuning.sticky,
        Some(_) => tuning.floor,
    }
}

/// Moves `current` toward `target` by at most `max_delta`.
fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if current < target {
        (current + max_delta).min(target)
    } else {
        (current - max_delta).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 0.016;

    /// 400 px wide floor whose top edge is at y = 100.
    fn floor(surface: SurfaceType) -> Obstacle {
        Obstacle::new(0.0, 110.0)
            .with_size(400.0, 20.0)
            .with_surface(surface)
    }

    /// Center y that rests on `floor` with the push-out gap.
    fn resting_y() -> f32 {
        let tuning = ControllerTuning::default();
        100.0 - tuning.half_height - tuning.push_out_bias
    }

    fn grounded_on(surface: SurfaceType) -> (CharacterController, Vec<Obstacle>) {
        let obstacles = vec![floor(surface)];
        let mut ghost = CharacterController::new(Vec2::new(0.0, resting_y()));
        ghost
            .step(&InputIntents::NONE, &obstacles, DT)
            .expect("valid dt");
        assert!(ghost.kinematics().on_floor);
        (ghost, obstacles)
    }

    fn run(ghost: &mut CharacterController, input: InputIntents, obstacles: &[Obstacle]) -> Vec<ControllerEvent> {
        ghost.step(&input, obstacles, DT).expect("valid dt")
    }

    #[test]
    fn test_spawn_defaults() {
        let ghost = CharacterController::new(Vec2::new(10.0, 20.0));
        let s = ghost.kinematics();
        assert_eq!(s.position, Vec2::new(10.0, 20.0));
        assert_eq!(s.velocity, Vec2::ZERO);
        assert!(s.can_double_jump);
        assert!(!s.on_floor);
        assert_eq!(s.wall_slide_side, WallSide::None);
        assert_eq!(ghost.state(), MovementState::Airborne);
        assert!(ghost.entity_id().is_valid());
    }

    #[test]
    fn test_invalid_delta_time_rejected() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        let before = *ghost.kinematics();

        for dt in [0.0, -0.016, f32::NAN, f32::INFINITY] {
            let result = ghost.step(&InputIntents::NONE, &[], dt);
            assert!(matches!(result, Err(ControllerError::InvalidDeltaTime(_))));
        }
        assert_eq!(*ghost.kinematics(), before);
    }

    #[test]
    fn test_free_fall_without_obstacles() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        for _ in 0..10 {
            run(&mut ghost, InputIntents::NONE, &[]);
            assert!(!ghost.kinematics().on_floor);
        }
        assert!(ghost.position().y > 0.0);
        assert!(ghost.velocity().y > 0.0);
    }

    #[test]
    fn test_terminal_velocity_clamp() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        for _ in 0..200 {
            run(&mut ghost, InputIntents::NONE, &[]);
        }
        assert_eq!(ghost.velocity().y, 600.0);
    }

    #[test]
    fn test_idempotent_rest() {
        let obstacles = [floor(SurfaceType::Normal)];
        let start = Vec2::new(0.0, 100.0 - 16.0);
        let mut ghost = CharacterController::new(start);

        for _ in 0..30 {
            run(&mut ghost, InputIntents::NONE, &obstacles);
            assert!(ghost.kinematics().on_floor);
            assert!((ghost.position().y - start.y).abs() <= 0.1 + 1e-3);
            assert_eq!(ghost.position().x, start.x);
        }
        assert_eq!(ghost.state(), MovementState::Grounded);
    }

    #[test]
    fn test_ground_jump() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Normal);

        let events = run(&mut ghost, InputIntents::new().jump(), &obstacles);

        assert!(events.contains(&ControllerEvent::Jumped {
            kind: JumpKind::Ground
        }));
        assert_eq!(ghost.velocity().y, -500.0);
        assert!(!ghost.kinematics().on_floor);
        assert!(ghost.kinematics().can_double_jump);
        assert_eq!(ghost.kinematics().jump_buffer_time, 0.0);
    }

    #[test]
    fn test_double_jump_consumed_once() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        run(&mut ghost, InputIntents::NONE, &[]);

        let events = run(&mut ghost, InputIntents::new().jump(), &[]);
        assert_eq!(
            events,
            vec![ControllerEvent::Jumped {
                kind: JumpKind::Double
            }]
        );
        assert!(!ghost.kinematics().can_double_jump);
        assert_eq!(ghost.velocity().y, -400.0);

        run(&mut ghost, InputIntents::NONE.hold_jump(), &[]);
        let vy_before = ghost.velocity().y;
        let events = run(&mut ghost, InputIntents::new().jump(), &[]);
        assert!(events.is_empty());
        assert!(ghost.velocity().y > vy_before);
        assert!(!ghost.kinematics().can_double_jump);
    }

    #[test]
    fn test_double_jump_restored_on_landing() {
        let obstacles = [floor(SurfaceType::Normal)];
        let mut ghost = CharacterController::new(Vec2::new(0.0, 40.0));
        run(&mut ghost, InputIntents::new().jump(), &obstacles);
        assert!(!ghost.kinematics().can_double_jump);

        for _ in 0..120 {
            run(&mut ghost, InputIntents::NONE, &obstacles);
            if ghost.kinematics().on_floor {
                break;
            }
        }
        assert!(ghost.kinematics().on_floor);

        run(&mut ghost, InputIntents::NONE, &obstacles);
        assert!(ghost.kinematics().can_double_jump);
    }

    #[test]
    fn test_coyote_jump_after_walking_off() {
        let obstacles = [floor(SurfaceType::Normal)];
        let mut ghost = CharacterController::new(Vec2::new(210.0, resting_y()));
        run(&mut ghost, InputIntents::NONE, &obstacles);
        assert!(ghost.kinematics().on_floor);

        for _ in 0..60 {
            run(&mut ghost, InputIntents::new().right(), &obstacles);
            if !ghost.kinematics().on_floor {
                break;
            }
        }
        assert!(!ghost.kinematics().on_floor);

        let events = run(&mut ghost, InputIntents::new().jump(), &obstacles);
        assert!(events.contains(&ControllerEvent::Jumped {
            kind: JumpKind::Ground
        }));
        assert!(ghost.kinematics().can_double_jump);
    }

    #[test]
    fn test_late_jump_is_double_jump() {
        let obstacles = [floor(SurfaceType::Normal)];
        let mut ghost = CharacterController::new(Vec2::new(0.0, resting_y()));
        run(&mut ghost, InputIntents::NONE, &obstacles);
        assert!(ghost.kinematics().on_floor);

        // Pull the floor away
        run(&mut ghost, InputIntents::NONE, &[]);
        assert!(!ghost.kinematics().on_floor);

        // 100 ms window at 16 ms per step
        for _ in 0..7 {
            run(&mut ghost, InputIntents::NONE, &[]);
        }
        assert_eq!(ghost.kinematics().coyote_time, 0.0);
        assert!(!ghost.kinematics().was_on_floor);

        let events = run(&mut ghost, InputIntents::new().jump(), &[]);
        assert!(events.contains(&ControllerEvent::Jumped {
            kind: JumpKind::Double
        }));
        assert_eq!(ghost.velocity().y, -400.0);
    }

    #[test]
    fn test_late_jump_without_charge_does_nothing() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        run(&mut ghost, InputIntents::new().jump(), &[]);
        run(&mut ghost, InputIntents::NONE, &[]);

        let events = run(&mut ghost, InputIntents::new().jump(), &[]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_jump_buffer_fires_on_landing() {
        let obstacles = [floor(SurfaceType::Normal)];
        // Feet 10 px above the floor, falling
        let mut ghost = CharacterController::new(Vec2::new(0.0, 74.0));
        ghost.set_velocity(Vec2::new(0.0, 300.0));
        run(&mut ghost, InputIntents::NONE, &obstacles);
        assert!(!ghost.kinematics().on_floor);

        // Use up the double jump so only a ground jump can fire
        ghost.state.can_double_jump = false;

        let mut jumped = false;
        let mut input = InputIntents::new().jump();
        for _ in 0..6 {
            let events = run(&mut ghost, input, &obstacles);
            input = InputIntents::NONE.hold_jump();
            if events.contains(&ControllerEvent::Jumped {
                kind: JumpKind::Ground,
            }) {
                jumped = true;
                break;
            }
        }
        assert!(jumped);
    }

    #[test]
    fn test_variable_jump_height() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Normal);
        run(&mut ghost, InputIntents::new().jump(), &obstacles);

        run(&mut ghost, InputIntents::NONE, &obstacles);

        let expected = (-500.0 + 1200.0 * DT) * 0.6;
        assert!((ghost.velocity().y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_held_jump_is_not_cut() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Normal);
        run(&mut ghost, InputIntents::new().jump(), &obstacles);

        run(&mut ghost, InputIntents::NONE.hold_jump(), &obstacles);

        assert!((ghost.velocity().y - (-500.0 + 1200.0 * DT)).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_scenario() {
        let pad = [floor(SurfaceType::Bouncy)];
        let mut ghost = CharacterController::new(Vec2::new(0.0, 0.0));
        run(&mut ghost, InputIntents::new().jump(), &[]);
        assert!(!ghost.kinematics().can_double_jump);

        // Feet 2 px above the pad
        ghost.set_position(Vec2::new(0.0, 82.0));
        ghost.set_velocity(Vec2::new(0.0, 300.0));
        let events = run(&mut ghost, InputIntents::NONE.hold_jump(), &pad);

        assert!(events.contains(&ControllerEvent::Bounce));
        assert_eq!(ghost.velocity().y, -800.0);
        assert!(ghost.kinematics().can_double_jump);
        assert!(!ghost.kinematics().on_floor);
    }

    #[test]
    fn test_wall_jump_from_left_wall() {
        // Right face of the wall at x = -10
        let wall = [Obstacle::new(-20.0, 0.0).with_size(20.0, 400.0)];
        // Left face of the body at -7, 3 px from the wall
        let mut ghost = CharacterController::new(Vec2::new(7.0, 0.0));
        ghost.set_velocity(Vec2::new(0.0, 200.0));

        run(&mut ghost, InputIntents::new().left(), &wall);
        assert!(ghost.kinematics().is_wall_sliding);
        assert_eq!(ghost.kinematics().wall_slide_side, WallSide::Left);
        assert_eq!(ghost.state(), MovementState::WallSliding);
        assert!(ghost.velocity().y <= 100.0);

        let events = run(&mut ghost, InputIntents::new().left().jump(), &wall);

        assert!(events.contains(&ControllerEvent::Jumped {
            kind: JumpKind::Wall
        }));
        assert!(ghost.velocity().x > 0.0);
        assert_eq!(ghost.velocity().y, -450.0);
        assert!(!ghost.kinematics().is_wall_sliding);
        assert_eq!(ghost.kinematics().wall_slide_side, WallSide::None);
        assert_eq!(ghost.kinematics().wall_jump_cooldown, 200.0);
        assert_eq!(ghost.facing(), Facing::Right);
    }

    #[test]
    fn test_wall_jump_waits_for_cooldown() {
        let wall = [Obstacle::new(-20.0, 0.0).with_size(20.0, 400.0)];
        let mut ghost = CharacterController::new(Vec2::new(7.0, 0.0));
        ghost.set_velocity(Vec2::new(0.0, 200.0));
        run(&mut ghost, InputIntents::new().left(), &wall);
        assert!(ghost.kinematics().is_wall_sliding);

        ghost.state.wall_jump_cooldown = 150.0;
        let vx_before = ghost.velocity().x;
        let events = run(&mut ghost, InputIntents::new().left().jump(), &wall);

        assert_eq!(
            events,
            vec![ControllerEvent::Jumped {
                kind: JumpKind::Double
            }]
        );
        assert_eq!(ghost.velocity().y, -400.0);
        assert_eq!(ghost.velocity().x, vx_before);
        assert!(!ghost.kinematics().can_double_jump);
        assert_eq!(ghost.kinematics().wall_jump_cooldown, 134.0);
    }

    #[test]
    fn test_input_ignored_during_wall_jump_cooldown() {
        let wall = [Obstacle::new(-20.0, 0.0).with_size(20.0, 400.0)];
        let mut ghost = CharacterController::new(Vec2::new(7.0, 0.0));
        ghost.set_velocity(Vec2::new(0.0, 200.0));
        run(&mut ghost, InputIntents::new().left(), &wall);
        run(&mut ghost, InputIntents::new().left().jump(), &wall);
        assert_eq!(ghost.velocity().x, 300.0);

        // 200 ms at 16 ms per step: 12 steps still inside the window
        for _ in 0..12 {
            run(&mut ghost, InputIntents::new().left().hold_jump(), &wall);
            assert!(ghost.kinematics().wall_jump_cooldown > 0.0);
            assert_eq!(ghost.velocity().x, 300.0);
            assert_eq!(ghost.facing(), Facing::Right);
        }

        run(&mut ghost, InputIntents::new().left().hold_jump(), &wall);
        assert_eq!(ghost.kinematics().wall_jump_cooldown, 0.0);
        assert!(ghost.velocity().x < 300.0);
        assert_eq!(ghost.facing(), Facing::Left);
    }

    #[test]
    fn test_wall_slide_needs_input_toward_wall() {
        let wall = [Obstacle::new(-20.0, 0.0).with_size(20.0, 400.0)];
        let mut ghost = CharacterController::new(Vec2::new(7.0, 0.0));
        ghost.set_velocity(Vec2::new(0.0, 200.0));

        run(&mut ghost, InputIntents::new().right(), &wall);

        assert!(!ghost.kinematics().is_wall_sliding);
        assert_eq!(ghost.kinematics().wall_slide_side, WallSide::None);
    }

    #[test]
    fn test_wall_slide_needs_falling() {
        let wall = [Obstacle::new(-20.0, 0.0).with_size(20.0, 400.0)];
        let mut ghost = CharacterController::new(Vec2::new(7.0, 0.0));
        ghost.set_velocity(Vec2::new(0.0, -300.0));

        run(&mut ghost, InputIntents::new().left(), &wall);

        assert!(!ghost.kinematics().is_wall_sliding);
    }

    #[test]
    fn test_ground_pound_cycle() {
        let obstacles = [floor(SurfaceType::Normal)];
        let mut ghost = CharacterController::new(Vec2::new(0.0, 0.0));

        let events = run(&mut ghost, InputIntents::new().ground_pound(), &obstacles);
        assert!(events.contains(&ControllerEvent::GroundPoundStarted));
        assert!(events
            .iter()
            .any(|e| matches!(e, ControllerEvent::Squash { .. })));
        assert_eq!(ghost.state(), MovementState::GroundPounding);
        assert_eq!(ghost.velocity().y, 600.0);
        assert!(!ghost.kinematics().can_double_jump);

        // Jumps are ignored while pounding
        let events = run(&mut ghost, InputIntents::new().jump(), &obstacles);
        assert!(!events
            .iter()
            .any(|e| matches!(e, ControllerEvent::Jumped { .. })));

        let mut landed = false;
        for _ in 0..30 {
            let events = run(&mut ghost, InputIntents::NONE, &obstacles);
            if events.contains(&ControllerEvent::PoundLanded) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(!ghost.kinematics().is_ground_pounding);
        assert!(ghost.kinematics().on_floor);
        assert_eq!(ghost.state(), MovementState::Grounded);
    }

    #[test]
    fn test_ground_pound_needs_air() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Normal);
        let events = run(&mut ghost, InputIntents::new().ground_pound(), &obstacles);
        assert!(events.is_empty());
        assert!(!ghost.kinematics().is_ground_pounding);
    }

    #[test]
    fn test_ground_pound_damps_horizontal() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        ghost.set_velocity(Vec2::new(200.0, 0.0));
        run(&mut ghost, InputIntents::new().ground_pound(), &[]);
        assert_eq!(ghost.velocity().x, 100.0);
    }

    #[test]
    fn test_surface_flags() {
        let (ghost, _) = grounded_on(SurfaceType::Ice);
        assert!(ghost.kinematics().on_floor && ghost.kinematics().on_ice);
        assert!(!ghost.kinematics().on_sticky);

        let (ghost, _) = grounded_on(SurfaceType::Sticky);
        assert!(ghost.kinematics().on_floor && ghost.kinematics().on_sticky);
        assert!(!ghost.kinematics().on_ice);

        let (ghost, _) = grounded_on(SurfaceType::Crumbling);
        assert_eq!(
            ghost.kinematics().standing_surface(),
            Some(SurfaceType::Normal)
        );
    }

    #[test]
    fn test_surface_acceleration() {
        let (mut on_floor, floor_obstacles) = grounded_on(SurfaceType::Normal);
        let (mut on_ice, ice_obstacles) = grounded_on(SurfaceType::Ice);

        run(&mut on_floor, InputIntents::new().right(), &floor_obstacles);
        run(&mut on_ice, InputIntents::new().right(), &ice_obstacles);

        assert!((on_floor.velocity().x - 1500.0 * DT).abs() < 1e-3);
        assert!((on_ice.velocity().x - 400.0 * DT).abs() < 1e-3);
        assert_eq!(on_ice.facing(), Facing::Right);
    }

    #[test]
    fn test_sticky_speed_cap() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Sticky);
        for _ in 0..60 {
            run(&mut ghost, InputIntents::new().left(), &obstacles);
        }
        assert_eq!(ghost.velocity().x, -120.0);
        assert_eq!(ghost.facing(), Facing::Left);
    }

    #[test]
    fn test_friction_stops_character() {
        let (mut ghost, obstacles) = grounded_on(SurfaceType::Normal);
        ghost.set_velocity(Vec2::new(200.0, 0.0));
        for _ in 0..20 {
            run(&mut ghost, InputIntents::NONE, &obstacles);
        }
        assert_eq!(ghost.velocity().x, 0.0);
    }

    #[test]
    fn test_crumbling_landing_event() {
        let obstacles = [
            Obstacle::new(500.0, 500.0),
            floor(SurfaceType::Crumbling),
        ];
        let mut ghost = CharacterController::new(Vec2::new(0.0, 80.0));
        ghost.set_velocity(Vec2::new(0.0, 300.0));

        let events = run(&mut ghost, InputIntents::NONE, &obstacles);

        assert!(events.contains(&ControllerEvent::CrumbleStart { obstacle: 1 }));
        assert!(events.contains(&ControllerEvent::Landed {
            surface: SurfaceType::Crumbling
        }));
    }

    #[test]
    fn test_tunneling_prevention() {
        for dt in [0.05_f32, 0.1, 0.25, 0.5, 1.0] {
            let travel = 600.0 * dt;
            let top = 16.0 + travel * 0.5;
            let sliver = [Obstacle::new(0.0, top + 0.5).with_size(200.0, 1.0)];
            let mut ghost = CharacterController::new(Vec2::ZERO);
            ghost.set_velocity(Vec2::new(0.0, 600.0));

            ghost
                .step(&InputIntents::NONE, &sliver, dt)
                .expect("valid dt");

            assert!(ghost.kinematics().on_floor, "dt {dt} passed through");
            assert!(ghost.bounds().max_y <= top, "dt {dt} ended inside");
        }
    }

    #[test]
    fn test_ceiling_hit_stops_rise() {
        let obstacles = [
            floor(SurfaceType::Normal),
            Obstacle::new(0.0, 50.0).with_size(400.0, 20.0),
        ];
        let (mut ghost, _) = grounded_on(SurfaceType::Normal);

        run(&mut ghost, InputIntents::new().jump(), &obstacles);

        assert!(ghost.velocity().y >= 0.0);
        assert!(ghost.bounds().min_y >= 60.0);
    }

    #[test]
    fn test_respawn_resets_state() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        run(&mut ghost, InputIntents::new().jump(), &[]);
        run(&mut ghost, InputIntents::new().ground_pound(), &[]);

        ghost.respawn(50.0, -20.0);

        let s = ghost.kinematics();
        assert_eq!(s.position, Vec2::new(50.0, -20.0));
        assert_eq!(s.velocity, Vec2::ZERO);
        assert!(s.can_double_jump);
        assert!(!s.is_ground_pounding);
        assert_eq!(s.coyote_time, 0.0);
        assert_eq!(s.jump_buffer_time, 0.0);
        assert_eq!(s.wall_jump_cooldown, 0.0);
    }

    #[test]
    fn test_elapsed_timer_mode() {
        let mut tuning = ControllerTuning::default();
        tuning.timer_mode = crate::tuning::TimerMode::Elapsed;
        let mut ghost = CharacterController::with_tuning(Vec2::ZERO, tuning);

        ghost
            .step(&InputIntents::new().jump(), &[], 0.016)
            .expect("valid dt");
        // Double jump consumed the buffer, press again without a charge
        ghost
            .step(&InputIntents::new().jump(), &[], 0.016)
            .expect("valid dt");
        assert_eq!(ghost.kinematics().jump_buffer_time, 100.0);

        ghost
            .step(&InputIntents::NONE, &[], 0.05)
            .expect("valid dt");
        assert!((ghost.kinematics().jump_buffer_time - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_frame_timer_quirk() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        ghost
            .step(&InputIntents::new().jump(), &[], 0.016)
            .expect("valid dt");
        ghost
            .step(&InputIntents::new().jump(), &[], 0.016)
            .expect("valid dt");

        // A long step still only counts as one 16 ms frame
        ghost
            .step(&InputIntents::NONE, &[], 0.05)
            .expect("valid dt");
        assert_eq!(ghost.kinematics().jump_buffer_time, 84.0);
    }

    #[test]
    fn test_hazard_damage_and_invulnerability() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        let items = [
            Interactable::hazard(0.0, 0.0, 20.0, 20.0),
            Interactable::hazard(5.0, 0.0, 20.0, 20.0),
        ];

        assert_eq!(ghost.check_interactions(&items), vec![ControllerEvent::Damage]);
        assert!(ghost.is_invulnerable());
        assert!(ghost.check_interactions(&items).is_empty());

        // 1000 ms at 16 ms per step
        for _ in 0..63 {
            run(&mut ghost, InputIntents::NONE, &[]);
            ghost.set_position(Vec2::ZERO);
        }
        assert!(!ghost.is_invulnerable());
        assert_eq!(ghost.check_interactions(&items), vec![ControllerEvent::Damage]);
    }

    #[test]
    fn test_checkpoint_reported_once() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        let items = [Interactable::checkpoint(0.0, 0.0, 10.0, 40.0)];

        assert_eq!(
            ghost.check_interactions(&items),
            vec![ControllerEvent::Checkpoint { x: 0.0, y: 0.0 }]
        );
        assert!(ghost.check_interactions(&items).is_empty());

        ghost.respawn(0.0, 0.0);
        assert!(ghost.check_interactions(&items).is_empty());
        assert_eq!(ghost.last_checkpoint(), Some(Vec2::ZERO));
    }

    #[test]
    fn test_collectible_reported() {
        let mut ghost = CharacterController::new(Vec2::ZERO);
        let items = [
            Interactable::collectible(500.0, 0.0, 1),
            Interactable::collectible(10.0, 0.0, 25),
        ];
        assert_eq!(
            ghost.check_interactions(&items),
            vec![ControllerEvent::Collect { item: 1, value: 25 }]
        );
    }

    #[test]
    fn test_approach() {
        assert_eq!(approach(0.0, 10.0, 3.0), 3.0);
        assert_eq!(approach(9.0, 10.0, 3.0), 10.0);
        assert_eq!(approach(0.0, -10.0, 3.0), -3.0);
        assert_eq!(approach(-1.0, 0.0, 3.0), 0.0);
    }

    fn arb_input() -> impl Strategy<Value = InputIntents> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(move_left, move_right, jump_just_pressed, jump_held, ground_pound_just_pressed)| {
                InputIntents {
                    move_left,
                    move_right,
                    jump_just_pressed,
                    jump_held,
                    ground_pound_just_pressed,
                }
            },
        )
    }

    fn arb_surface() -> impl Strategy<Value = SurfaceType> {
        prop_oneof![
            Just(SurfaceType::Normal),
            Just(SurfaceType::Ice),
            Just(SurfaceType::Sticky),
            Just(SurfaceType::Bouncy),
            Just(SurfaceType::Crumbling),
        ]
    }

    fn arena(floor_surface: SurfaceType, ledge_surface: SurfaceType) -> Vec<Obstacle> {
        vec![
            Obstacle::new(0.0, 210.0)
                .with_size(800.0, 20.0)
                .with_surface(floor_surface),
            Obstacle::new(-390.0, 0.0).with_size(20.0, 400.0),
            Obstacle::new(390.0, 0.0).with_size(20.0, 400.0),
            Obstacle::new(100.0, 120.0)
                .with_size(120.0, 10.0)
                .with_surface(ledge_surface),
        ]
    }

    proptest! {
        #[test]
        fn velocity_never_exceeds_terminal(
            inputs in proptest::collection::vec(arb_input(), 1..120),
            dt in 0.004f32..0.1,
            floor_surface in arb_surface(),
            ledge_surface in arb_surface(),
        ) {
            let obstacles = arena(floor_surface, ledge_surface);
            let mut ghost = CharacterController::new(Vec2::new(0.0, -100.0));
            for input in inputs {
                ghost.step(&input, &obstacles, dt).expect("valid dt");
                prop_assert!(ghost.velocity().y <= 600.0);
            }
        }

        #[test]
        fn floor_flags_stay_consistent(
            inputs in proptest::collection::vec(arb_input(), 1..120),
            floor_surface in arb_surface(),
            ledge_surface in arb_surface(),
        ) {
            let obstacles = arena(floor_surface, ledge_surface);
            let mut ghost = CharacterController::new(Vec2::new(0.0, -100.0));
            for input in inputs {
                ghost.step(&input, &obstacles, DT).expect("valid dt");
                let s = ghost.kinematics();
                prop_assert!(!(s.on_ice && s.on_sticky));
                prop_assert!(!s.on_ice || s.on_floor);
                prop_assert!(!s.on_sticky || s.on_floor);
                prop_assert!(s.is_wall_sliding || s.wall_slide_side == WallSide::None);
                prop_assert!(s.coyote_time >= 0.0);
                prop_assert!(s.jump_buffer_time >= 0.0);
                prop_assert!(s.wall_jump_cooldown >= 0.0);
            }
        }
    }
}
