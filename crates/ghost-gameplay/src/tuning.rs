//! Controller tuning.
//!
//! Every hand-tuned constant of the controller lives here so hosts can load
//! them from a config file. Units: px, px/s, px/s² and milliseconds.

use serde::{Deserialize, Serialize};

/// How the millisecond timers (coyote, jump buffer, cooldowns) decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Decay by a fixed `fixed_frame_ms` per step, whatever `dt` was passed.
    /// Velocity integration still uses the real `dt`.
    #[default]
    FixedFrame,
    /// Decay by the real elapsed time of the step.
    Elapsed,
}

/// Acceleration, speed cap and friction for one kind of footing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMovement {
    /// Acceleration toward max speed while input is held
    pub acceleration: f32,
    /// Horizontal speed cap
    pub max_speed: f32,
    /// Deceleration when no horizontal input is held
    pub friction: f32,
}

impl SurfaceMovement {
    /// Creates a movement profile.
    #[must_use]
    pub const fn new(acceleration: f32, max_speed: f32, friction: f32) -> Self {
        Self {
            acceleration,
            max_speed,
            friction,
        }
    }

    fn sanitized(self, fallback: Self) -> Self {
        Self {
            acceleration: finite_or(self.acceleration, fallback.acceleration).max(0.0),
            max_speed: finite_or(self.max_speed, fallback.max_speed).max(0.0),
            friction: finite_or(self.friction, fallback.friction).max(0.0),
        }
    }
}

/// Character controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerTuning {
    // === Body ===
    /// Collision box half-width
    pub half_width: f32,
    /// Collision box half-height
    pub half_height: f32,

    // === Vertical ===
    /// Gravity acceleration (positive = down)
    pub gravity: f32,
    /// Maximum fall speed
    pub terminal_velocity: f32,
    /// Ground / coyote jump impulse (negative = up)
    pub jump_velocity: f32,
    /// Double jump impulse (negative = up)
    pub double_jump_velocity: f32,
    /// Upward speed below which releasing jump cuts the jump
    pub variable_jump_threshold: f32,
    /// Multiplier applied to upward speed on jump release
    pub variable_jump_damping: f32,
    /// Velocity set by a bouncy surface (negative = up)
    pub bounce_velocity: f32,

    // === Walls ===
    /// Horizontal wall jump speed, away from the wall
    pub wall_jump_velocity_x: f32,
    /// Vertical wall jump impulse (negative = up)
    pub wall_jump_velocity_y: f32,
    /// Time before another wall jump is allowed
    pub wall_jump_cooldown_ms: f32,
    /// Fall speed cap while wall sliding
    pub wall_slide_speed: f32,
    /// Minimum fall speed before a wall slide engages
    pub wall_slide_min_fall_speed: f32,
    /// Maximum gap to a wall that still counts as contact
    pub wall_contact_epsilon: f32,

    // === Ground pound ===
    /// Downward speed forced while pounding
    pub ground_pound_velocity: f32,
    /// Per-step multiplier on horizontal speed while pounding
    pub ground_pound_horizontal_damping: f32,

    // === Grace timers ===
    /// Coyote window after leaving a floor
    pub coyote_time_ms: f32,
    /// How long an early jump press is remembered
    pub jump_buffer_ms: f32,
    /// Damage immunity after a hazard hit
    pub invulnerability_ms: f32,
    /// Timer decay policy
    pub timer_mode: TimerMode,
    /// Step length assumed by [`TimerMode::FixedFrame`]
    pub fixed_frame_ms: f32,

    // === Horizontal ===
    /// Standing on a normal or crumbling surface
    pub floor: SurfaceMovement,
    /// Airborne
    pub air: SurfaceMovement,
    /// Standing on ice
    pub ice: SurfaceMovement,
    /// Standing on a sticky surface
    pub sticky: SurfaceMovement,

    // === Collision ===
    /// Largest displacement per collision sub-step
    pub sub_step_size: f32,
    /// Extra separation added on every push-out
    pub push_out_bias: f32,
    /// Depth of the standing probe below the feet
    pub floor_probe_depth: f32,

    // === Interactions ===
    /// Pickup distance for collectibles, centre to centre
    pub collect_radius: f32,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self {
            half_width: 14.0,
            half_height: 16.0,

            gravity: 1200.0,
            terminal_velocity: 600.0,
            jump_velocity: -500.0,
            double_jump_velocity: -400.0,
            variable_jump_threshold: -200.0,
            variable_jump_damping: 0.6,
            bounce_velocity: -800.0,

            wall_jump_velocity_x: 300.0,
            wall_jump_velocity_y: -450.0,
            wall_jump_cooldown_ms: 200.0,
            wall_slide_speed: 100.0,
            wall_slide_min_fall_speed: 50.0,
            wall_contact_epsilon: 5.0,

            ground_pound_velocity: 600.0,
            ground_pound_horizontal_damping: 0.5,

            coyote_time_ms: 100.0,
            jump_buffer_ms: 100.0,
            invulnerability_ms: 1000.0,
            timer_mode: TimerMode::FixedFrame,
            fixed_frame_ms: 16.0,

            floor: SurfaceMovement::new(1500.0, 250.0, 1200.0),
            air: SurfaceMovement::new(900.0, 250.0, 200.0),
            ice: SurfaceMovement::new(400.0, 300.0, 100.0),
            sticky: SurfaceMovement::new(1500.0, 120.0, 3000.0),

            sub_step_size: 3.0,
            push_out_bias: 0.1,
            floor_probe_depth: 2.0,

            collect_radius: 24.0,
        }
    }
}

impl ControllerTuning {
    /// Creates the reference tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds a step of `dt` seconds counts for under the timer policy.
    #[must_use]
    pub fn elapsed_ms(&self, dt: f32) -> f32 {
        match self.timer_mode {
            TimerMode::FixedFrame => self.fixed_frame_ms,
            TimerMode::Elapsed => dt * 1000.0,
        }
    }

    /// Validate and clamp values to usable ranges.
    ///
    /// Non-finite values are replaced by the reference value first.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        for (value, fallback) in [
            (&mut self.half_width, defaults.half_width),
            (&mut self.half_height, defaults.half_height),
            (&mut self.gravity, defaults.gravity),
            (&mut self.terminal_velocity, defaults.terminal_velocity),
            (&mut self.jump_velocity, defaults.jump_velocity),
            (&mut self.double_jump_velocity, defaults.double_jump_velocity),
            (&mut self.variable_jump_threshold, defaults.variable_jump_threshold),
            (&mut self.variable_jump_damping, defaults.variable_jump_damping),
            (&mut self.bounce_velocity, defaults.bounce_velocity),
            (&mut self.wall_jump_velocity_x, defaults.wall_jump_velocity_x),
            (&mut self.wall_jump_velocity_y, defaults.wall_jump_velocity_y),
            (&mut self.wall_jump_cooldown_ms, defaults.wall_jump_cooldown_ms),
            (&mut self.wall_slide_speed, defaults.wall_slide_speed),
            (&mut self.wall_slide_min_fall_speed, defaults.wall_slide_min_fall_speed),
            (&mut self.wall_contact_epsilon, defaults.wall_contact_epsilon),
            (&mut self.ground_pound_velocity, defaults.ground_pound_velocity),
            (
                &mut self.ground_pound_horizontal_damping,
                defaults.ground_pound_horizontal_damping,
            ),
            (&mut self.coyote_time_ms, defaults.coyote_time_ms),
            (&mut self.jump_buffer_ms, defaults.jump_buffer_ms),
            (&mut self.invulnerability_ms, defaults.invulnerability_ms),
            (&mut self.fixed_frame_ms, defaults.fixed_frame_ms),
            (&mut self.sub_step_size, defaults.sub_step_size),
            (&mut self.push_out_bias, defaults.push_out_bias),
            (&mut self.floor_probe_depth, defaults.floor_probe_depth),
            (&mut self.collect_radius, defaults.collect_radius),
        ] {
            *value = finite_or(*value, fallback);
        }

        self.half_width = self.half_width.max(0.5);
        self.half_height = self.half_height.max(0.5);

        self.gravity = self.gravity.max(0.0);
        self.terminal_velocity = self.terminal_velocity.max(1.0);
        // Pounding must not break the terminal velocity cap
        self.ground_pound_velocity = self.ground_pound_velocity.clamp(0.0, self.terminal_velocity);
        self.wall_slide_speed = self.wall_slide_speed.clamp(0.0, self.terminal_velocity);

        self.jump_velocity = self.jump_velocity.min(0.0);
        self.double_jump_velocity = self.double_jump_velocity.min(0.0);
        self.wall_jump_velocity_y = self.wall_jump_velocity_y.min(0.0);
        self.bounce_velocity = self.bounce_velocity.min(0.0);
        self.wall_jump_velocity_x = self.wall_jump_velocity_x.abs();

        self.variable_jump_damping = self.variable_jump_damping.clamp(0.01, 1.0);
        self.ground_pound_horizontal_damping = self.ground_pound_horizontal_damping.clamp(0.0, 1.0);

        self.coyote_time_ms = self.coyote_time_ms.max(0.0);
        self.jump_buffer_ms = self.jump_buffer_ms.max(0.0);
        self.wall_jump_cooldown_ms = self.wall_jump_cooldown_ms.max(0.0);
        self.invulnerability_ms = self.invulnerability_ms.max(0.0);
        self.fixed_frame_ms = self.fixed_frame_ms.max(1.0);

        self.floor = self.floor.sanitized(defaults.floor);
        self.air = self.air.sanitized(defaults.air);
        self.ice = self.ice.sanitized(defaults.ice);
        self.sticky = self.sticky.sanitized(defaults.sticky);

        self.sub_step_size = self.sub_step_size.max(0.5);
        self.push_out_bias = self.push_out_bias.clamp(0.0, 1.0);
        // The probe has to reach past the push-out gap
        self.floor_probe_depth = self.floor_probe_depth.max(self.push_out_bias + 0.1);
        self.wall_contact_epsilon = self.wall_contact_epsilon.max(self.push_out_bias);
        self.collect_radius = self.collect_radius.max(0.0);
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
