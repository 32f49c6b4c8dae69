//! Input intents for the character controller.
//!
//! The controller never reads devices. Hosts sample their buttons once per
//! step and hand over an [`InputIntents`] snapshot; [`InputTracker`] turns a
//! stream of raw "is held" samples into the edge-triggered form.

use serde::{Deserialize, Serialize};

/// 2D vector for positions and velocities.
///
/// Screen coordinates: +x is right, +y is down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new Vec2.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the length (magnitude) of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Scale the vector by a scalar.
    #[must_use]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Per-step input snapshot consumed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputIntents {
    /// Left is held
    pub move_left: bool,
    /// Right is held
    pub move_right: bool,
    /// Jump went down this step
    pub jump_just_pressed: bool,
    /// Jump is held
    pub jump_held: bool,
    /// Ground pound went down this step
    pub ground_pound_just_pressed: bool,
}

impl InputIntents {
    /// No input at all.
    pub const NONE: Self = Self {
        move_left: false,
        move_right: false,
        jump_just_pressed: false,
        jump_held: false,
        ground_pound_just_pressed: false,
    };

    /// Create an empty input snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self::NONE
    }

    /// Horizontal input as -1, 0 or 1. Opposite directions cancel out.
    #[must_use]
    pub fn horizontal_axis(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Builder: hold left.
    #[must_use]
    pub const fn left(mut self) -> Self {
        self.move_left = true;
        self
    }

    /// Builder: hold right.
    #[must_use]
    pub const fn right(mut self) -> Self {
        self.move_right = true;
        self
    }

    /// Builder: press jump this step (and hold it).
    #[must_use]
    pub const fn jump(mut self) -> Self {
        self.jump_just_pressed = true;
        self.jump_held = true;
        self
    }

    /// Builder: keep jump held without a new press.
    #[must_use]
    pub const fn hold_jump(mut self) -> Self {
        self.jump_held = true;
        self
    }

    /// Builder: press ground pound this step.
    #[must_use]
    pub const fn ground_pound(mut self) -> Self {
        self.ground_pound_just_pressed = true;
        self
    }
}

/// Raw held-button sample from a device or script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawButtons {
    /// Left held
    pub left: bool,
    /// Right held
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Ground pound (down) held
    pub down: bool,
}

/// State of a button (pressed, just pressed, released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button was just pressed this frame
    pub just_pressed: bool,
    /// Whether the button was just released this frame
    pub just_released: bool,
}

impl ButtonState {
    /// Create a new button state (not pressed).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pressed: false,
            just_pressed: false,
            just_released: false,
        }
    }

    /// Update the button state based on whether it's currently pressed.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.just_released = !is_pressed && self.pressed;
        self.pressed = is_pressed;
    }
}

/// Derives edge-triggered [`InputIntents`] from raw held samples.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    jump: ButtonState,
    down: ButtonState,
    left: bool,
    right: bool,
}

impl InputTracker {
    /// Create a tracker with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample and get the intents for this step.
    pub fn sample(&mut self, raw: RawButtons) -> InputIntents {
        self.jump.update(raw.jump);
        self.down.update(raw.down);
        self.left = raw.left;
        self.right = raw.right;

        InputIntents {
            move_left: self.left,
            move_right: self.right,
            jump_just_pressed: self.jump.just_pressed,
            jump_held: self.jump.pressed,
            ground_pound_just_pressed: self.down.just_pressed,
        }
    }

    /// Forget all held state (e.g. after a respawn or focus loss).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
