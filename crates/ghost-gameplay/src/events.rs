//! Events emitted by the controller for the host to dispatch.
//!
//! The controller never touches score, lives, particles or the camera. It
//! reports what happened and the host decides what that means.

use serde::{Deserialize, Serialize};

use ghost_common::EntityId;

use crate::physics::SurfaceType;

/// Which jump branch fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    /// From the floor or within the coyote window
    Ground,
    /// Off a wall while sliding
    Wall,
    /// Mid-air, consuming the double jump charge
    Double,
}

/// Event types emitted by a controller step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// A jump fired
    Jumped {
        /// Which branch
        kind: JumpKind,
    },
    /// Landed on a bouncy surface and got launched
    Bounce,
    /// Landed on a crumbling surface
    CrumbleStart {
        /// Index of the obstacle in the slice passed to `step`
        obstacle: usize,
    },
    /// Landed while falling
    Landed {
        /// Surface landed on
        surface: SurfaceType,
    },
    /// A ground pound began
    GroundPoundStarted,
    /// A ground pound hit the floor (camera shake, squash reset)
    PoundLanded,
    /// Squash/stretch hint for the renderer
    Squash {
        /// Horizontal scale
        scale_x: f32,
        /// Vertical scale
        scale_y: f32,
    },
    /// Touched a hazard outside the invulnerability window
    Damage,
    /// Reached a new checkpoint
    Checkpoint {
        /// Checkpoint center X
        x: f32,
        /// Checkpoint center Y
        y: f32,
    },
    /// In pickup range of a collectible
    Collect {
        /// Index of the interactable in the slice passed to the check
        item: usize,
        /// Its value
        value: u32,
    },
}

impl ControllerEvent {
    /// Short name, matching the serialized `type` tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jumped { .. } => "jumped",
            Self::Bounce => "bounce",
            Self::CrumbleStart { .. } => "crumble_start",
            Self::Landed { .. } => "landed",
            Self::GroundPoundStarted => "ground_pound_started",
            Self::PoundLanded => "pound_landed",
            Self::Squash { .. } => "squash",
            Self::Damage => "damage",
            Self::Checkpoint { .. } => "checkpoint",
            Self::Collect { .. } => "collect",
        }
    }
}

/// An event stamped with where and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Simulation frame
    pub frame: u64,
    /// Emitting character
    pub entity: EntityId,
    /// The event
    pub event: ControllerEvent,
}

/// Host-side accumulator for controller events.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventLog {
    /// Creates a log that holds at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Records a batch of events from one step, in emission order.
    pub fn extend(&mut self, frame: u64, entity: EntityId, events: &[ControllerEvent]) {
        for &event in events {
            if self.events.len() >= self.capacity {
                // Full: newest events are dropped
                self.dropped += 1;
                continue;
            }
            self.events.push(LoggedEvent {
                frame,
                entity,
                event,
            });
        }
    }

    /// Drains all pending events.
    pub fn drain(&mut self) -> Vec<LoggedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    /// Events dropped because the log was full.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}
