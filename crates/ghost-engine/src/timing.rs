//! Fixed timestep accumulation.
//!
//! The controller is always stepped with the same `dt`. Host frames of any
//! length are accumulated and converted into a whole number of controller
//! steps.

/// Largest host frame accepted before clamping, in seconds.
const DEFAULT_MAX_FRAME_DELTA: f32 = 0.25;
/// Most steps run for a single host frame.
const DEFAULT_MAX_UPDATES: u32 = 10;

/// Fixed timestep accumulator.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Step length in seconds
    fixed_dt: f32,
    /// Unconsumed time
    accumulator: f32,
    /// Host frames longer than this are clamped (prevents spiral of death)
    max_frame_delta: f32,
    /// Cap on steps per host frame
    max_updates: u32,
    /// Steps handed out so far
    total_updates: u64,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl FixedTimestep {
    /// Create an accumulator for steps of `fixed_dt` seconds.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt: sanitize_dt(fixed_dt),
            accumulator: 0.0,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            max_updates: DEFAULT_MAX_UPDATES,
            total_updates: 0,
        }
    }

    /// Set the cap on steps per host frame.
    #[must_use]
    pub fn with_max_updates(mut self, max_updates: u32) -> Self {
        self.max_updates = max_updates.max(1);
        self
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Accumulate a host frame of `frame_dt` seconds.
    /// Returns the number of fixed steps that should be performed.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(self.max_frame_delta);

        let mut count = 0;
        while self.accumulator >= self.fixed_dt && count < self.max_updates {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind after the cap: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.total_updates += u64::from(count);
        count
    }

    /// Steps handed out since creation.
    #[must_use]
    pub fn total_updates(&self) -> u64 {
        self.total_updates
    }
}

fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.001) // Minimum 1ms
    } else {
        1.0 / 60.0
    }
}
