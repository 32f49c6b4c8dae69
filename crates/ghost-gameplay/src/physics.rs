//! Obstacle geometry and collision resolution.
//!
//! The character is an axis-aligned box resolved against a flat list of
//! axis-aligned obstacles. Movement is split into small sub-steps so fast
//! bodies cannot skip over thin platforms, and each axis is resolved
//! separately (horizontal first) against the first overlapping obstacle.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::input::Vec2;
use crate::tuning::ControllerTuning;

/// Width used for obstacles that do not specify one.
pub const DEFAULT_OBSTACLE_WIDTH: f32 = 100.0;
/// Height used for obstacles that do not specify one.
pub const DEFAULT_OBSTACLE_HEIGHT: f32 = 20.0;
/// Hard cap on sub-steps per call, reached only with absurd velocities.
pub const MAX_SUB_STEPS: usize = 4096;

/// Axis-aligned bounding box for collision detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum X coordinate
    pub min_x: f32,
    /// Minimum Y coordinate
    pub min_y: f32,
    /// Maximum X coordinate
    pub max_x: f32,
    /// Maximum Y coordinate
    pub max_y: f32,
}

impl AABB {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the AABB.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the AABB.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Checks if this AABB overlaps with another. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Whether the vertical spans overlap, ignoring x.
    #[must_use]
    pub fn overlaps_vertically(&self, other: &AABB) -> bool {
        self.min_y < other.max_y && self.max_y > other.min_y
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// What an obstacle's top surface does to a character standing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    /// Plain ground
    #[default]
    Normal,
    /// Low acceleration and friction
    Ice,
    /// High friction, low top speed
    Sticky,
    /// Launches the character upward on landing
    Bouncy,
    /// Starts falling apart once landed on
    Crumbling,
}

/// A solid rectangle supplied by the host.
///
/// `x`/`y` are the rectangle's center. Missing sizes fall back to
/// [`DEFAULT_OBSTACLE_WIDTH`] x [`DEFAULT_OBSTACLE_HEIGHT`], and sizes are
/// multiplied by the optional scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Center X
    pub x: f32,
    /// Center Y
    pub y: f32,
    /// Unscaled width
    #[serde(default)]
    pub width: Option<f32>,
    /// Unscaled height
    #[serde(default)]
    pub height: Option<f32>,
    /// Horizontal scale factor
    #[serde(default)]
    pub scale_x: Option<f32>,
    /// Vertical scale factor
    #[serde(default)]
    pub scale_y: Option<f32>,
    /// Surface behavior
    #[serde(default)]
    pub surface: SurfaceType,
}

impl Obstacle {
    /// Creates a default-sized normal obstacle centered at (x, y).
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
            scale_x: None,
            scale_y: None,
            surface: SurfaceType::Normal,
        }
    }

    /// Sets an explicit size.
    #[must_use]
    pub const fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the surface type.
    #[must_use]
    pub const fn with_surface(mut self, surface: SurfaceType) -> Self {
        self.surface = surface;
        self
    }

    /// Sets the scale factors.
    #[must_use]
    pub const fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = Some(scale_x);
        self.scale_y = Some(scale_y);
        self
    }

    /// World-space bounds, or `None` if the obstacle is malformed.
    #[must_use]
    pub fn bounds(&self) -> Option<AABB> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }

        let width = finite_or(self.width, DEFAULT_OBSTACLE_WIDTH) * finite_or(self.scale_x, 1.0).abs();
        let height = finite_or(self.height, DEFAULT_OBSTACLE_HEIGHT) * finite_or(self.scale_y, 1.0).abs();

        Some(AABB::from_center(
            Vec2::new(self.x, self.y),
            width.abs() / 2.0,
            height.abs() / 2.0,
        ))
    }
}

fn finite_or(value: Option<f32>, fallback: f32) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// Side of the character a wall is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSide {
    /// Wall on the left (-1)
    Left,
    /// No wall (0)
    #[default]
    None,
    /// Wall on the right (1)
    Right,
}

impl WallSide {
    /// -1, 0 or 1.
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::None => 0,
            Self::Right => 1,
        }
    }

    /// Whether a wall is present.
    #[must_use]
    pub const fn is_some(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Landing recorded during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorContact {
    /// Index of the obstacle in the slice passed to the resolver
    pub obstacle: usize,
    /// Its surface
    pub surface: SurfaceType,
}

/// Everything the resolver touched during one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    /// Landed while falling (never set for bouncy surfaces)
    pub floor: Option<FloorContact>,
    /// Bounced off this obstacle
    pub bounced: Option<usize>,
    /// Hit a ceiling
    pub ceiling: bool,
    /// Wall hit, if any
    pub wall: WallSide,
}

/// Body state mutated by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Center position
    pub position: Vec2,
    /// Velocity in px/s
    pub velocity: Vec2,
    /// Half-width of the box
    pub half_width: f32,
    /// Half-height of the box
    pub half_height: f32,
}

impl Body {
    /// The body's current bounds.
    #[must_use]
    pub fn aabb(&self) -> AABB {
        AABB::from_center(self.position, self.half_width, self.half_height)
    }
}

/// Number of sub-steps used for a displacement.
#[must_use]
pub fn sub_step_count(dx: f32, dy: f32, sub_step_size: f32) -> usize {
    let largest = dx.abs().max(dy.abs());
    if !largest.is_finite() {
        return 1;
    }
    let steps = (largest / sub_step_size).ceil() as usize;
    if steps > MAX_SUB_STEPS {
        warn!("Displacement {largest} needs {steps} sub-steps, capping at {MAX_SUB_STEPS}");
    }
    steps.clamp(1, MAX_SUB_STEPS)
}

/// Moves `body` by `velocity * dt` against `obstacles`.
///
/// The displacement is fixed up front and split into equal sub-steps. Per
/// sub-step the horizontal fraction is applied and resolved against the
/// first overlapping obstacle, then the vertical fraction likewise. A
/// push-out only ends that axis's scan for that sub-step; later sub-steps
/// keep applying their fractions. Only the first landing and bounce of a
/// call are recorded in the returned [`Contacts`].
pub fn resolve_movement(
    body: &mut Body,
    obstacles: &[Obstacle],
    tuning: &ControllerTuning,
    dt: f32,
) -> Contacts {
    let mut contacts = Contacts::default();
    let dx = body.velocity.x * dt;
    let dy = body.velocity.y * dt;
    let steps = sub_step_count(dx, dy, tuning.sub_step_size);
    let step_x = dx / steps as f32;
    let step_y = dy / steps as f32;
    let bias = tuning.push_out_bias;

    for _ in 0..steps {
        body.position.x += step_x;
        let ours = body.aabb();
        if let Some((index, theirs)) = first_overlap(&ours, obstacles) {
            let left_pen = ours.max_x - theirs.min_x;
            let right_pen = theirs.max_x - ours.min_x;
            if left_pen < right_pen {
                body.position.x -= left_pen + bias;
                contacts.wall = WallSide::Right;
            } else {
                body.position.x += right_pen + bias;
                contacts.wall = WallSide::Left;
            }
            body.velocity.x = 0.0;
            trace!(obstacle = index, side = ?contacts.wall, "horizontal push-out");
        }

        body.position.y += step_y;
        let ours = body.aabb();
        if let Some((index, theirs)) = first_overlap(&ours, obstacles) {
            let top_pen = ours.max_y - theirs.min_y;
            let bottom_pen = theirs.max_y - ours.min_y;
            if top_pen < bottom_pen {
                body.position.y -= top_pen + bias;
                land(body, &mut contacts, index, obstacles[index].surface, tuning);
            } else {
                body.position.y += bottom_pen + bias;
                if body.velocity.y < 0.0 {
                    body.velocity.y = 0.0;
                }
                contacts.ceiling = true;
                trace!(obstacle = index, "ceiling push-out");
            }
        }
    }

    contacts
}

fn land(
    body: &mut Body,
    contacts: &mut Contacts,
    index: usize,
    surface: SurfaceType,
    tuning: &ControllerTuning,
) {
    if surface == SurfaceType::Bouncy {
        body.velocity.y = tuning.bounce_velocity;
        if contacts.bounced.is_none() {
            contacts.bounced = Some(index);
            trace!(obstacle = index, "bounce");
        }
    } else if body.velocity.y > 0.0 {
        body.velocity.y = 0.0;
        if contacts.floor.is_none() {
            contacts.floor = Some(FloorContact {
                obstacle: index,
                surface,
            });
            trace!(obstacle = index, ?surface, "landed");
        }
    }
}

fn first_overlap(ours: &AABB, obstacles: &[Obstacle]) -> Option<(usize, AABB)> {
    obstacles
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.bounds().map(|b| (i, b)))
        .find(|(_, b)| ours.overlaps(b))
}

/// Standing probe just below the feet.
///
/// Returns the first non-bouncy obstacle whose top lies within
/// `floor_probe_depth` under the body. Never reports a floor while the body
/// moves upward.
#[must_use]
pub fn probe_floor(
    body: &Body,
    obstacles: &[Obstacle],
    tuning: &ControllerTuning,
) -> Option<FloorContact> {
    if body.velocity.y < 0.0 {
        return None;
    }

    let ours = body.aabb();
    let probe = AABB::new(
        ours.min_x,
        ours.max_y,
        ours.max_x,
        ours.max_y + tuning.floor_probe_depth,
    );

    obstacles
        .iter()
        .enumerate()
        .filter(|(_, o)| o.surface != SurfaceType::Bouncy)
        .filter_map(|(i, o)| o.bounds().map(|b| (i, o.surface, b)))
        .find(|(_, _, b)| b.min_y >= ours.max_y - f32::EPSILON && probe.overlaps(b))
        .map(|(obstacle, surface, _)| FloorContact { obstacle, surface })
}

/// Near-contact wall test.
///
/// A wall counts when its facing edge is within `wall_contact_epsilon` of
/// the body and it overlaps the body's vertical span.
#[must_use]
pub fn probe_wall(body: &Body, obstacles: &[Obstacle], tuning: &ControllerTuning) -> WallSide {
    let ours = body.aabb();
    let epsilon = tuning.wall_contact_epsilon;

    for bounds in obstacles.iter().filter_map(Obstacle::bounds) {
        if !ours.overlaps_vertically(&bounds) {
            continue;
        }
        let left_gap = ours.min_x - bounds.max_x;
        if (0.0..=epsilon).contains(&left_gap) {
            return WallSide::Left;
        }
        let right_gap = bounds.min_x - ours.max_x;
        if (0.0..=epsilon).contains(&right_gap) {
            return WallSide::Right;
        }
    }
    WallSide::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f32, y: f32, vx: f32, vy: f32) -> Body {
        let tuning = ControllerTuning::default();
        Body {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            half_width: tuning.half_width,
            half_height: tuning.half_height,
        }
    }

    #[test]
    fn test_aabb_creation() {
        let aabb = AABB::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(aabb.width(), 10.0);
        assert_eq!(aabb.height(), 20.0);
    }

    #[test]
    fn test_aabb_from_center() {
        let aabb = AABB::from_center(Vec2::new(10.0, 10.0), 5.0, 10.0);
        assert_eq!(aabb.min_x, 5.0);
        assert_eq!(aabb.max_x, 15.0);
        assert_eq!(aabb.min_y, 0.0);
        assert_eq!(aabb.max_y, 20.0);
        assert_eq!(aabb.center(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_aabb_overlaps() {
        let a = AABB::new(0.0, 0.0, 10.0, 10.0);
        let b = AABB::new(5.0, 5.0, 15.0, 15.0);
        let c = AABB::new(20.0, 20.0, 30.0, 30.0);
        let touching = AABB::new(10.0, 0.0, 20.0, 10.0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&touching));
    }

    #[test]
    fn test_obstacle_default_size() {
        let bounds = Obstacle::new(0.0, 0.0).bounds().expect("well-formed");
        assert_eq!(bounds.width(), DEFAULT_OBSTACLE_WIDTH);
        assert_eq!(bounds.height(), DEFAULT_OBSTACLE_HEIGHT);
        assert_eq!(bounds.center(), Vec2::ZERO);
    }

    #[test]
    fn test_obstacle_scale() {
        let bounds = Obstacle::new(50.0, 50.0)
            .with_size(40.0, 10.0)
            .with_scale(2.0, -3.0)
            .bounds()
            .expect("well-formed");
        assert_eq!(bounds.width(), 80.0);
        assert_eq!(bounds.height(), 30.0);
    }

    #[test]
    fn test_malformed_obstacle_has_no_bounds() {
        assert!(Obstacle::new(f32::NAN, 0.0).bounds().is_none());
        assert!(Obstacle::new(0.0, f32::INFINITY).bounds().is_none());
    }

    #[test]
    fn test_sub_step_count() {
        assert_eq!(sub_step_count(0.0, 0.0, 3.0), 1);
        assert_eq!(sub_step_count(2.9, 0.0, 3.0), 1);
        assert_eq!(sub_step_count(-3.1, 1.0, 3.0), 2);
        assert_eq!(sub_step_count(0.0, 30.0, 3.0), 10);
        assert_eq!(sub_step_count(f32::INFINITY, 0.0, 3.0), 1);
        assert_eq!(sub_step_count(1.0e9, 0.0, 3.0), MAX_SUB_STEPS);
    }

    #[test]
    fn test_landing_rests_on_top_with_bias() {
        let tuning = ControllerTuning::default();
        let floor = [Obstacle::new(0.0, 110.0).with_size(200.0, 20.0)];
        // Feet at 98, floor top at 100
        let mut body = body_at(0.0, 82.0, 0.0, 300.0);

        let contacts = resolve_movement(&mut body, &floor, &tuning, 0.016);

        let floor_contact = contacts.floor.expect("landed");
        assert_eq!(floor_contact.obstacle, 0);
        assert_eq!(floor_contact.surface, SurfaceType::Normal);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.aabb().max_y - (100.0 - tuning.push_out_bias)).abs() < 1e-3);
    }

    #[test]
    fn test_ceiling_stops_upward_motion() {
        let tuning = ControllerTuning::default();
        let ceiling = [Obstacle::new(0.0, -10.0).with_size(200.0, 20.0)];
        // Head at 2, ceiling bottom at 0
        let mut body = body_at(0.0, 18.0, 0.0, -400.0);

        let contacts = resolve_movement(&mut body, &ceiling, &tuning, 0.016);

        assert!(contacts.ceiling);
        assert!(contacts.floor.is_none());
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.aabb().min_y >= 0.0);
    }

    #[test]
    fn test_wall_push_out_smaller_side() {
        let tuning = ControllerTuning::default();
        let wall = [Obstacle::new(50.0, 0.0).with_size(20.0, 200.0)];
        // Right edge at 38, wall's left face at 40
        let mut body = body_at(24.0, 0.0, 400.0, 0.0);

        let contacts = resolve_movement(&mut body, &wall, &tuning, 0.016);

        assert_eq!(contacts.wall, WallSide::Right);
        assert_eq!(body.velocity.x, 0.0);
        assert!((body.aabb().max_x - (40.0 - tuning.push_out_bias)).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_sets_bounce_velocity() {
        let tuning = ControllerTuning::default();
        let pad = [Obstacle::new(0.0, 110.0)
            .with_size(200.0, 20.0)
            .with_surface(SurfaceType::Bouncy)];
        let mut body = body_at(0.0, 82.0, 0.0, 300.0);

        let contacts = resolve_movement(&mut body, &pad, &tuning, 0.016);

        assert_eq!(contacts.bounced, Some(0));
        assert!(contacts.floor.is_none());
        assert_eq!(body.velocity.y, tuning.bounce_velocity);
    }

    #[test]
    fn test_first_overlap_wins() {
        let tuning = ControllerTuning::default();
        let floors = [
            Obstacle::new(0.0, 110.0)
                .with_size(200.0, 20.0)
                .with_surface(SurfaceType::Ice),
            Obstacle::new(0.0, 110.0).with_size(200.0, 20.0),
        ];
        let mut body = body_at(0.0, 82.0, 0.0, 300.0);

        let contacts = resolve_movement(&mut body, &floors, &tuning, 0.016);

        assert_eq!(
            contacts.floor,
            Some(FloorContact {
                obstacle: 0,
                surface: SurfaceType::Ice
            })
        );
    }

    #[test]
    fn test_thin_platform_is_not_tunneled() {
        let tuning = ControllerTuning::default();
        let sliver = [Obstacle::new(0.0, 300.5).with_size(200.0, 1.0)];
        let mut body = body_at(0.0, 0.0, 0.0, 600.0);

        // 300 px in one call
        let contacts = resolve_movement(&mut body, &sliver, &tuning, 0.5);

        assert!(contacts.floor.is_some());
        assert!(body.aabb().max_y < 300.0);
    }

    #[test]
    fn test_corner_clip_keeps_horizontal_travel() {
        let tuning = ControllerTuning::default();
        // Thin ledge spanning x 40..60, y 0..1
        let ledge = [Obstacle::new(50.0, 0.5).with_size(20.0, 1.0)];
        let mut body = body_at(20.0, -20.0, 600.0, 600.0);

        // 20 sub-steps of 3 px on each axis
        let contacts = resolve_movement(&mut body, &ledge, &tuning, 0.1);

        assert_eq!(contacts.wall, WallSide::Right);
        assert_eq!(body.velocity.x, 0.0);
        // Pushed back while beside the ledge, then carried on below it
        assert!((body.position.x - 46.9).abs() < 1e-3);
        assert!((body.position.y - 40.0).abs() < 1e-3);
        assert!(contacts.floor.is_none());
    }

    #[test]
    fn test_one_landing_recorded_per_call() {
        let tuning = ControllerTuning::default();
        let floors = [
            Obstacle::new(0.0, 110.0).with_size(200.0, 20.0),
            Obstacle::new(0.0, 200.0).with_size(200.0, 20.0),
        ];
        let mut body = body_at(0.0, 70.0, 0.0, 600.0);

        let contacts = resolve_movement(&mut body, &floors, &tuning, 0.1);

        assert_eq!(contacts.floor.map(|f| f.obstacle), Some(0));
        assert!((body.aabb().max_y - (100.0 - tuning.push_out_bias)).abs() < 1e-3);
    }

    #[test]
    fn test_malformed_obstacles_are_skipped() {
        let tuning = ControllerTuning::default();
        let obstacles = [
            Obstacle::new(f32::NAN, 110.0).with_size(200.0, 20.0),
            Obstacle::new(0.0, 110.0).with_size(200.0, 20.0),
        ];
        let mut body = body_at(0.0, 82.0, 0.0, 300.0);

        let contacts = resolve_movement(&mut body, &obstacles, &tuning, 0.016);

        assert_eq!(contacts.floor.map(|f| f.obstacle), Some(1));
    }

    #[test]
    fn test_probe_floor() {
        let tuning = ControllerTuning::default();
        let floor = [Obstacle::new(0.0, 110.0).with_size(200.0, 20.0)];
        let resting = body_at(0.0, 100.0 - 16.0 - 0.1, 0.0, 0.0);
        let hovering = body_at(0.0, 70.0, 0.0, 0.0);
        let rising = body_at(0.0, 100.0 - 16.0 - 0.1, 0.0, -10.0);

        assert!(probe_floor(&resting, &floor, &tuning).is_some());
        assert!(probe_floor(&hovering, &floor, &tuning).is_none());
        assert!(probe_floor(&rising, &floor, &tuning).is_none());
    }

    #[test]
    fn test_probe_floor_ignores_bouncy() {
        let tuning = ControllerTuning::default();
        let pad = [Obstacle::new(0.0, 110.0)
            .with_size(200.0, 20.0)
            .with_surface(SurfaceType::Bouncy)];
        let resting = body_at(0.0, 83.9, 0.0, 0.0);

        assert!(probe_floor(&resting, &pad, &tuning).is_none());
    }

    #[test]
    fn test_probe_wall() {
        let tuning = ControllerTuning::default();
        let walls = [Obstacle::new(-20.0, 0.0).with_size(20.0, 200.0)];
        // Left face of body at -7, wall right face at -10
        let near = body_at(7.0, 0.0, 0.0, 0.0);
        let far = body_at(30.0, 0.0, 0.0, 0.0);

        assert_eq!(probe_wall(&near, &walls, &tuning), WallSide::Left);
        assert_eq!(probe_wall(&far, &walls, &tuning), WallSide::None);

        let right_wall = [Obstacle::new(30.0, 0.0).with_size(20.0, 200.0)];
        // Right face of body at 18, wall left face at 20
        let near_right = body_at(4.0, 0.0, 0.0, 0.0);
        assert_eq!(probe_wall(&near_right, &right_wall, &tuning), WallSide::Right);
    }
}
