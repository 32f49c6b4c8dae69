//! Hazards, collectibles and checkpoints.
//!
//! These are proximity tests run after movement has been resolved. This
//! module only finds what the character touches; the controller decides
//! which contacts turn into events.

use serde::{Deserialize, Serialize};

use crate::input::Vec2;
use crate::physics::AABB;

/// What an interactable does on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractableKind {
    /// Hurts on overlap
    Hazard,
    /// Picked up within the collect radius
    Collectible {
        /// Score value
        value: u32,
    },
    /// Becomes the respawn point on overlap
    Checkpoint,
}

/// A non-solid object the character can touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    /// Center X
    pub x: f32,
    /// Center Y
    pub y: f32,
    /// Width
    #[serde(default = "default_extent")]
    pub width: f32,
    /// Height
    #[serde(default = "default_extent")]
    pub height: f32,
    /// Behavior
    pub kind: InteractableKind,
}

fn default_extent() -> f32 {
    32.0
}

impl Interactable {
    /// A hazard of the given size centered at (x, y).
    #[must_use]
    pub const fn hazard(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind: InteractableKind::Hazard,
        }
    }

    /// A collectible worth `value` at (x, y).
    #[must_use]
    pub const fn collectible(x: f32, y: f32, value: u32) -> Self {
        Self {
            x,
            y,
            width: 16.0,
            height: 16.0,
            kind: InteractableKind::Collectible { value },
        }
    }

    /// A checkpoint of the given size centered at (x, y).
    #[must_use]
    pub const fn checkpoint(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind: InteractableKind::Checkpoint,
        }
    }

    /// Center point.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Bounds, or `None` for a malformed interactable.
    #[must_use]
    pub fn bounds(&self) -> Option<AABB> {
        if !self.center().is_finite() || !self.width.is_finite() || !self.height.is_finite() {
            return None;
        }
        Some(AABB::from_center(
            self.center(),
            self.width.abs() / 2.0,
            self.height.abs() / 2.0,
        ))
    }
}

/// A contact found by [`scan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Index into the scanned slice
    pub index: usize,
    /// The touched interactable
    pub item: Interactable,
}

/// Finds every interactable the character currently touches, in slice order.
///
/// Hazards and checkpoints use AABB overlap against `body`; collectibles use
/// the distance between centers against `collect_radius`.
#[must_use]
pub fn scan(body: &AABB, items: &[Interactable], collect_radius: f32) -> Vec<Touch> {
    let center = body.center();

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let bounds = item.bounds()?;
            let touching = match item.kind {
                InteractableKind::Hazard | InteractableKind::Checkpoint => body.overlaps(&bounds),
                InteractableKind::Collectible { .. } => {
                    center.distance(item.center()) < collect_radius
                },
            };
            touching.then_some(Touch { index, item: *item })
        })
        .collect()
}
