//! Axis-aligned geometry shared by every entity.
//!
//! All boxes in the game are axis-aligned and stored as a top-left corner plus
//! a size, matching the way the playfield is addressed (x grows right, y grows
//! down).
//!
//! # Overlap Semantics
//!
//! [`Rect::intersects`] is strict: two boxes that only share an edge do not
//! overlap. This lets a tank sit flush against a wall and still move along it.
//! [`Rect::contains_point`] is inclusive on every edge, which is what the
//! vision ray march needs when testing sample points against walls.

use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

// =============================================================================
// Direction
// =============================================================================

/// One of the four cardinal facings.
///
/// The discriminant order (Up, Right, Down, Left) is clockwise starting from
/// the top of the screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards negative y.
    Up,
    /// Towards positive x.
    Right,
    /// Towards positive y.
    Down,
    /// Towards negative x.
    Left,
}

impl Direction {
    /// Every direction, in declaration order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Returns the unit grid step for this direction.
    ///
    /// # Example
    ///
    /// ```
    /// use tankbattle_core::geometry::Direction;
    /// use glam::IVec2;
    ///
    /// assert_eq!(Direction::Up.step(), IVec2::new(0, -1));
    /// assert_eq!(Direction::Right.step(), IVec2::new(1, 0));
    /// ```
    #[must_use]
    pub const fn step(self) -> IVec2 {
        match self {
            Self::Up => IVec2::new(0, -1),
            Self::Right => IVec2::new(1, 0),
            Self::Down => IVec2::new(0, 1),
            Self::Left => IVec2::new(-1, 0),
        }
    }

    /// Returns the unit vector for this direction.
    #[must_use]
    pub fn unit(self) -> Vec2 {
        self.step().as_vec2()
    }

    /// Returns the direction matching a unit grid step, if any.
    ///
    /// Diagonal and zero steps have no cardinal direction.
    #[must_use]
    pub const fn from_step(step: IVec2) -> Option<Self> {
        match (step.x, step.y) {
            (0, -1) => Some(Self::Up),
            (1, 0) => Some(Self::Right),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            _ => None,
        }
    }

    /// Returns true for Left and Right.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "Up"),
            Self::Right => write!(f, "Right"),
            Self::Down => write!(f, "Down"),
            Self::Left => write!(f, "Left"),
        }
    }
}

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub min: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Creates a square with the given side length.
    #[must_use]
    pub fn square(min: Vec2, side: f32) -> Self {
        Self::new(min, Vec2::splat(side))
    }

    /// Returns the bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Returns the centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Returns a copy moved by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.min + delta, self.size)
    }

    /// Strict overlap test. Shared edges do not count.
    ///
    /// # Example
    ///
    /// ```
    /// use tankbattle_core::geometry::Rect;
    /// use glam::Vec2;
    ///
    /// let a = Rect::square(Vec2::ZERO, 40.0);
    /// let touching = Rect::square(Vec2::new(40.0, 0.0), 40.0);
    /// let overlapping = Rect::square(Vec2::new(39.0, 0.0), 40.0);
    ///
    /// assert!(!a.intersects(&touching));
    /// assert!(a.intersects(&overlapping));
    /// ```
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }
}

// =============================================================================
// Playfield
// =============================================================================

/// The fixed rectangular coordinate space entities live in.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl Playfield {
    /// Creates a playfield of the given extent.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Inclusive containment: points on the far edges are inside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    /// Clamps the top-left corner of a square box so the whole box stays on
    /// the field. Each axis is clamped independently.
    #[must_use]
    pub fn clamp_box(&self, min: Vec2, side: f32) -> Vec2 {
        Vec2::new(
            min.x.clamp(0.0, (self.width - side).max(0.0)),
            min.y.clamp(0.0, (self.height - side).max(0.0)),
        )
    }

    /// Number of whole grid cells across and down for a given cell size.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn grid_dims(&self, cell: f32) -> (u32, u32) {
        ((self.width / cell) as u32, (self.height / cell) as u32)
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}
