//! Greedy local steering.
//!
//! There is no path planning. A tank heading for a point tries a short,
//! fixed list of unit steps and commits the first one the prospective
//! collision check allows.

use glam::{IVec2, Vec2};

use crate::arena::Arena;
use crate::entity::EntityId;
use crate::geometry::Direction;

/// Offsets this small on both axes count as arrived.
pub const ARRIVED_TOLERANCE: f32 = 5.0;

/// Steps tried when every preferred step is blocked.
const FALLBACK: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Unit steps to try for a given offset, most preferred first.
///
/// The primary axis is the one with the larger offset (vertical on a tie).
/// Order: primary, secondary, reversed secondary, reversed primary, then the
/// fixed fallback right, left, down, up. Zero steps are dropped.
///
/// # Example
///
/// ```
/// use tankbattle_core::ai::steering::candidate_steps;
/// use glam::{IVec2, Vec2};
///
/// let steps = candidate_steps(Vec2::new(50.0, -10.0));
/// assert_eq!(steps[0], IVec2::new(1, 0));
/// assert_eq!(steps[1], IVec2::new(0, -1));
/// ```
#[must_use]
pub fn candidate_steps(offset: Vec2) -> Vec<IVec2> {
    let (px, py) = (sign(offset.x), sign(offset.y));
    let preferred = if offset.x.abs() > offset.y.abs() {
        [
            IVec2::new(px, 0),
            IVec2::new(0, py),
            IVec2::new(0, -py),
            IVec2::new(-px, 0),
        ]
    } else {
        [
            IVec2::new(0, py),
            IVec2::new(px, 0),
            IVec2::new(-px, 0),
            IVec2::new(0, -py),
        ]
    };
    preferred
        .into_iter()
        .chain(FALLBACK)
        .filter(|step| *step != IVec2::ZERO)
        .collect()
}

/// Moves tank `id` one step towards `target` (a top-left position).
///
/// Returns the direction taken, or `None` if the tank was already within
/// [`ARRIVED_TOLERANCE`] on both axes, is not a tank, or every step was
/// blocked. The tank faces the direction it moves in; a tank that cannot
/// move keeps its facing.
pub fn move_towards(arena: &mut Arena, id: EntityId, target: Vec2) -> Option<Direction> {
    let field = *arena.playfield();
    let tank = arena.tank(id)?;
    let offset = target - tank.position;
    if offset.x.abs() <= ARRIVED_TOLERANCE && offset.y.abs() <= ARRIVED_TOLERANCE {
        return None;
    }

    let step = candidate_steps(offset)
        .into_iter()
        .find(|step| !arena.is_blocked(&tank.prospective_rect(*step), Some(id)))?;
    let direction = Direction::from_step(step)?;

    let tank = arena.tank_mut(id)?;
    tank.rotate(direction);
    tank.move_by(step, &field);
    Some(direction)
}
