//! Vision system: per-tank field of view with wall occlusion.
//!
//! Each tick [`VisionSystem::recompute`] rebuilds, for every living tank, the
//! set of 20-unit grid cells it can see. Samples are taken on a 10-unit
//! lattice inside a rectangle that extends forward from the tank centre along
//! its facing, and each sample is kept only if a ray marched from the centre
//! reaches it without entering a wall.
//!
//! # Shared Vision
//!
//! While at least one Commander is alive, every enemy also sees what any
//! other enemy sees. The pool is the union of the enemy tanks' own cells and
//! is rebuilt with the rest of the map; the player never draws from it.
//!
//! # Example
//!
//! ```
//! use tankbattle_core::arena::Arena;
//! use tankbattle_core::entity::{TankComponents, TankKind};
//! use tankbattle_core::vision::VisionSystem;
//! use glam::Vec2;
//!
//! let mut arena = Arena::default();
//! let player = arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(380.0, 400.0), 40.0));
//!
//! let mut vision = VisionSystem::new();
//! vision.recompute(&arena);
//!
//! // Facing up, the player sees the point 50 units above its centre.
//! assert!(vision.is_visible(player, TankKind::Player, Vec2::new(400.0, 370.0)));
//! assert!(!vision.shared_vision_enabled());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::{EntityId, TankComponents, TankKind};
use crate::geometry::{Playfield, Rect};

/// Spacing of the sample lattice and of ray-march steps.
pub const SAMPLE_STEP: f32 = 10.0;

/// Side length of a vision cell.
pub const CELL_SIZE: f32 = 20.0;

/// A vision cell in grid coordinates.
pub type Cell = (i32, i32);

/// Returns the vision cell containing `point`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn cell_of(point: Vec2) -> Cell {
    let cell = (point / CELL_SIZE).floor();
    (cell.x as i32, cell.y as i32)
}

/// Forward and side reach for a tank.
///
/// The player sees the full range ahead and 0.7 of it to each side; enemies
/// see 0.8 ahead and 0.5 to each side.
#[must_use]
pub fn reach(tank: &TankComponents) -> (f32, f32) {
    if tank.is_player() {
        (tank.vision_range, tank.vision_range * 0.7)
    } else {
        (tank.vision_range * 0.8, tank.vision_range * 0.5)
    }
}

/// True if a ray from `from` to `to` passes through a wall.
///
/// The ray is marched in `⌊max(|Δx|, |Δy|) / 10⌋` equal steps starting at
/// `from`; the end point itself is not tested. A ray too short for a single
/// step is never occluded. Wall containment is inclusive of edges.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn is_occluded(from: Vec2, to: Vec2, walls: &[Rect]) -> bool {
    let delta = to - from;
    let steps = (delta.x.abs().max(delta.y.abs()) / SAMPLE_STEP).floor() as u32;
    if steps == 0 {
        return false;
    }
    let stride = delta / steps as f32;
    (0..steps).any(|i| {
        let probe = from + stride * i as f32;
        walls.iter().any(|w| w.contains_point(probe))
    })
}

/// Computes the cells visible to one tank.
///
/// # Arguments
///
/// * `tank` - Observer; its centre, facing and range define the sample area
/// * `walls` - Bounding boxes of every wall that blocks sight
/// * `field` - Samples outside the playfield are dropped
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn field_of_view(tank: &TankComponents, walls: &[Rect], field: &Playfield) -> BTreeSet<Cell> {
    let (forward, side) = reach(tank);
    let (forward, side) = (forward.trunc() as i32, side.trunc() as i32);
    let step = SAMPLE_STEP as usize;

    let origin = tank.center();
    let ahead = tank.facing.unit();
    let across = Vec2::new(-ahead.y, ahead.x);

    let mut cells = BTreeSet::new();
    for distance in (0..forward.max(0)).step_by(step) {
        for offset in (-side..side).step_by(step) {
            let sample = origin + ahead * distance as f32 + across * offset as f32;
            if field.contains(sample) && !is_occluded(origin, sample, walls) {
                cells.insert(cell_of(sample));
            }
        }
    }
    cells
}

#[derive(Debug, Clone)]
struct Sight {
    kind: TankKind,
    cells: BTreeSet<Cell>,
}

/// Per-tank visibility, rebuilt from scratch every tick.
#[derive(Debug, Clone, Default)]
pub struct VisionSystem {
    sights: BTreeMap<EntityId, Sight>,
    shared_enabled: bool,
    shared_pool: BTreeSet<Cell>,
}

impl VisionSystem {
    /// Creates an empty vision system. Nothing is visible until the first
    /// [`VisionSystem::recompute`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds every living tank's visible cells and the shared pool.
    pub fn recompute(&mut self, arena: &Arena) {
        let walls: Vec<Rect> = arena.walls().map(|(_, w)| w.rect()).collect();
        let field = arena.playfield();

        self.sights = arena
            .living_tanks()
            .map(|(id, tank)| {
                let sight = Sight {
                    kind: tank.kind,
                    cells: field_of_view(tank, &walls, field),
                };
                (id, sight)
            })
            .collect();

        self.shared_enabled = self
            .sights
            .values()
            .any(|s| s.kind == TankKind::EnemyCommander);
        self.shared_pool = if self.shared_enabled {
            self.sights
                .values()
                .filter(|s| s.kind.is_enemy())
                .flat_map(|s| s.cells.iter().copied())
                .collect()
        } else {
            BTreeSet::new()
        };
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.sights.clear();
        self.shared_enabled = false;
        self.shared_pool.clear();
    }

    /// True while a living Commander was present at the last recompute.
    #[must_use]
    pub const fn shared_vision_enabled(&self) -> bool {
        self.shared_enabled
    }

    /// Union of the enemy tanks' cells; empty while shared vision is off.
    #[must_use]
    pub const fn shared_pool(&self) -> &BTreeSet<Cell> {
        &self.shared_pool
    }

    /// A tank's own visible cells, if it was alive at the last recompute.
    #[must_use]
    pub fn cells(&self, observer: EntityId) -> Option<&BTreeSet<Cell>> {
        self.sights.get(&observer).map(|s| &s.cells)
    }

    /// True if `point` is visible to `observer`.
    ///
    /// A point is visible if its cell is in the observer's own set, or the
    /// observer is an enemy, shared vision is on, and the cell is pooled. A
    /// tank with no record (dead or spawned after the recompute) sees
    /// nothing.
    #[must_use]
    pub fn is_visible(&self, observer: EntityId, kind: TankKind, point: Vec2) -> bool {
        let Some(sight) = self.sights.get(&observer) else {
            return false;
        };
        let cell = cell_of(point);
        sight.cells.contains(&cell)
            || (kind.is_enemy() && self.shared_enabled && self.shared_pool.contains(&cell))
    }

    /// True if the centre of `target` is visible to `observer`.
    #[must_use]
    pub fn can_see(&self, observer: EntityId, kind: TankKind, target: &TankComponents) -> bool {
        self.is_visible(observer, kind, target.center())
    }
}
