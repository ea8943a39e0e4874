//! Read-only world snapshot for renderers.
//!
//! A [`WorldSnapshot`] is a plain copy of everything a renderer draws. It
//! holds no handles into the simulation, so it can be serialised, sent to
//! another thread, or kept after the match moves on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{Color, EntityId, TankKind, WallKind};
use crate::event::Winner;
use crate::geometry::Direction;

/// A tank as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankView {
    /// Entity id.
    pub id: EntityId,
    /// Top-left corner.
    pub position: Vec2,
    /// Box side.
    pub size: f32,
    /// Owning side.
    pub kind: TankKind,
    /// Colour tag.
    pub color: Color,
    /// Facing.
    pub facing: Direction,
    /// Hit points left.
    pub hit_points: u32,
    /// True while hit points remain.
    pub alive: bool,
}

/// A bullet as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    /// Entity id.
    pub id: EntityId,
    /// Top-left corner.
    pub position: Vec2,
    /// Box side.
    pub size: f32,
    /// Travel direction.
    pub direction: Direction,
}

/// A wall as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallView {
    /// Entity id.
    pub id: EntityId,
    /// Top-left corner.
    pub position: Vec2,
    /// Box side.
    pub size: f32,
    /// Material.
    pub kind: WallKind,
}

/// The base as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseView {
    /// Entity id.
    pub id: EntityId,
    /// Top-left corner.
    pub position: Vec2,
    /// Box side.
    pub size: f32,
}

/// Everything drawable at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Tanks in id order.
    pub tanks: Vec<TankView>,
    /// Bullets in id order.
    pub bullets: Vec<BulletView>,
    /// Walls in id order.
    pub walls: Vec<WallView>,
    /// The base, if standing.
    pub base: Option<BaseView>,
    /// True while enemies share vision.
    pub shared_vision: bool,
    /// Winner once the match is over.
    pub outcome: Option<Winner>,
}

impl WorldSnapshot {
    /// Captures the unflagged contents of an arena.
    #[must_use]
    pub fn capture(arena: &Arena, shared_vision: bool, outcome: Option<Winner>) -> Self {
        Self {
            tick: arena.current_tick(),
            tanks: arena
                .tanks()
                .map(|(id, t)| TankView {
                    id,
                    position: t.position,
                    size: t.size,
                    kind: t.kind,
                    color: t.color,
                    facing: t.facing,
                    hit_points: t.hit_points,
                    alive: t.is_alive(),
                })
                .collect(),
            bullets: arena
                .bullets()
                .map(|(id, b)| BulletView {
                    id,
                    position: b.position,
                    size: b.size,
                    direction: b.direction,
                })
                .collect(),
            walls: arena
                .walls()
                .map(|(id, w)| WallView {
                    id,
                    position: w.position,
                    size: w.size,
                    kind: w.kind,
                })
                .collect(),
            base: arena.base().map(|(id, b)| BaseView {
                id,
                position: b.position,
                size: b.size,
            }),
            shared_vision,
            outcome,
        }
    }

    /// True once a winner has been decided.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BaseComponents, TankComponents, WallComponents};

    #[test]
    fn capture_copies_entities() {
        let mut arena = Arena::default();
        let tank = arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(10.0, 20.0), 40.0));
        arena.spawn(WallComponents::new(WallKind::Soil, Vec2::new(80.0, 0.0), 40.0));
        arena.spawn(BaseComponents::new(Vec2::new(360.0, 480.0), 40.0));

        let snapshot = WorldSnapshot::capture(&arena, false, None);

        assert_eq!(snapshot.tanks.len(), 1);
        assert_eq!(snapshot.tanks[0].id, tank);
        assert!(snapshot.tanks[0].alive);
        assert_eq!(snapshot.walls[0].kind, WallKind::Soil);
        assert_eq!(snapshot.base.as_ref().map(|b| b.position), Some(Vec2::new(360.0, 480.0)));
        assert!(!snapshot.is_over());
    }

    #[test]
    fn snapshot_survives_json() {
        let mut arena = Arena::default();
        arena.spawn(TankComponents::new(TankKind::EnemyCommander, Vec2::new(40.0, 40.0), 40.0));
        let snapshot = WorldSnapshot::capture(&arena, true, Some(Winner::Enemy));

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
