//! Bullet-versus-wall impacts.
//!
//! Every bullet stops at the first unflagged wall it overlaps (walls in id
//! order). Soil walls are destroyed by the impact; metal walls survive.

use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, StatusFlags, WallKind};
use crate::event::{EventLog, GameEvent};

use super::Resolver;

/// Resolves bullets striking walls.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallImpact;

impl WallImpact {
    fn first_wall_hit(arena: &Arena, bullet: EntityId) -> Option<(EntityId, WallKind)> {
        let rect = arena.get(bullet)?.as_bullet()?.rect();
        arena
            .walls()
            .find(|(_, w)| rect.intersects(&w.rect()))
            .map(|(id, w)| (id, w.kind))
    }
}

impl Resolver for WallImpact {
    fn name(&self) -> &'static str {
        "wall_impact"
    }

    fn resolve(&self, arena: &mut Arena, events: &mut EventLog) {
        let tick = arena.current_tick();
        for bullet in arena.bullet_ids() {
            let Some((wall, kind)) = Self::first_wall_hit(arena, bullet) else {
                continue;
            };
            arena.mark(bullet, StatusFlags::DESTROYED);
            events.record(tick, GameEvent::BulletStopped { bullet, wall });
            if kind == WallKind::Soil {
                arena.mark(wall, StatusFlags::DESTROYED);
                events.record(tick, GameEvent::WallDestroyed { wall });
            }
            debug!(%bullet, %wall, ?kind, "bullet hit wall");
        }
    }
}
