//! Bullet integration.

use tracing::trace;

use crate::arena::Arena;
use crate::entity::StatusFlags;
use crate::event::{EventLog, GameEvent};

use super::Resolver;

/// Advances every bullet one tick and flags those that left the playfield.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletMotion;

impl Resolver for BulletMotion {
    fn name(&self) -> &'static str {
        "bullet_motion"
    }

    fn resolve(&self, arena: &mut Arena, events: &mut EventLog) {
        let tick = arena.current_tick();
        let field = *arena.playfield();
        for id in arena.bullet_ids() {
            let Some(bullet) = arena.get_mut(id).and_then(|e| e.as_bullet_mut()) else {
                continue;
            };
            bullet.advance();
            if bullet.is_offscreen(&field) {
                trace!(%id, x = bullet.position.x, y = bullet.position.y, "bullet left the field");
                arena.mark(id, StatusFlags::OUT_OF_BOUNDS);
                events.record(tick, GameEvent::BulletExpired { bullet: id });
            }
        }
    }
}
