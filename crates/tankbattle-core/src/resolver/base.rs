//! Bullet-versus-base impacts.
//!
//! Any bullet reaching the base destroys it, whoever fired. The simulation
//! reads the missing base after the sweep as an enemy victory.

use tracing::info;

use crate::arena::Arena;
use crate::entity::StatusFlags;
use crate::event::{EventLog, GameEvent};

use super::Resolver;

/// Resolves bullets striking the base.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseImpact;

impl Resolver for BaseImpact {
    fn name(&self) -> &'static str {
        "base_impact"
    }

    fn resolve(&self, arena: &mut Arena, events: &mut EventLog) {
        let tick = arena.current_tick();
        let Some((base, rect)) = arena.base().map(|(id, b)| (id, b.rect())) else {
            return;
        };
        let hits: Vec<_> = arena
            .bullets()
            .filter(|(_, b)| rect.intersects(&b.rect()))
            .map(|(id, _)| id)
            .collect();
        let Some(&first) = hits.first() else {
            return;
        };
        for bullet in &hits {
            arena.mark(*bullet, StatusFlags::DESTROYED);
        }
        arena.mark(base, StatusFlags::DESTROYED);
        events.record(tick, GameEvent::BaseDestroyed { bullet: first });
        info!(bullet = %first, "base destroyed");
    }
}
