//! Bullet-versus-tank impacts.
//!
//! A bullet damages the first living tank it overlaps that did not fire it.
//! A tank brought to zero hit points is flagged for removal and stops
//! absorbing bullets for the rest of the pass.

use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, StatusFlags};
use crate::event::{EventLog, GameEvent};

use super::Resolver;

/// Resolves bullets striking tanks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TankImpact;

impl TankImpact {
    fn first_tank_hit(arena: &Arena, bullet: EntityId) -> Option<EntityId> {
        let b = arena.get(bullet)?.as_bullet()?;
        let rect = b.rect();
        arena
            .living_tanks()
            .find(|(id, t)| *id != b.owner && rect.intersects(&t.rect()))
            .map(|(id, _)| id)
    }
}

impl Resolver for TankImpact {
    fn name(&self) -> &'static str {
        "tank_impact"
    }

    fn resolve(&self, arena: &mut Arena, events: &mut EventLog) {
        let tick = arena.current_tick();
        for bullet in arena.bullet_ids() {
            let Some(target) = Self::first_tank_hit(arena, bullet) else {
                continue;
            };
            arena.mark(bullet, StatusFlags::DESTROYED);
            let Some(tank) = arena.tank_mut(target) else {
                continue;
            };
            let destroyed = tank.hit();
            let (remaining, kind) = (tank.hit_points, tank.kind);
            events.record(
                tick,
                GameEvent::TankHit {
                    tank: target,
                    bullet,
                    remaining,
                },
            );
            debug!(%bullet, tank = %target, remaining, "bullet hit tank");
            if destroyed {
                arena.mark(target, StatusFlags::DESTROYED);
                events.record(tick, GameEvent::TankDestroyed { tank: target, kind });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BulletComponents, TankComponents, TankKind};
    use crate::geometry::Direction;
    use glam::Vec2;

    fn bullet_from(owner: EntityId, x: f32, y: f32) -> BulletComponents {
        BulletComponents {
            position: Vec2::new(x, y),
            direction: Direction::Up,
            speed: 5.0,
            size: 8.0,
            owner,
        }
    }

    #[test]
    fn owner_is_never_hit() {
        let mut arena = Arena::default();
        let me = arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(100.0, 100.0), 40.0));
        let bullet = arena.spawn(bullet_from(me, 110.0, 110.0));
        let mut events = EventLog::new();

        TankImpact.resolve(&mut arena, &mut events);

        assert!(events.is_empty());
        assert_eq!(arena.tank(me).unwrap().hit_points, 1);
        assert!(arena.get(bullet).is_some_and(|e| !e.is_destroyed()));
    }

    #[test]
    fn other_tank_is_hit_and_destroyed() {
        let mut arena = Arena::default();
        let shooter = arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(300.0, 300.0), 40.0));
        let enemy = arena.spawn(TankComponents::new(TankKind::EnemyNormal, Vec2::new(100.0, 100.0), 40.0));
        let bullet = arena.spawn(bullet_from(shooter, 110.0, 110.0));
        let mut events = EventLog::new();

        TankImpact.resolve(&mut arena, &mut events);

        assert_eq!(arena.sweep(), vec![enemy, bullet]);
        let kinds: Vec<_> = events.take().into_iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                GameEvent::TankHit {
                    tank: enemy,
                    bullet,
                    remaining: 0
                },
                GameEvent::TankDestroyed {
                    tank: enemy,
                    kind: TankKind::EnemyNormal
                },
            ]
        );
    }

    #[test]
    fn commander_survives_first_hit() {
        let mut arena = Arena::default();
        let shooter = arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(300.0, 300.0), 40.0));
        let commander =
            arena.spawn(TankComponents::new(TankKind::EnemyCommander, Vec2::new(100.0, 100.0), 40.0));
        arena.spawn(bullet_from(shooter, 110.0, 110.0));
        arena.spawn(bullet_from(shooter, 120.0, 120.0));
        arena.spawn(bullet_from(shooter, 125.0, 120.0));
        let mut events = EventLog::new();

        TankImpact.resolve(&mut arena, &mut events);

        // Two bullets finish the commander; the third flies on.
        assert!(arena.tank(commander).is_none());
        let removed = arena.sweep();
        assert_eq!(removed.len(), 3);
        assert_eq!(arena.bullets().count(), 1);
    }
}
