//! Test helper functions for setting up matches and entities.
//!
//! These build scenarios by hand on an empty layout so each test controls
//! exactly which tanks, walls and bullets exist.

use glam::Vec2;

use crate::entity::{
    BaseComponents, BulletComponents, EntityId, TankComponents, TankKind, WallComponents,
    WallKind,
};
use crate::event::{GameEvent, TimedEvent};
use crate::geometry::Direction;
use crate::input::InputFrame;
use crate::map::MapLayout;
use crate::settings::Settings;
use crate::simulation::{Control, Simulation};

// =============================================================================
// Scenario Setup
// =============================================================================

/// Starts a match on an empty layout with default settings.
///
/// The arena holds no entities, so callers must spawn at least one enemy
/// before the first step or the player wins immediately.
pub fn empty_match(seed: u64) -> Simulation {
    let mut sim = Simulation::new(Settings::default(), seed).unwrap();
    sim.start_match(MapLayout::default());
    sim.take_events();
    sim
}

/// Starts a match from map text with default settings.
pub fn text_match(text: &str, seed: u64) -> Simulation {
    let settings = Settings::default();
    let layout = crate::map::parse(text, settings.game.wall_size, &settings.playfield()).unwrap();
    let mut sim = Simulation::new(settings, seed).unwrap();
    sim.start_match(layout);
    sim
}

// =============================================================================
// Entity Factory Functions
// =============================================================================

/// Spawns a stock 40-unit tank of `kind` facing `facing`.
pub fn spawn_tank(sim: &mut Simulation, kind: TankKind, at: Vec2, facing: Direction) -> EntityId {
    let tank = TankComponents::new(kind, at, 40.0).with_facing(facing);
    sim.arena_mut().spawn(tank)
}

/// Spawns an enemy parked in the top-right corner, out of everyone's way.
pub fn spawn_bystander(sim: &mut Simulation) -> EntityId {
    spawn_tank(sim, TankKind::EnemyNormal, Vec2::new(740.0, 20.0), Direction::Up)
}

/// Spawns a wall cell.
pub fn spawn_wall(sim: &mut Simulation, kind: WallKind, at: Vec2) -> EntityId {
    sim.arena_mut().spawn(WallComponents::new(kind, at, 40.0))
}

/// Spawns the base.
pub fn spawn_base(sim: &mut Simulation, at: Vec2) -> EntityId {
    sim.arena_mut().spawn(BaseComponents::new(at, 40.0))
}

/// Spawns a stock bullet.
pub fn spawn_bullet(
    sim: &mut Simulation,
    at: Vec2,
    direction: Direction,
    owner: EntityId,
) -> EntityId {
    sim.arena_mut().spawn(BulletComponents {
        position: at,
        direction,
        speed: 5.0,
        size: 8.0,
        owner,
    })
}

// =============================================================================
// Running
// =============================================================================

/// Steps with no input until the match stops running or `ticks` elapse.
pub fn run_idle(sim: &mut Simulation, ticks: u64) -> Control {
    let mut control = Control::Running;
    for _ in 0..ticks {
        control = sim.step(&InputFrame::new());
        if control != Control::Running {
            break;
        }
    }
    control
}

/// Events matching a predicate.
pub fn events_where(events: &[TimedEvent], pred: impl Fn(&GameEvent) -> bool) -> Vec<&TimedEvent> {
    events.iter().filter(|e| pred(&e.event)).collect()
}
