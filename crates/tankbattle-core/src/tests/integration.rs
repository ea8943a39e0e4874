//! Integration tests for the full tick pipeline.
//!
//! These drive whole matches through [`Simulation::step`] and check that
//! input, AI, vision, the impact resolvers and outcome evaluation agree:
//! - Match lifecycle (start, outcome, freeze)
//! - Movement vetoes against walls
//! - Bullet impacts on walls, tanks and the base
//! - Vision occlusion and commander-shared sight
//! - Map files feeding a match

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::{TankComponents, TankKind, WallComponents, WallKind};
use crate::event::{GameEvent, Winner};
use crate::geometry::Direction;
use crate::input::{InputFrame, Intent};
use crate::simulation::{Control, MapSource, Simulation};
use crate::vision::{cell_of, VisionSystem};

use super::helpers::{
    empty_match, events_where, run_idle, spawn_base, spawn_bullet, spawn_bystander, spawn_tank,
    spawn_wall, text_match,
};

// =============================================================================
// Lifecycle
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn lone_player_wins_and_world_freezes() {
        let mut sim = text_match("P", 1);

        assert_eq!(sim.step(&InputFrame::new()), Control::Over(Winner::Player));
        let hash = sim.state_hash();

        assert_eq!(sim.step(&InputFrame::new().with(Intent::Fire)), Control::Over(Winner::Player));
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.state_hash(), hash);
        assert!(sim.snapshot().is_over());
    }

    #[test]
    fn walled_in_player_cannot_move() {
        let mut sim = text_match("@@@\n@P@\n@@@", 2);
        spawn_bystander(&mut sim);

        let frame = sim.snapshot();
        assert_eq!(frame.walls.len(), 8);
        assert!(frame.walls.iter().all(|w| w.kind == WallKind::Metal));
        let player = frame.tanks.iter().find(|t| t.kind == TankKind::Player).unwrap();
        assert_eq!(player.position, Vec2::new(40.0, 40.0));

        let control = sim.step(&InputFrame::new().with(Intent::BeginMove(Direction::Right)));
        assert_eq!(control, Control::Running);

        let (_, player) = sim.arena().player().unwrap();
        assert_eq!(player.position, Vec2::new(40.0, 40.0));
        assert_eq!(player.facing, Direction::Right);
    }

    #[test]
    fn restart_after_defeat_starts_clean() {
        let mut sim = empty_match(3);
        let player = spawn_tank(&mut sim, TankKind::Player, Vec2::new(200.0, 300.0), Direction::Up);
        let enemy = spawn_bystander(&mut sim);
        spawn_bullet(&mut sim, Vec2::new(216.0, 316.0), Direction::Up, enemy);

        assert_eq!(sim.step(&InputFrame::new()), Control::Over(Winner::Enemy));
        assert!(sim.arena().tank(player).is_none());

        // The empty layout is replayed, so the rebuilt match is empty too.
        assert_eq!(sim.step(&InputFrame::new().with(Intent::Restart)), Control::Running);
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.outcome(), None);
        assert!(sim.arena().is_empty());
    }
}

// =============================================================================
// Combat
// =============================================================================

mod combat_tests {
    use super::*;

    /// Player at (200, 300) fires up at a wall cell at (200, 200).
    fn shoot_wall(kind: WallKind) -> (Simulation, crate::entity::EntityId) {
        let mut sim = empty_match(4);
        spawn_tank(&mut sim, TankKind::Player, Vec2::new(200.0, 300.0), Direction::Up);
        spawn_bystander(&mut sim);
        let wall = spawn_wall(&mut sim, kind, Vec2::new(200.0, 200.0));

        assert_eq!(sim.step(&InputFrame::new().with(Intent::Fire)), Control::Running);
        assert_eq!(run_idle(&mut sim, 20), Control::Running);
        (sim, wall)
    }

    #[test]
    fn soil_wall_is_destroyed_with_the_bullet() {
        let (mut sim, wall) = shoot_wall(WallKind::Soil);
        let events = sim.take_events();

        assert_eq!(events_where(&events, |e| *e == GameEvent::WallDestroyed { wall }).len(), 1);
        assert_eq!(sim.arena().walls().count(), 0);
        assert_eq!(sim.arena().bullets().count(), 0);
    }

    #[test]
    fn metal_wall_stops_the_bullet_and_stands() {
        let (mut sim, wall) = shoot_wall(WallKind::Metal);
        let events = sim.take_events();

        let stopped = events_where(
            &events,
            |e| matches!(e, GameEvent::BulletStopped { wall: w, .. } if *w == wall),
        );
        assert_eq!(stopped.len(), 1);
        assert!(events_where(&events, |e| matches!(e, GameEvent::WallDestroyed { .. })).is_empty());
        assert_eq!(sim.arena().walls().count(), 1);
        assert_eq!(sim.arena().bullets().count(), 0);
    }

    #[test]
    fn own_bullet_passes_through_owner() {
        let mut sim = empty_match(5);
        let player = spawn_tank(&mut sim, TankKind::Player, Vec2::new(200.0, 300.0), Direction::Up);
        spawn_bystander(&mut sim);
        spawn_bullet(&mut sim, Vec2::new(216.0, 316.0), Direction::Up, player);

        assert_eq!(sim.step(&InputFrame::new()), Control::Running);
        assert_eq!(sim.arena().tank(player).map(|t| t.hit_points), Some(1));
        assert!(events_where(&sim.take_events(), |e| matches!(e, GameEvent::TankHit { .. })).is_empty());
        assert_eq!(sim.arena().bullets().count(), 1);
    }

    #[test]
    fn shooting_the_last_enemy_wins() {
        let mut sim = empty_match(6);
        let player = spawn_tank(&mut sim, TankKind::Player, Vec2::new(200.0, 300.0), Direction::Up);
        let enemy = spawn_tank(&mut sim, TankKind::EnemyNormal, Vec2::new(200.0, 100.0), Direction::Up);
        // Overlaps the enemy wherever its first patrol step takes it.
        spawn_bullet(&mut sim, Vec2::new(216.0, 140.0), Direction::Up, player);

        assert_eq!(sim.step(&InputFrame::new()), Control::Over(Winner::Player));
        let events = sim.take_events();
        assert_eq!(
            events_where(&events, |e| *e == GameEvent::TankDestroyed {
                tank: enemy,
                kind: TankKind::EnemyNormal
            })
            .len(),
            1
        );
        assert_eq!(
            events.last().map(|e| &e.event),
            Some(&GameEvent::MatchOver { winner: Winner::Player })
        );
    }

    #[test]
    fn commander_survives_one_hit() {
        let mut sim = empty_match(7);
        let player = spawn_tank(&mut sim, TankKind::Player, Vec2::new(200.0, 300.0), Direction::Up);
        let commander =
            spawn_tank(&mut sim, TankKind::EnemyCommander, Vec2::new(200.0, 100.0), Direction::Up);
        spawn_bullet(&mut sim, Vec2::new(216.0, 140.0), Direction::Up, player);

        assert_eq!(sim.step(&InputFrame::new()), Control::Running);
        assert_eq!(sim.arena().tank(commander).map(|t| t.hit_points), Some(1));
        let events = sim.take_events();
        let hits = events_where(
            &events,
            |e| matches!(e, GameEvent::TankHit { tank, remaining: 1, .. } if *tank == commander),
        );
        assert_eq!(hits.len(), 1);
        assert!(events_where(&events, |e| matches!(e, GameEvent::TankDestroyed { .. })).is_empty());
    }

    #[test]
    fn enemy_bullet_on_base_loses_the_match() {
        let mut sim = empty_match(8);
        spawn_tank(&mut sim, TankKind::Player, Vec2::new(40.0, 500.0), Direction::Up);
        let enemy =
            spawn_tank(&mut sim, TankKind::EnemyNormal, Vec2::new(360.0, 235.0), Direction::Down);
        spawn_base(&mut sim, Vec2::new(360.0, 280.0));

        let shot = sim
            .arena_mut()
            .tank_mut(enemy)
            .and_then(|tank| tank.try_shoot(0, enemy, 8.0, 5.0))
            .unwrap();
        assert_eq!(shot.position, Vec2::new(376.0, 280.0));
        assert_eq!(shot.owner, enemy);
        let bullet = sim.arena_mut().spawn(shot);

        assert_eq!(sim.step(&InputFrame::new()), Control::Over(Winner::Enemy));
        assert!(sim.snapshot().base.is_none());
        let events = sim.take_events();
        assert_eq!(
            events_where(&events, |e| *e == GameEvent::BaseDestroyed { bullet }).len(),
            1
        );
    }

    #[test]
    fn enemy_that_sees_the_player_hunts_it_down() {
        let mut sim = empty_match(9);
        let player = spawn_tank(&mut sim, TankKind::Player, Vec2::new(300.0, 300.0), Direction::Up);
        let tank = TankComponents::new(TankKind::EnemyNormal, Vec2::new(300.0, 150.0), 40.0)
            .with_facing(Direction::Down)
            .with_vision_range(300.0);
        let enemy = sim.arena_mut().spawn(tank);

        assert_eq!(run_idle(&mut sim, 60), Control::Over(Winner::Enemy));

        let events = sim.take_events();
        let first = &events[0];
        assert_eq!(first.tick, 0);
        assert!(matches!(
            first.event,
            GameEvent::AiStateChanged { tank, to: crate::ai::AiMode::Attack, .. } if tank == enemy
        ));
        assert!(!events_where(
            &events,
            |e| matches!(e, GameEvent::BulletFired { owner, .. } if *owner == enemy)
        )
        .is_empty());
        let destroyed = events_where(
            &events,
            |e| matches!(e, GameEvent::TankDestroyed { tank, .. } if *tank == player),
        );
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].tick, 19);
    }
}

// =============================================================================
// Vision
// =============================================================================

mod vision_tests {
    use super::*;

    #[test]
    fn walls_hide_tanks_behind_them() {
        let mut arena = Arena::default();
        let player = arena.spawn(
            TankComponents::new(TankKind::Player, Vec2::new(100.0, 300.0), 40.0)
                .with_facing(Direction::Right),
        );
        let enemy =
            arena.spawn(TankComponents::new(TankKind::EnemyNormal, Vec2::new(220.0, 300.0), 40.0));

        let mut vision = VisionSystem::new();
        vision.recompute(&arena);
        let target = arena.tank(enemy).unwrap().clone();
        assert!(vision.can_see(player, TankKind::Player, &target));

        arena.spawn(WallComponents::new(WallKind::Metal, Vec2::new(160.0, 300.0), 40.0));
        vision.recompute(&arena);
        assert!(!vision.can_see(player, TankKind::Player, &target));
    }

    #[test]
    fn commander_shares_sight_until_it_dies() {
        let mut arena = Arena::default();
        let commander = arena.spawn(
            TankComponents::new(TankKind::EnemyCommander, Vec2::new(400.0, 100.0), 40.0)
                .with_facing(Direction::Down),
        );
        let grunt =
            arena.spawn(TankComponents::new(TankKind::EnemyNormal, Vec2::new(0.0, 0.0), 40.0));
        let player =
            arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(400.0, 180.0), 40.0));
        let target = arena.tank(player).unwrap().clone();

        let mut vision = VisionSystem::new();
        vision.recompute(&arena);
        assert!(vision.shared_vision_enabled());
        assert!(!vision.cells(grunt).unwrap().contains(&cell_of(target.center())));
        assert!(vision.can_see(grunt, TankKind::EnemyNormal, &target));

        arena.tank_mut(commander).unwrap().hit_points = 0;
        vision.recompute(&arena);
        assert!(!vision.shared_vision_enabled());
        assert!(vision.shared_pool().is_empty());
        assert!(!vision.can_see(grunt, TankKind::EnemyNormal, &target));
    }

    #[test]
    fn snapshot_reports_shared_vision() {
        let mut sim = empty_match(10);
        spawn_tank(&mut sim, TankKind::Player, Vec2::new(40.0, 500.0), Direction::Up);
        spawn_tank(&mut sim, TankKind::EnemyCommander, Vec2::new(700.0, 40.0), Direction::Up);

        assert!(!sim.snapshot().shared_vision);
        sim.step(&InputFrame::new());
        assert!(sim.snapshot().shared_vision);
    }
}

// =============================================================================
// Map files
// =============================================================================

mod map_file_tests {
    use super::*;

    #[test]
    fn saved_map_starts_the_same_world() {
        let sim = text_match("#@..\n.B..\nP..E", 11);
        let layout = sim.export_layout();
        let settings = sim.settings().clone();

        let path = std::env::temp_dir().join(format!("tankbattle-map-{}.txt", std::process::id()));
        crate::map::save_file(&path, &layout, settings.game.wall_size, &settings.playfield())
            .unwrap();

        let mut reloaded = Simulation::new(settings, 11).unwrap();
        reloaded.start_match_from_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(reloaded.source(), MapSource::File(_)));
        assert_eq!(reloaded.export_layout(), layout);
        assert_eq!(sim.arena().walls().count(), 2);
    }
}
