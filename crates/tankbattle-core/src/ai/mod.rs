//! AI engine: a small state machine per enemy tank.
//!
//! Each AI tank runs one of three behaviours ([`AiMode`]). Every tick the
//! engine counts down the tank's attack cooldown, re-decides its mode when the
//! profile's decision interval has elapsed, then runs the current behaviour:
//!
//! - **Patrol**: steer to a random waypoint, re-rolling it when reached or
//!   after [`STUCK_LIMIT`] ticks without progress, and occasionally turn at
//!   random.
//! - **Attack**: face and chase the target, firing when within
//!   [`ATTACK_RANGE`] and the attack cooldown allows. A dead or missing
//!   target drops the tank back to Patrol on the same tick.
//! - **Defend**: steer to a random point [`DEFEND_RADIUS`] from the base,
//!   switching to Attack as soon as the player is visible.
//!
//! Distances and steering targets are measured between top-left corners.
//!
//! State lives here keyed by [`EntityId`], not on the tank, so player tanks
//! carry none of it.

mod state;
pub mod steering;

pub use state::{AiMode, AiState, ARRIVAL_RADIUS, ATTACK_COOLDOWN_TICKS, STUCK_LIMIT};

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::arena::Arena;
use crate::entity::{AiProfile, EntityId, TankKind};
use crate::event::{EventLog, GameEvent};
use crate::geometry::Direction;
use crate::settings::Settings;
use crate::vision::VisionSystem;

use steering::move_towards;

/// Distance under which an attacking tank fires.
pub const ATTACK_RANGE: f32 = 200.0;

/// Distance from the base centre a defending tank aims for.
pub const DEFEND_RADIUS: f32 = 100.0;

/// Everything a tick of AI needs besides the arena.
pub struct AiContext<'a, R: Rng + ?Sized> {
    /// Visibility computed at the start of the tick.
    pub vision: &'a VisionSystem,
    /// Bullet size and speed, tank size and tick rate.
    pub settings: &'a Settings,
    /// Simulated time of this tick.
    pub now_ms: u64,
    /// Match RNG.
    pub rng: &'a mut R,
    /// Receives state changes and shots.
    pub events: &'a mut EventLog,
}

/// Owns the state machine of every AI tank.
#[derive(Debug, Clone, Default)]
pub struct AiEngine {
    states: BTreeMap<EntityId, AiState>,
}

impl AiEngine {
    /// Creates an engine with no tracked tanks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of one AI tank, if it has been updated at least once.
    #[must_use]
    pub fn state(&self, id: EntityId) -> Option<&AiState> {
        self.states.get(&id)
    }

    /// Number of tracked tanks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no tank is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drops every tracked state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Runs one tick for every living AI tank, in id order.
    ///
    /// Tanks act one after another against the live arena, so a tank that
    /// moves first can block one that moves later. State for tanks that no
    /// longer exist is discarded.
    pub fn update<R: Rng + ?Sized>(&mut self, arena: &mut Arena, ctx: &mut AiContext<'_, R>) {
        self.states.retain(|id, _| arena.tank(*id).is_some_and(|t| t.is_alive()));

        let pilots: Vec<(EntityId, TankKind, AiProfile)> = arena
            .living_tanks()
            .filter_map(|(id, t)| t.ai_profile().map(|p| (id, t.kind, *p)))
            .collect();

        for (id, kind, profile) in pilots {
            let state = self.states.entry(id).or_default();
            state.cool_down();
            if state.decision_due(ctx.now_ms, profile.decision_interval_ms) {
                decide(arena, id, kind, state, ctx);
                state.last_decision_ms = Some(ctx.now_ms);
            }
            match state.mode {
                AiMode::Patrol => patrol(arena, id, &profile, state, ctx),
                AiMode::Attack => attack(arena, id, state, ctx),
                AiMode::Defend => defend(arena, id, kind, state, ctx),
            }
        }
    }
}

// =============================================================================
// Behaviours
// =============================================================================

fn transition<R: Rng + ?Sized>(
    id: EntityId,
    state: &mut AiState,
    mode: AiMode,
    tick: u64,
    ctx: &mut AiContext<'_, R>,
) {
    if let Some(from) = state.switch(mode) {
        debug!(tank = %id, %from, to = %mode, "ai mode changed");
        ctx.events.record(tick, GameEvent::AiStateChanged { tank: id, from, to: mode });
    }
}

fn visible_player<R: Rng + ?Sized>(
    arena: &Arena,
    id: EntityId,
    kind: TankKind,
    ctx: &AiContext<'_, R>,
) -> Option<EntityId> {
    let (player, tank) = arena.player()?;
    ctx.vision.can_see(id, kind, tank).then_some(player)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn random_waypoint<R: Rng + ?Sized>(arena: &Arena, size: f32, rng: &mut R) -> Vec2 {
    let field = arena.playfield();
    let lo = size as i32;
    let hi_x = ((field.width - size) as i32).max(lo);
    let hi_y = ((field.height - size) as i32).max(lo);
    Vec2::new(rng.gen_range(lo..=hi_x) as f32, rng.gen_range(lo..=hi_y) as f32)
}

fn decide<R: Rng + ?Sized>(
    arena: &Arena,
    id: EntityId,
    kind: TankKind,
    state: &mut AiState,
    ctx: &mut AiContext<'_, R>,
) {
    let tick = arena.current_tick();
    if let Some(player) = visible_player(arena, id, kind, ctx) {
        state.target = Some(player);
        transition(id, state, AiMode::Attack, tick, ctx);
    } else if kind == TankKind::EnemyCommander {
        transition(id, state, AiMode::Defend, tick, ctx);
    } else {
        transition(id, state, AiMode::Patrol, tick, ctx);
        let Some(tank) = arena.tank(id) else {
            return;
        };
        let reached = state
            .waypoint
            .is_some_and(|w| tank.position.distance(w) < ARRIVAL_RADIUS);
        if state.waypoint.is_none() || reached {
            state.waypoint = Some(random_waypoint(arena, tank.size, &mut *ctx.rng));
        }
    }
}

fn patrol<R: Rng + ?Sized>(
    arena: &mut Arena,
    id: EntityId,
    profile: &AiProfile,
    state: &mut AiState,
    ctx: &mut AiContext<'_, R>,
) {
    let Some(size) = arena.tank(id).map(|t| t.size) else {
        return;
    };
    let waypoint = match state.waypoint {
        Some(w) => w,
        None => {
            state.stuck_ticks = 0;
            *state.waypoint.insert(random_waypoint(arena, size, &mut *ctx.rng))
        }
    };

    let before = arena.tank(id).map_or(0.0, |t| t.position.distance(waypoint));
    move_towards(arena, id, waypoint);
    let after = arena.tank(id).map_or(0.0, |t| t.position.distance(waypoint));

    if after >= before {
        state.stuck_ticks += 1;
        if state.stuck_ticks >= STUCK_LIMIT {
            state.waypoint = Some(random_waypoint(arena, size, &mut *ctx.rng));
            state.stuck_ticks = 0;
        }
    } else {
        state.stuck_ticks = 0;
    }
    if after < ARRIVAL_RADIUS {
        state.waypoint = Some(random_waypoint(arena, size, &mut *ctx.rng));
        state.stuck_ticks = 0;
    }

    if ctx.rng.gen::<f32>() < profile.direction_change_chance {
        if let (Some(&facing), Some(tank)) = (Direction::ALL.choose(&mut *ctx.rng), arena.tank_mut(id)) {
            tank.rotate(facing);
        }
    }
}

fn attack<R: Rng + ?Sized>(
    arena: &mut Arena,
    id: EntityId,
    state: &mut AiState,
    ctx: &mut AiContext<'_, R>,
) {
    let tick = arena.current_tick();
    let target = state
        .target
        .and_then(|t| arena.tank(t).filter(|tank| tank.is_alive()).map(|tank| tank.position));
    let (Some(goal), Some(own)) = (target, arena.tank(id).map(|t| t.position)) else {
        state.target = None;
        transition(id, state, AiMode::Patrol, tick, ctx);
        return;
    };

    let offset = goal - own;
    let facing = if offset.x.abs() >= offset.y.abs() {
        if offset.x > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if offset.y > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    };
    if let Some(tank) = arena.tank_mut(id) {
        tank.rotate(facing);
    }
    move_towards(arena, id, goal);

    if offset.length() < ATTACK_RANGE && state.attack_cooldown == 0 {
        let game = &ctx.settings.game;
        let shot = arena
            .tank_mut(id)
            .and_then(|t| t.try_shoot(ctx.now_ms, id, game.bullet_size, ctx.settings.bullet.speed));
        if let Some(bullet) = shot {
            let bullet = arena.spawn(bullet);
            ctx.events.record(tick, GameEvent::BulletFired { bullet, owner: id });
            state.attack_cooldown = ATTACK_COOLDOWN_TICKS;
        }
    }
}

fn defend<R: Rng + ?Sized>(
    arena: &mut Arena,
    id: EntityId,
    kind: TankKind,
    state: &mut AiState,
    ctx: &mut AiContext<'_, R>,
) {
    let tick = arena.current_tick();
    let Some(centre) = arena.base().map(|(_, b)| b.center()) else {
        transition(id, state, AiMode::Patrol, tick, ctx);
        return;
    };
    let Some(size) = arena.tank(id).map(|t| t.size) else {
        return;
    };

    let angle = ctx.rng.gen_range(0.0..TAU);
    let field = arena.playfield();
    let post = centre + Vec2::from_angle(angle) * DEFEND_RADIUS;
    let post = post.clamp(
        Vec2::splat(size),
        Vec2::new(field.width - size, field.height - size).max(Vec2::splat(size)),
    );
    move_towards(arena, id, post);

    if let Some(player) = visible_player(arena, id, kind, ctx) {
        state.target = Some(player);
        transition(id, state, AiMode::Attack, tick, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{BaseComponents, TankComponents, WallComponents, WallKind};
    use rand::SeedableRng;
    use std::collections::BTreeSet;
    use rand_chacha::ChaCha8Rng;

    struct Rig {
        arena: Arena,
        vision: VisionSystem,
        settings: Settings,
        rng: ChaCha8Rng,
        events: EventLog,
        engine: AiEngine,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                arena: Arena::default(),
                vision: VisionSystem::new(),
                settings: Settings::default(),
                rng: ChaCha8Rng::seed_from_u64(3),
                events: EventLog::new(),
                engine: AiEngine::new(),
            }
        }

        fn tick(&mut self) {
            self.vision.recompute(&self.arena);
            let now_ms = self.settings.tick_to_ms(self.arena.current_tick());
            let mut ctx = AiContext {
                vision: &self.vision,
                settings: &self.settings,
                now_ms,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            self.engine.update(&mut self.arena, &mut ctx);
            self.arena.advance_tick();
        }

        fn mode(&self, id: EntityId) -> AiMode {
            self.engine.state(id).unwrap().mode
        }
    }

    fn piloted(kind: TankKind, x: f32, y: f32, direction_change_chance: f32) -> TankComponents {
        TankComponents::new(kind, Vec2::new(x, y), 40.0).with_pilot(crate::entity::Pilot::Ai(
            AiProfile {
                direction_change_chance,
                ..AiProfile::default()
            },
        ))
    }

    fn quiet(kind: TankKind, x: f32, y: f32) -> TankComponents {
        piloted(kind, x, y, 0.0)
    }

    mod decision_tests {
        use super::*;

        #[test]
        fn player_tanks_get_no_state() {
            let mut rig = Rig::new();
            let player = rig.arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(100.0, 500.0), 40.0));
            rig.tick();
            assert!(rig.engine.state(player).is_none());
            assert!(rig.engine.is_empty());
        }

        #[test]
        fn unseen_normal_patrols_with_waypoint() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 100.0, 100.0));
            rig.tick();

            let state = rig.engine.state(enemy).unwrap();
            assert_eq!(state.mode, AiMode::Patrol);
            let w = state.waypoint.unwrap();
            assert!((40.0..=760.0).contains(&w.x) && (40.0..=560.0).contains(&w.y));
            assert_eq!(w, w.round());
        }

        #[test]
        fn commander_defends() {
            let mut rig = Rig::new();
            rig.arena.spawn(BaseComponents::new(Vec2::new(360.0, 480.0), 40.0));
            let commander = rig.arena.spawn(quiet(TankKind::EnemyCommander, 100.0, 100.0));
            rig.tick();
            assert_eq!(rig.mode(commander), AiMode::Defend);
        }

        #[test]
        fn defend_without_base_patrols() {
            let mut rig = Rig::new();
            let commander = rig.arena.spawn(quiet(TankKind::EnemyCommander, 100.0, 100.0));
            rig.tick();
            assert_eq!(rig.mode(commander), AiMode::Patrol);
            assert!(rig.events.pending().iter().any(|e| matches!(
                e.event,
                GameEvent::AiStateChanged { from: AiMode::Defend, to: AiMode::Patrol, .. }
            )));
        }

        #[test]
        fn visible_player_triggers_attack() {
            let mut rig = Rig::new();
            // Enemy faces up by default; put the player straight above it.
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 380.0, 300.0));
            let player = rig.arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(380.0, 220.0), 40.0));
            rig.tick();

            let state = rig.engine.state(enemy).unwrap();
            assert_eq!(state.mode, AiMode::Attack);
            assert_eq!(state.target, Some(player));
        }

        #[test]
        fn decisions_wait_for_interval() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 380.0, 300.0));
            rig.tick();
            assert_eq!(rig.mode(enemy), AiMode::Patrol);

            // Player appears in view, but the next decision is 1000 ms away.
            let facing = rig.arena.tank(enemy).unwrap().facing;
            let ahead = rig.arena.tank(enemy).unwrap().position + facing.unit() * 80.0;
            rig.arena.spawn(TankComponents::new(TankKind::Player, ahead, 40.0));
            rig.tick();
            assert_eq!(rig.mode(enemy), AiMode::Patrol);
        }
    }

    mod attack_tests {
        use super::*;

        fn engaged() -> (Rig, EntityId, EntityId) {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 380.0, 300.0));
            let player = rig.arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(380.0, 220.0), 40.0));
            rig.tick();
            (rig, enemy, player)
        }

        #[test]
        fn attacker_fires_and_cools_down() {
            let (rig, enemy, player) = engaged();
            let fired: Vec<_> = rig
                .events
                .pending()
                .iter()
                .filter(|e| matches!(e.event, GameEvent::BulletFired { owner, .. } if owner == enemy))
                .collect();
            assert_eq!(fired.len(), 1);
            assert_eq!(rig.engine.state(enemy).unwrap().attack_cooldown, ATTACK_COOLDOWN_TICKS);
            assert_eq!(rig.arena.tank(enemy).unwrap().facing, Direction::Up);
            assert!(rig.arena.tank(player).is_some());
        }

        #[test]
        fn dead_target_reverts_to_patrol_next_tick() {
            let (mut rig, enemy, player) = engaged();
            rig.arena.tank_mut(player).unwrap().hit();
            rig.tick();

            let state = rig.engine.state(enemy).unwrap();
            assert_eq!(state.mode, AiMode::Patrol);
            assert_eq!(state.target, None);
        }

        #[test]
        fn removed_target_reverts_to_patrol() {
            let (mut rig, enemy, player) = engaged();
            rig.arena.despawn(player);
            rig.tick();
            assert_eq!(rig.mode(enemy), AiMode::Patrol);
        }

        #[test]
        fn out_of_range_does_not_fire() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 380.0, 300.0));
            let player = rig.arena.spawn(TankComponents::new(TankKind::Player, Vec2::new(380.0, 40.0), 40.0));
            rig.engine.states.insert(
                enemy,
                AiState {
                    mode: AiMode::Attack,
                    target: Some(player),
                    last_decision_ms: Some(0),
                    ..AiState::new()
                },
            );
            rig.arena.advance_tick();
            rig.tick();

            assert_eq!(rig.mode(enemy), AiMode::Attack);
            assert_eq!(rig.arena.bullets().count(), 0);
            assert_eq!(rig.arena.tank(enemy).unwrap().position, Vec2::new(380.0, 298.0));
        }
    }

    mod patrol_tests {
        use super::*;

        #[test]
        fn stuck_tank_rerolls_waypoint() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 100.0, 100.0));
            for (x, y) in [(140.0, 100.0), (60.0, 100.0), (100.0, 140.0), (100.0, 60.0)] {
                rig.arena.spawn(WallComponents::new(WallKind::Metal, Vec2::new(x, y), 40.0));
            }
            rig.tick();
            let first = rig.engine.state(enemy).unwrap().waypoint;
            for _ in 1..STUCK_LIMIT {
                rig.tick();
            }
            let state = rig.engine.state(enemy).unwrap();
            assert_eq!(state.stuck_ticks, 0);
            assert_ne!(state.waypoint, first);
        }

        #[test]
        fn state_is_dropped_for_dead_tanks() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 100.0, 100.0));
            rig.tick();
            rig.arena.tank_mut(enemy).unwrap().hit();
            rig.tick();
            assert!(rig.engine.state(enemy).is_none());
        }

        #[test]
        fn restless_patroller_looks_around() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(piloted(TankKind::EnemyNormal, 380.0, 280.0, 1.0));

            let mut facings = BTreeSet::new();
            let mut turned_away = 0;
            for _ in 0..40 {
                let before = rig.arena.tank(enemy).unwrap().position;
                rig.tick();
                assert_eq!(rig.mode(enemy), AiMode::Patrol);
                let tank = rig.arena.tank(enemy).unwrap();
                if tank.position - before != tank.facing.unit() * tank.speed {
                    turned_away += 1;
                }
                facings.insert(tank.facing);
            }
            assert!(facings.len() > 1);
            assert!(turned_away > 0);
        }

        #[test]
        fn steady_patroller_faces_where_it_moves() {
            let mut rig = Rig::new();
            let enemy = rig.arena.spawn(quiet(TankKind::EnemyNormal, 380.0, 280.0));

            let mut facing = rig.arena.tank(enemy).unwrap().facing;
            for _ in 0..40 {
                let before = rig.arena.tank(enemy).unwrap().position;
                rig.tick();
                let tank = rig.arena.tank(enemy).unwrap();
                let moved = tank.position - before;
                if moved == Vec2::ZERO {
                    assert_eq!(tank.facing, facing);
                } else {
                    assert_eq!(moved, tank.facing.unit() * tank.speed);
                }
                facing = tank.facing;
            }
        }
    }

    mod defend_tests {
        use super::*;

        fn base_centre(rig: &Rig) -> Vec2 {
            rig.arena.base().unwrap().1.center()
        }

        #[test]
        fn defender_attacks_player_seen_between_decisions() {
            let mut rig = Rig::new();
            rig.arena.spawn(BaseComponents::new(Vec2::new(360.0, 480.0), 40.0));
            let commander = rig.arena.spawn(quiet(TankKind::EnemyCommander, 380.0, 300.0));
            rig.tick();
            assert_eq!(rig.mode(commander), AiMode::Defend);
            assert_eq!(rig.engine.state(commander).unwrap().last_decision_ms, Some(0));

            let tank = rig.arena.tank(commander).unwrap();
            let ahead = tank.position + tank.facing.unit() * 60.0;
            let player = rig.arena.spawn(TankComponents::new(TankKind::Player, ahead, 40.0));
            rig.tick();

            let state = rig.engine.state(commander).unwrap();
            assert_eq!(state.mode, AiMode::Attack);
            assert_eq!(state.target, Some(player));
            assert_eq!(state.last_decision_ms, Some(0));
        }

        #[test]
        fn defender_closes_in_on_its_base() {
            let mut rig = Rig::new();
            rig.arena.spawn(BaseComponents::new(Vec2::new(360.0, 480.0), 40.0));
            let commander = rig.arena.spawn(quiet(TankKind::EnemyCommander, 40.0, 40.0));
            let centre = base_centre(&rig);

            let mut distance = rig.arena.tank(commander).unwrap().center().distance(centre);
            for _ in 0..50 {
                rig.tick();
                assert_eq!(rig.mode(commander), AiMode::Defend);
                let now = rig.arena.tank(commander).unwrap().center().distance(centre);
                assert!(now < distance, "{now} >= {distance}");
                distance = now;
            }
        }

        #[test]
        fn defender_posts_stay_on_the_field() {
            let mut rig = Rig::new();
            rig.arena.spawn(BaseComponents::new(Vec2::ZERO, 40.0));
            let commander = rig.arena.spawn(quiet(TankKind::EnemyCommander, 300.0, 300.0));

            for _ in 0..1000 {
                rig.tick();
            }
            // Every post clamps into [40, 120] on both axes; steering may
            // overshoot by one step.
            let position = rig.arena.tank(commander).unwrap().position;
            assert!((38.0..=122.0).contains(&position.x), "{position}");
            assert!((38.0..=122.0).contains(&position.y), "{position}");
        }
    }
}
