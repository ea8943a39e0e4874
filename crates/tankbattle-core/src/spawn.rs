//! Turning layouts and settings into arena entities.
//!
//! [`place_layout`] spawns everything a [`MapLayout`] names, tuning each tank
//! from [`Settings`] by its kind. [`spawn_roster`] adds the settings-driven
//! tank roster used by procedural maps: the player at the bottom centre, then
//! commanders, then normal enemies at random free cells in the top rows.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::entity::{
    BaseComponents, Color, EntityId, TankComponents, TankKind, WallComponents,
};
use crate::geometry::Rect;
use crate::map::MapLayout;
use crate::settings::Settings;

/// Random positions tried per enemy before the spawn is skipped.
pub const MAX_SPAWN_ATTEMPTS: u32 = 50;

/// Highest grid row an enemy may spawn on.
const ENEMY_SPAWN_MAX_ROW: u32 = 8;

/// What [`spawn_roster`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// Tanks placed, in spawn order.
    pub spawned: Vec<EntityId>,
    /// Enemy kinds that found no free position.
    pub skipped: Vec<TankKind>,
}

/// Builds a tank of `kind` with tuning from `settings`.
///
/// Player tanks take a colour picked from `player_settings.colors`.
pub fn tank_for<R: Rng + ?Sized>(
    kind: TankKind,
    position: Vec2,
    settings: &Settings,
    rng: &mut R,
) -> TankComponents {
    let size = settings.game.tank_size;
    match settings.archetype(kind) {
        Some(archetype) => archetype.build(kind, position, size),
        None => {
            let color = settings
                .player
                .colors
                .choose(rng)
                .map_or(Color::Red, |name| Color::from_name(name));
            settings.player.build(position, size, color)
        }
    }
}

/// Spawns walls, base and tanks from a layout.
///
/// Returns the ids of the spawned tanks in layout order.
pub fn place_layout<R: Rng + ?Sized>(
    arena: &mut Arena,
    layout: &MapLayout,
    settings: &Settings,
    rng: &mut R,
) -> Vec<EntityId> {
    let cell = settings.game.wall_size;
    for wall in &layout.walls {
        arena.spawn(WallComponents::new(wall.kind, wall.position, cell));
    }
    if let Some(position) = layout.base {
        arena.spawn(BaseComponents::new(position, cell));
    }
    layout
        .tanks
        .iter()
        .map(|spawn| arena.spawn(tank_for(spawn.kind, spawn.position, settings, rng)))
        .collect()
}

/// Spawns the player and the configured enemy roster.
///
/// Enemies land on random grid cells with column `1..=cols-3` and row
/// `1..=8`. A candidate is rejected if it overlaps a tank or a wall; after
/// [`MAX_SPAWN_ATTEMPTS`] rejections that enemy is skipped for the match.
pub fn spawn_roster<R: Rng + ?Sized>(
    arena: &mut Arena,
    settings: &Settings,
    rng: &mut R,
) -> SpawnReport {
    let size = settings.game.tank_size;
    let field = settings.playfield();
    let mut report = SpawnReport::default();

    let player_at = Vec2::new(
        (field.width / 2.0).floor() - (size / 2.0).floor(),
        field.height - 2.0 * size,
    );
    let player = tank_for(TankKind::Player, player_at, settings, rng);
    report.spawned.push(arena.spawn(player));

    let roster = std::iter::repeat(TankKind::EnemyCommander)
        .take(settings.enemies.commander_tank.count as usize)
        .chain(
            std::iter::repeat(TankKind::EnemyNormal)
                .take(settings.enemies.normal_tank.count as usize),
        );

    for kind in roster {
        match find_free_cell(arena, settings, rng) {
            Some(position) => {
                let id = arena.spawn(tank_for(kind, position, settings, rng));
                debug!(%id, ?kind, x = position.x, y = position.y, "enemy spawned");
                report.spawned.push(id);
            }
            None => {
                warn!(?kind, attempts = MAX_SPAWN_ATTEMPTS, "no free spawn cell; enemy skipped");
                report.skipped.push(kind);
            }
        }
    }
    report
}

#[allow(clippy::cast_precision_loss)]
fn find_free_cell<R: Rng + ?Sized>(arena: &Arena, settings: &Settings, rng: &mut R) -> Option<Vec2> {
    let cell = settings.game.wall_size;
    let size = settings.game.tank_size;
    let (cols, _) = settings.playfield().grid_dims(cell);
    let max_col = cols.saturating_sub(3).max(1);

    (0..MAX_SPAWN_ATTEMPTS).find_map(|_| {
        let col = rng.gen_range(1..=max_col);
        let row = rng.gen_range(1..=ENEMY_SPAWN_MAX_ROW);
        let position = Vec2::new(col as f32 * cell, row as f32 * cell);
        let candidate = Rect::square(position, size);

        let tank_clash = arena.tanks().any(|(_, t)| {
            (t.position.x - position.x).abs() < size && (t.position.y - position.y).abs() < size
        });
        let wall_clash = arena.walls().any(|(_, w)| candidate.intersects(&w.rect()));
        (!tank_clash && !wall_clash).then_some(position)
    })
}
