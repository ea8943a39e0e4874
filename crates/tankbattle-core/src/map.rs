//! Map layouts: the text grid codec, file I/O and procedural generation.
//!
//! A [`MapLayout`] is the bootstrap payload for a match: wall cells with
//! their material, an optional base cell, and tank spawn points with their
//! kind. Layouts come from three places:
//!
//! - [`parse`] / [`load_file`]: the text grid format
//! - [`generate_random`]: a bordered arena with scattered walls and a guarded base
//! - [`MapLayout::from_arena`]: a running match, for saving
//!
//! # Text Format
//!
//! One character per grid cell, one line per row:
//!
//! | Char | Meaning        |
//! |------|----------------|
//! | `#`  | soil wall      |
//! | `@`  | metal wall     |
//! | `B`  | base           |
//! | `P`  | player spawn   |
//! | `E`  | normal enemy   |
//! | `C`  | commander      |
//!
//! Anything else is an empty cell. [`to_text`] writes `.` for empty cells.
//!
//! # Example
//!
//! ```
//! use tankbattle_core::map::parse;
//! use tankbattle_core::geometry::Playfield;
//! use tankbattle_core::entity::{TankKind, WallKind};
//! use glam::Vec2;
//!
//! let layout = parse("@@@\n@P@\n@@@", 40.0, &Playfield::default()).unwrap();
//! assert_eq!(layout.walls.len(), 8);
//! assert!(layout.walls.iter().all(|w| w.kind == WallKind::Metal));
//! assert_eq!(layout.tanks.len(), 1);
//! assert_eq!(layout.tanks[0].kind, TankKind::Player);
//! assert_eq!(layout.tanks[0].position, Vec2::new(40.0, 40.0));
//! assert!(layout.base.is_none());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::Arena;
use crate::entity::{TankKind, WallKind};
use crate::geometry::Playfield;
use crate::settings::Settings;

/// Reasons a map cannot be used.
#[derive(Error, Debug)]
pub enum MapError {
    /// The text held no rows.
    #[error("map is empty")]
    Empty,
    /// A second `B` was found.
    #[error("second base at row {row}, column {col}; a map holds at most one")]
    MultipleBases {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
    },
    /// The grid does not fit the playfield.
    #[error("map is {cols}x{rows} cells but the playfield holds {max_cols}x{max_rows}")]
    TooLarge {
        /// Widest row.
        cols: usize,
        /// Row count.
        rows: usize,
        /// Columns that fit.
        max_cols: usize,
        /// Rows that fit.
        max_rows: usize,
    },
    /// Reading or writing the file failed.
    #[error("map file {path}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A wall cell in a layout.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSpawn {
    /// Top-left corner.
    pub position: Vec2,
    /// Material.
    pub kind: WallKind,
}

/// A tank spawn point in a layout.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSpawn {
    /// Top-left corner.
    pub position: Vec2,
    /// Which kind of tank spawns here.
    pub kind: TankKind,
}

/// Bootstrap payload for a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Wall cells, in row-major order for parsed maps.
    pub walls: Vec<WallSpawn>,
    /// Base cell, if any.
    pub base: Option<Vec2>,
    /// Tank spawns.
    pub tanks: Vec<TankSpawn>,
}

impl MapLayout {
    /// Exports the current world in layout form.
    ///
    /// Flagged entities and dead tanks are left out.
    #[must_use]
    pub fn from_arena(arena: &Arena) -> Self {
        Self {
            walls: arena
                .walls()
                .map(|(_, w)| WallSpawn {
                    position: w.position,
                    kind: w.kind,
                })
                .collect(),
            base: arena.base().map(|(_, b)| b.position),
            tanks: arena
                .living_tanks()
                .map(|(_, t)| TankSpawn {
                    position: t.position,
                    kind: t.kind,
                })
                .collect(),
        }
    }

    /// Number of spawns of each kind, as (player, normal, commander).
    #[must_use]
    pub fn tank_counts(&self) -> (usize, usize, usize) {
        self.tanks.iter().fold((0, 0, 0), |(p, n, c), s| match s.kind {
            TankKind::Player => (p + 1, n, c),
            TankKind::EnemyNormal => (p, n + 1, c),
            TankKind::EnemyCommander => (p, n, c + 1),
        })
    }
}

// =============================================================================
// Text codec
// =============================================================================

#[allow(clippy::cast_precision_loss)]
fn cell_origin(col: usize, row: usize, cell: f32) -> Vec2 {
    Vec2::new(col as f32 * cell, row as f32 * cell)
}

/// Parses the text grid format.
///
/// Trailing whitespace (including `\r`) on each line and trailing blank lines
/// are ignored.
///
/// # Errors
///
/// - [`MapError::Empty`] when there are no rows
/// - [`MapError::MultipleBases`] on a second `B`
/// - [`MapError::TooLarge`] when the grid exceeds the playfield
pub fn parse(text: &str, cell: f32, field: &Playfield) -> Result<MapLayout, MapError> {
    let mut rows: Vec<&str> = text.lines().map(str::trim_end).collect();
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(MapError::Empty);
    }

    let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let (max_cols, max_rows) = field.grid_dims(cell);
    let (max_cols, max_rows) = (max_cols as usize, max_rows as usize);
    if cols > max_cols || rows.len() > max_rows {
        return Err(MapError::TooLarge {
            cols,
            rows: rows.len(),
            max_cols,
            max_rows,
        });
    }

    let mut layout = MapLayout::default();
    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let position = cell_origin(col, row, cell);
            match ch {
                '#' => layout.walls.push(WallSpawn {
                    position,
                    kind: WallKind::Soil,
                }),
                '@' => layout.walls.push(WallSpawn {
                    position,
                    kind: WallKind::Metal,
                }),
                'B' => {
                    if layout.base.is_some() {
                        return Err(MapError::MultipleBases { row, col });
                    }
                    layout.base = Some(position);
                }
                'P' => layout.tanks.push(TankSpawn {
                    position,
                    kind: TankKind::Player,
                }),
                'E' => layout.tanks.push(TankSpawn {
                    position,
                    kind: TankKind::EnemyNormal,
                }),
                'C' => layout.tanks.push(TankSpawn {
                    position,
                    kind: TankKind::EnemyCommander,
                }),
                _ => {}
            }
        }
    }
    Ok(layout)
}

/// Grid cell of an exactly grid-aligned position.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn aligned_cell(position: Vec2, cell: f32) -> Option<(i64, i64)> {
    let q = position / cell;
    if q.x.fract() == 0.0 && q.y.fract() == 0.0 {
        Some((q.x as i64, q.y as i64))
    } else {
        None
    }
}

/// Renders a layout as text covering the whole playfield.
///
/// Only entities sitting exactly on a grid cell are written. Tanks take
/// precedence over the base, and the base over walls.
#[must_use]
pub fn to_text(layout: &MapLayout, cell: f32, field: &Playfield) -> String {
    let mut grid: BTreeMap<(i64, i64), char> = BTreeMap::new();
    for wall in &layout.walls {
        if let Some(key) = aligned_cell(wall.position, cell) {
            let ch = match wall.kind {
                WallKind::Soil => '#',
                WallKind::Metal => '@',
            };
            grid.entry(key).or_insert(ch);
        }
    }
    if let Some(key) = layout.base.and_then(|b| aligned_cell(b, cell)) {
        grid.insert(key, 'B');
    }
    let mut tank_cells = Vec::new();
    for tank in &layout.tanks {
        if let Some(key) = aligned_cell(tank.position, cell) {
            if tank_cells.contains(&key) {
                continue;
            }
            tank_cells.push(key);
            let ch = match tank.kind {
                TankKind::Player => 'P',
                TankKind::EnemyNormal => 'E',
                TankKind::EnemyCommander => 'C',
            };
            grid.insert(key, ch);
        }
    }

    let (cols, rows) = field.grid_dims(cell);
    let mut lines = Vec::with_capacity(rows as usize);
    for row in 0..i64::from(rows) {
        let line: String = (0..i64::from(cols))
            .map(|col| grid.get(&(col, row)).copied().unwrap_or('.'))
            .collect();
        lines.push(line);
    }
    lines.join("\n")
}

/// Reads and parses a map file.
///
/// # Errors
///
/// [`MapError::Io`] if the file cannot be read, otherwise as [`parse`].
pub fn load_file(path: impl AsRef<Path>, cell: f32, field: &Playfield) -> Result<MapLayout, MapError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, cell, field)
}

/// Writes a layout to a map file.
///
/// # Errors
///
/// [`MapError::Io`] if the file cannot be written.
pub fn save_file(
    path: impl AsRef<Path>,
    layout: &MapLayout,
    cell: f32,
    field: &Playfield,
) -> Result<(), MapError> {
    let path = path.as_ref();
    std::fs::write(path, to_text(layout, cell, field)).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// Procedural generation
// =============================================================================

/// Attempts per requested random wall before giving up on it.
const WALL_ATTEMPTS_PER_REQUEST: u32 = 10;

/// Generates a bordered map with scattered walls and a guarded base.
///
/// - Metal walls line all four edges.
/// - `map_settings.random_soil_walls` soil and `random_metal_walls` metal
///   walls land on distinct interior cells (columns and rows `2..=n-3`),
///   never on the base cell.
/// - The base sits at `((cols / 2 - 1) * cell, height - 3 * cell)`.
/// - Soil guard walls fill the base's left, right, and the three cells above.
///
/// The layout carries no tank spawns; those come from settings.
pub fn generate_random<R: Rng + ?Sized>(rng: &mut R, settings: &Settings) -> MapLayout {
    let cell = settings.game.wall_size;
    let (cols, rows) = settings.playfield().grid_dims(cell);
    let (cols, rows) = (i64::from(cols), i64::from(rows));

    // Insertion order is kept alongside the set so the layout is stable.
    let mut occupied: BTreeMap<(i64, i64), WallKind> = BTreeMap::new();
    let mut order: Vec<(i64, i64)> = Vec::new();
    let mut place = |key: (i64, i64), kind: WallKind| {
        if occupied.contains_key(&key) {
            return false;
        }
        occupied.insert(key, kind);
        order.push(key);
        true
    };

    for col in 0..cols {
        place((col, 0), WallKind::Metal);
        place((col, rows - 1), WallKind::Metal);
    }
    for row in 0..rows {
        place((0, row), WallKind::Metal);
        place((cols - 1, row), WallKind::Metal);
    }

    let base_cell = (cols / 2 - 1, rows - 3);

    let scatter = [
        (settings.map.random_soil_walls, WallKind::Soil),
        (settings.map.random_metal_walls, WallKind::Metal),
    ];
    if cols - 3 >= 2 && rows - 3 >= 2 {
        let interior = u32::try_from((cols - 4) * (rows - 4)).unwrap_or(u32::MAX);
        for (count, kind) in scatter {
            let count = count.min(interior);
            let budget = count.saturating_mul(WALL_ATTEMPTS_PER_REQUEST);
            let mut placed = 0;
            let mut attempts = 0;
            while placed < count && attempts < budget {
                attempts += 1;
                let key = (rng.gen_range(2..=cols - 3), rng.gen_range(2..=rows - 3));
                if key != base_cell && place(key, kind) {
                    placed += 1;
                }
            }
        }
    }

    for dx in [-1, 0, 1] {
        for dy in [-1, 0] {
            if dx == 0 && dy == 0 {
                continue;
            }
            place((base_cell.0 + dx, base_cell.1 + dy), WallKind::Soil);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let to_pos = |(col, row): (i64, i64)| Vec2::new(col as f32 * cell, row as f32 * cell);

    MapLayout {
        walls: order
            .iter()
            .map(|key| WallSpawn {
                position: to_pos(*key),
                kind: occupied[key],
            })
            .collect(),
        base: Some(to_pos(base_cell)),
        tanks: Vec::new(),
    }
}
