//! Resolved match settings.
//!
//! [`Settings`] is a plain, fully-resolved tuning structure handed to the
//! simulation at construction. It deserialises from the same JSON layout the
//! game's config file uses (`game_settings`, `player_settings`,
//! `enemy_settings`, ...), with every field defaulted so a partial file is
//! enough.
//!
//! Difficulty presets are a one-time transform over the structure
//! ([`Settings::with_difficulty`]); the simulation never sees the preset name.
//!
//! # Example
//!
//! ```
//! use tankbattle_core::settings::Settings;
//!
//! let hard = Settings::default().with_difficulty("hard").unwrap();
//! assert!(hard.enemies.normal_tank.speed > Settings::default().enemies.normal_tank.speed);
//! assert!(hard.validate().is_ok());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{AiProfile, Color, Pilot, TankComponents, TankKind};
use crate::geometry::Playfield;

// =============================================================================
// Errors
// =============================================================================

/// Reasons a settings value is rejected.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A size, speed or range that must be positive was not.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Dotted name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The tick rate was zero.
    #[error("game_settings.fps must be at least 1")]
    ZeroTickRate,
    /// A hit-point pool was zero.
    #[error("{field} must be at least 1")]
    ZeroHitPoints {
        /// Dotted name of the offending field.
        field: &'static str,
    },
    /// A probability fell outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Dotted name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The player colour list was empty.
    #[error("player_settings.colors must name at least one colour")]
    NoPlayerColors,
    /// A difficulty name with no preset.
    #[error("unknown difficulty preset `{0}`")]
    UnknownDifficulty(String),
    /// The settings file could not be read.
    #[error("failed to read settings from {path}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The settings JSON was malformed.
    #[error("malformed settings JSON")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Sections
// =============================================================================

/// Playfield and entity dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Playfield width.
    pub screen_width: f32,
    /// Playfield height.
    pub screen_height: f32,
    /// Ticks per second.
    pub fps: u32,
    /// Tank box side.
    pub tank_size: f32,
    /// Bullet box side.
    pub bullet_size: f32,
    /// Wall and grid cell side.
    pub wall_size: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,
            fps: 60,
            tank_size: 40.0,
            bullet_size: 8.0,
            wall_size: 40.0,
        }
    }
}

/// Player tank tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Distance per unit step.
    pub speed: f32,
    /// Milliseconds between shots.
    pub shot_cooldown: u64,
    /// Base vision range.
    pub vision_range: f32,
    /// Starting hit points.
    pub hit_points: u32,
    /// Colour names one of which is picked at spawn.
    pub colors: Vec<String>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            shot_cooldown: 500,
            vision_range: 150.0,
            hit_points: 1,
            colors: vec!["red".to_owned(), "yellow".to_owned()],
        }
    }
}

impl PlayerSettings {
    /// Builds a tuned player tank.
    #[must_use]
    pub fn build(&self, position: Vec2, size: f32, color: Color) -> TankComponents {
        TankComponents::new(TankKind::Player, position, size)
            .with_speed(self.speed)
            .with_shot_cooldown(self.shot_cooldown)
            .with_vision_range(self.vision_range)
            .with_hit_points(self.hit_points)
            .with_color(color)
    }
}

/// Tuning shared by every enemy of one archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyArchetype {
    /// How many to spawn on a procedural map.
    pub count: u32,
    /// Distance per unit step.
    pub speed: f32,
    /// Milliseconds between shots.
    pub shot_cooldown: u64,
    /// Base vision range.
    pub vision_range: f32,
    /// Starting hit points.
    pub hit_points: u32,
    /// Colour name.
    pub color: String,
    /// Milliseconds between AI decisions.
    pub ai_decision_interval: u64,
    /// Attack probability carried on the AI profile.
    pub attack_chance: f32,
    /// Per-tick patrol facing re-roll probability.
    pub direction_change_chance: f32,
}

impl EnemyArchetype {
    fn normal() -> Self {
        Self {
            count: 5,
            speed: 1.5,
            shot_cooldown: 800,
            vision_range: 120.0,
            hit_points: 1,
            color: "blue".to_owned(),
            ai_decision_interval: 1000,
            attack_chance: 0.2,
            direction_change_chance: 0.3,
        }
    }

    fn commander() -> Self {
        Self {
            count: 1,
            hit_points: 2,
            color: "green".to_owned(),
            ..Self::normal()
        }
    }

    /// Builds a tuned enemy tank of the given kind.
    #[must_use]
    pub fn build(&self, kind: TankKind, position: Vec2, size: f32) -> TankComponents {
        TankComponents::new(kind, position, size)
            .with_speed(self.speed)
            .with_shot_cooldown(self.shot_cooldown)
            .with_vision_range(self.vision_range)
            .with_hit_points(self.hit_points)
            .with_color(Color::from_name(&self.color))
            .with_pilot(Pilot::Ai(AiProfile {
                decision_interval_ms: self.ai_decision_interval,
                attack_chance: self.attack_chance,
                direction_change_chance: self.direction_change_chance,
            }))
    }
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self::normal()
    }
}

/// Per-archetype enemy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    /// Regular enemies.
    pub normal_tank: EnemyArchetype,
    /// Commanders.
    pub commander_tank: EnemyArchetype,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            normal_tank: EnemyArchetype::normal(),
            commander_tank: EnemyArchetype::commander(),
        }
    }
}

/// Bullet tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletSettings {
    /// Distance per tick.
    pub speed: f32,
}

impl Default for BulletSettings {
    fn default() -> Self {
        Self { speed: 5.0 }
    }
}

/// Procedural map generation counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Interior soil walls to scatter.
    pub random_soil_walls: u32,
    /// Interior metal walls to scatter.
    pub random_metal_walls: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            random_soil_walls: 15,
            random_metal_walls: 8,
        }
    }
}

/// A named difficulty transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyPreset {
    /// Replaces the normal-enemy count when set.
    pub normal_tank_count: Option<u32>,
    /// Multiplies every enemy archetype's speed.
    pub enemy_speed_multiplier: f32,
    /// Multiplies every enemy archetype's vision range.
    pub enemy_vision_multiplier: f32,
    /// Replaces every enemy archetype's attack chance when set.
    pub enemy_attack_chance: Option<f32>,
}

impl Default for DifficultyPreset {
    fn default() -> Self {
        Self {
            normal_tank_count: None,
            enemy_speed_multiplier: 1.0,
            enemy_vision_multiplier: 1.0,
            enemy_attack_chance: None,
        }
    }
}

fn default_presets() -> BTreeMap<String, DifficultyPreset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "easy".to_owned(),
        DifficultyPreset {
            normal_tank_count: Some(3),
            enemy_speed_multiplier: 0.8,
            enemy_vision_multiplier: 0.8,
            enemy_attack_chance: Some(0.1),
        },
    );
    presets.insert(
        "normal".to_owned(),
        DifficultyPreset {
            normal_tank_count: Some(5),
            enemy_attack_chance: Some(0.2),
            ..DifficultyPreset::default()
        },
    );
    presets.insert(
        "hard".to_owned(),
        DifficultyPreset {
            normal_tank_count: Some(8),
            enemy_speed_multiplier: 1.3,
            enemy_vision_multiplier: 1.2,
            enemy_attack_chance: Some(0.35),
        },
    );
    presets
}

// =============================================================================
// Settings
// =============================================================================

/// Complete resolved tuning for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dimensions and tick rate.
    #[serde(rename = "game_settings")]
    pub game: GameSettings,
    /// Player tuning.
    #[serde(rename = "player_settings")]
    pub player: PlayerSettings,
    /// Enemy archetypes.
    #[serde(rename = "enemy_settings")]
    pub enemies: EnemySettings,
    /// Bullet tuning.
    #[serde(rename = "bullet_settings")]
    pub bullet: BulletSettings,
    /// Procedural generation counts.
    #[serde(rename = "map_settings")]
    pub map: MapSettings,
    /// Named difficulty presets.
    #[serde(rename = "difficulty_levels")]
    pub difficulty_levels: BTreeMap<String, DifficultyPreset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game: GameSettings::default(),
            player: PlayerSettings::default(),
            enemies: EnemySettings::default(),
            bullet: BulletSettings::default(),
            map: MapSettings::default(),
            difficulty_levels: default_presets(),
        }
    }
}

impl Settings {
    /// Parses settings from JSON. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] if the text is not valid settings JSON.
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file cannot be read and
    /// [`SettingsError::Parse`] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Returns a copy with the named difficulty preset applied.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownDifficulty`] if no preset has that name.
    pub fn with_difficulty(mut self, name: &str) -> Result<Self, SettingsError> {
        let preset = self
            .difficulty_levels
            .get(name)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownDifficulty(name.to_owned()))?;
        self.apply_difficulty(&preset);
        Ok(self)
    }

    /// Applies a difficulty transform in place.
    pub fn apply_difficulty(&mut self, preset: &DifficultyPreset) {
        if let Some(count) = preset.normal_tank_count {
            self.enemies.normal_tank.count = count;
        }
        for archetype in [&mut self.enemies.normal_tank, &mut self.enemies.commander_tank] {
            archetype.speed *= preset.enemy_speed_multiplier;
            archetype.vision_range *= preset.enemy_vision_multiplier;
            if let Some(chance) = preset.enemy_attack_chance {
                archetype.attack_chance = chance;
            }
        }
    }

    /// Checks every numeric field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positives = [
            ("game_settings.screen_width", self.game.screen_width),
            ("game_settings.screen_height", self.game.screen_height),
            ("game_settings.tank_size", self.game.tank_size),
            ("game_settings.bullet_size", self.game.bullet_size),
            ("game_settings.wall_size", self.game.wall_size),
            ("bullet_settings.speed", self.bullet.speed),
            ("player_settings.speed", self.player.speed),
            ("player_settings.vision_range", self.player.vision_range),
            ("enemy_settings.normal_tank.speed", self.enemies.normal_tank.speed),
            ("enemy_settings.normal_tank.vision_range", self.enemies.normal_tank.vision_range),
            ("enemy_settings.commander_tank.speed", self.enemies.commander_tank.speed),
            (
                "enemy_settings.commander_tank.vision_range",
                self.enemies.commander_tank.vision_range,
            ),
        ];
        for (field, value) in positives {
            // NaN fails this comparison too.
            if !(value > 0.0) {
                return Err(SettingsError::NonPositive { field, value });
            }
        }

        if self.game.fps == 0 {
            return Err(SettingsError::ZeroTickRate);
        }

        let hit_points = [
            ("player_settings.hit_points", self.player.hit_points),
            ("enemy_settings.normal_tank.hit_points", self.enemies.normal_tank.hit_points),
            (
                "enemy_settings.commander_tank.hit_points",
                self.enemies.commander_tank.hit_points,
            ),
        ];
        for (field, value) in hit_points {
            if value == 0 {
                return Err(SettingsError::ZeroHitPoints { field });
            }
        }

        let probabilities = [
            ("enemy_settings.normal_tank.attack_chance", self.enemies.normal_tank.attack_chance),
            (
                "enemy_settings.normal_tank.direction_change_chance",
                self.enemies.normal_tank.direction_change_chance,
            ),
            (
                "enemy_settings.commander_tank.attack_chance",
                self.enemies.commander_tank.attack_chance,
            ),
            (
                "enemy_settings.commander_tank.direction_change_chance",
                self.enemies.commander_tank.direction_change_chance,
            ),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::ProbabilityOutOfRange { field, value });
            }
        }

        if self.player.colors.is_empty() {
            return Err(SettingsError::NoPlayerColors);
        }
        Ok(())
    }

    /// Playfield described by these settings.
    #[must_use]
    pub fn playfield(&self) -> Playfield {
        Playfield::new(self.game.screen_width, self.game.screen_height)
    }

    /// Archetype for an enemy kind; `None` for the player.
    #[must_use]
    pub const fn archetype(&self, kind: TankKind) -> Option<&EnemyArchetype> {
        match kind {
            TankKind::Player => None,
            TankKind::EnemyNormal => Some(&self.enemies.normal_tank),
            TankKind::EnemyCommander => Some(&self.enemies.commander_tank),
        }
    }

    /// Simulated milliseconds elapsed at the start of `tick`.
    #[must_use]
    pub fn tick_to_ms(&self, tick: u64) -> u64 {
        tick * 1000 / u64::from(self.game.fps.max(1))
    }
}
