//! Component structs for each entity type.
//!
//! The component structs hold all state for a particular entity type. Tanks
//! carry their own tuning (speed, cooldown, vision) so that a match started
//! from a map file and one started from a random layout behave identically
//! once spawned.

use bitflags::bitflags;
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::geometry::{Direction, Playfield, Rect};

// =============================================================================
// Status Flags
// =============================================================================

bitflags! {
    /// Lifecycle flags set during a pass and consumed by [`crate::arena::Arena::sweep`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Entity was destroyed by an impact and awaits removal.
        const DESTROYED = 0b0000_0001;
        /// Bullet left the playfield and awaits removal.
        const OUT_OF_BOUNDS = 0b0000_0010;
    }
}

impl StatusFlags {
    /// Returns true if any removal flag is set.
    #[must_use]
    pub const fn is_removable(self) -> bool {
        self.intersects(Self::DESTROYED.union(Self::OUT_OF_BOUNDS))
    }
}

// =============================================================================
// Colour
// =============================================================================

/// Named colour tag carried by tanks for the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// (255, 0, 0)
    Red,
    /// (255, 255, 0)
    Yellow,
    /// (0, 255, 0)
    Green,
    /// (0, 0, 255)
    Blue,
    /// (255, 255, 255)
    White,
    /// (0, 0, 0)
    Black,
    /// (128, 128, 128)
    Gray,
    /// (139, 69, 19)
    Brown,
    /// (64, 64, 64)
    DarkGray,
}

impl Color {
    /// Looks a colour up by its case-insensitive name.
    ///
    /// Unknown names fall back to [`Color::Blue`].
    ///
    /// # Example
    ///
    /// ```
    /// use tankbattle_core::entity::Color;
    ///
    /// assert_eq!(Color::from_name("Dark_Gray"), Color::DarkGray);
    /// assert_eq!(Color::from_name("magenta"), Color::Blue);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "red" => Self::Red,
            "yellow" => Self::Yellow,
            "green" => Self::Green,
            "white" => Self::White,
            "black" => Self::Black,
            "gray" => Self::Gray,
            "brown" => Self::Brown,
            "dark_gray" => Self::DarkGray,
            _ => Self::Blue,
        }
    }

    /// Returns the RGB triple for this colour.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (255, 0, 0),
            Self::Yellow => (255, 255, 0),
            Self::Green => (0, 255, 0),
            Self::Blue => (0, 0, 255),
            Self::White => (255, 255, 255),
            Self::Black => (0, 0, 0),
            Self::Gray => (128, 128, 128),
            Self::Brown => (139, 69, 19),
            Self::DarkGray => (64, 64, 64),
        }
    }
}

// =============================================================================
// Tank
// =============================================================================

/// Owning-side classification of a tank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TankKind {
    /// Human-controlled tank.
    Player,
    /// Regular enemy.
    EnemyNormal,
    /// Enemy that enables shared vision while alive.
    EnemyCommander,
}

impl TankKind {
    /// Default hit points for this kind.
    #[must_use]
    pub const fn default_hit_points(self) -> u32 {
        match self {
            Self::EnemyCommander => 2,
            Self::Player | Self::EnemyNormal => 1,
        }
    }

    /// Returns true for the two enemy kinds.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        !matches!(self, Self::Player)
    }
}

/// Behavioural tuning for an AI-driven tank.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Minimum milliseconds between state-machine decisions.
    pub decision_interval_ms: u64,
    /// Probability of attacking when a target is in range. Carried for
    /// tuning parity; the state machine fires whenever its cooldown allows.
    pub attack_chance: f32,
    /// Per-tick probability of re-rolling facing while patrolling.
    pub direction_change_chance: f32,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            decision_interval_ms: 1000,
            attack_chance: 0.2,
            direction_change_chance: 0.3,
        }
    }
}

/// Who drives a tank.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pilot {
    /// Driven by input intents.
    Human,
    /// Driven by the AI engine with this profile.
    Ai(AiProfile),
}

/// Components for tank entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankComponents {
    /// Top-left corner of the tank box.
    pub position: Vec2,
    /// Current facing.
    pub facing: Direction,
    /// Distance moved per unit step.
    pub speed: f32,
    /// Side length of the square box.
    pub size: f32,
    /// Owning-side classification.
    pub kind: TankKind,
    /// Remaining hit points. The tank is alive while this is positive.
    pub hit_points: u32,
    /// Simulated time of the last successful shot, if any.
    pub last_shot_ms: Option<u64>,
    /// Minimum milliseconds between shots.
    pub shot_cooldown_ms: u64,
    /// Base vision range before per-kind scaling.
    pub vision_range: f32,
    /// Colour tag for the renderer.
    pub color: Color,
    /// Control source.
    pub pilot: Pilot,
}

impl TankComponents {
    /// Creates a tank of the given kind with stock tuning, facing up.
    ///
    /// Enemy kinds get an [`AiProfile::default`] pilot.
    ///
    /// # Arguments
    ///
    /// * `kind` - Owning-side classification
    /// * `position` - Top-left corner
    /// * `size` - Side length of the box
    #[must_use]
    pub fn new(kind: TankKind, position: Vec2, size: f32) -> Self {
        let pilot = if kind.is_enemy() {
            Pilot::Ai(AiProfile::default())
        } else {
            Pilot::Human
        };
        Self {
            position,
            facing: Direction::Up,
            speed: 2.0,
            size,
            kind,
            hit_points: kind.default_hit_points(),
            last_shot_ms: None,
            shot_cooldown_ms: 500,
            vision_range: 150.0,
            color: if kind.is_enemy() { Color::Blue } else { Color::Red },
            pilot,
        }
    }

    /// Sets the movement speed.
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the shot cooldown.
    #[must_use]
    pub const fn with_shot_cooldown(mut self, cooldown_ms: u64) -> Self {
        self.shot_cooldown_ms = cooldown_ms;
        self
    }

    /// Sets the base vision range.
    #[must_use]
    pub const fn with_vision_range(mut self, range: f32) -> Self {
        self.vision_range = range;
        self
    }

    /// Sets the starting hit points.
    #[must_use]
    pub const fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points;
        self
    }

    /// Sets the colour tag.
    #[must_use]
    pub const fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the facing.
    #[must_use]
    pub const fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// Replaces the pilot. Ignored for player tanks, which are always human.
    #[must_use]
    pub fn with_pilot(mut self, pilot: Pilot) -> Self {
        if self.kind.is_enemy() {
            self.pilot = pilot;
        }
        self
    }

    /// Returns true while hit points remain.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    /// Returns true for the player kind.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, TankKind::Player)
    }

    /// Returns the AI profile for AI-driven tanks.
    #[must_use]
    pub const fn ai_profile(&self) -> Option<&AiProfile> {
        match &self.pilot {
            Pilot::Ai(profile) => Some(profile),
            Pilot::Human => None,
        }
    }

    /// Current bounding box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }

    /// Centre of the bounding box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    /// Box the tank would occupy after a unit step, without clamping.
    ///
    /// This is what the prospective collision check tests.
    #[must_use]
    pub fn prospective_rect(&self, step: IVec2) -> Rect {
        self.rect().translated(step.as_vec2() * self.speed)
    }

    /// Moves by `step × speed`, clamping each axis to the playfield.
    ///
    /// An out-of-range axis is clamped; the other axis still moves.
    pub fn move_by(&mut self, step: IVec2, field: &Playfield) {
        let target = self.position + step.as_vec2() * self.speed;
        self.position = field.clamp_box(target, self.size);
    }

    /// Sets the facing unconditionally.
    pub fn rotate(&mut self, facing: Direction) {
        self.facing = facing;
    }

    /// Fires a bullet if the cooldown has elapsed.
    ///
    /// The bullet spawns outside the front edge, offset by its own size plus
    /// five units, centred on the perpendicular axis. A tank that has never
    /// fired may fire immediately.
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Simulated time of the shot
    /// * `owner` - Id of this tank, recorded on the bullet
    /// * `bullet_size` - Side length of the bullet box
    /// * `bullet_speed` - Distance the bullet travels per tick
    pub fn try_shoot(
        &mut self,
        now_ms: u64,
        owner: EntityId,
        bullet_size: f32,
        bullet_speed: f32,
    ) -> Option<BulletComponents> {
        if let Some(last) = self.last_shot_ms {
            if now_ms.saturating_sub(last) < self.shot_cooldown_ms {
                return None;
            }
        }
        self.last_shot_ms = Some(now_ms);

        let centred = (self.size / 2.0).floor() - (bullet_size / 2.0).floor();
        let mut position = self.position + Vec2::splat(centred);
        match self.facing {
            Direction::Up => position.y = self.position.y - bullet_size - 5.0,
            Direction::Down => position.y = self.position.y + self.size + 5.0,
            Direction::Left => position.x = self.position.x - bullet_size - 5.0,
            Direction::Right => position.x = self.position.x + self.size + 5.0,
        }

        Some(BulletComponents {
            position,
            direction: self.facing,
            speed: bullet_speed,
            size: bullet_size,
            owner,
        })
    }

    /// Applies one point of damage. Returns true if this destroyed the tank.
    pub fn hit(&mut self) -> bool {
        let was_alive = self.is_alive();
        self.hit_points = self.hit_points.saturating_sub(1);
        was_alive && !self.is_alive()
    }
}

// =============================================================================
// Bullet
// =============================================================================

/// Components for bullet entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletComponents {
    /// Top-left corner.
    pub position: Vec2,
    /// Fixed travel direction.
    pub direction: Direction,
    /// Distance per tick.
    pub speed: f32,
    /// Side length of the square box.
    pub size: f32,
    /// Tank that fired this bullet. Only used to skip self-hits.
    pub owner: EntityId,
}

impl BulletComponents {
    /// Advances one tick along the travel direction.
    pub fn advance(&mut self) {
        self.position += self.direction.unit() * self.speed;
    }

    /// True when the top-left corner has left the playfield.
    #[must_use]
    pub fn is_offscreen(&self, field: &Playfield) -> bool {
        !field.contains(self.position)
    }

    /// Current bounding box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }
}

// =============================================================================
// Wall
// =============================================================================

/// Wall material.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// Destroyed by any bullet.
    Soil,
    /// Stops bullets and survives.
    Metal,
}

/// Components for wall entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallComponents {
    /// Top-left corner.
    pub position: Vec2,
    /// Side length of the grid cell.
    pub size: f32,
    /// Material.
    pub kind: WallKind,
}

impl WallComponents {
    /// Creates a wall occupying one grid cell.
    #[must_use]
    pub const fn new(kind: WallKind, position: Vec2, size: f32) -> Self {
        Self {
            position,
            size,
            kind,
        }
    }

    /// Current bounding box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }
}

// =============================================================================
// Base
// =============================================================================

/// Components for the base objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseComponents {
    /// Top-left corner.
    pub position: Vec2,
    /// Side length.
    pub size: f32,
}

impl BaseComponents {
    /// Creates a base at the given cell.
    #[must_use]
    pub const fn new(position: Vec2, size: f32) -> Self {
        Self { position, size }
    }

    /// Current bounding box.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }

    /// Centre of the bounding box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }
}
