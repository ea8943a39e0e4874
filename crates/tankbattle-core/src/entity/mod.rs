//! Entity module for the tank battle simulation.
//!
//! This module provides the core entity types:
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityTag`]: Type classification used by resolvers and snapshots
//! - [`EntityInner`]: Type-safe storage for entity-specific components
//! - [`Entity`]: The complete entity container, including lifecycle flags
//!
//! # Architecture
//!
//! Entities never hold references to each other. Bullets name their owner and
//! the AI names its target through an [`EntityId`], which callers look up in
//! the arena and treat a miss as "gone".
//!
//! # Example
//!
//! ```
//! use tankbattle_core::entity::{Entity, EntityId, EntityTag, EntityInner, TankComponents, TankKind};
//! use glam::Vec2;
//!
//! let tank = Entity::new(
//!     EntityId::new(42),
//!     EntityTag::Tank,
//!     EntityInner::Tank(TankComponents::new(TankKind::Player, Vec2::ZERO, 40.0)),
//! );
//!
//! assert_eq!(tank.id().as_u64(), 42);
//! assert_eq!(tank.tag(), EntityTag::Tank);
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{
    AiProfile, BaseComponents, BulletComponents, Color, Pilot, StatusFlags, TankComponents,
    TankKind, WallComponents, WallKind,
};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Ids are issued monotonically
/// by the arena and never reused within a match, so a stale id simply fails
/// to resolve instead of aliasing a newer entity.
///
/// Ids compare numerically. Every per-tick walk (AI, impacts, vision) goes
/// in id order, i.e. spawn order.
///
/// ```
/// use tankbattle_core::entity::EntityId;
///
/// let player = EntityId::new(0);
/// let enemy = EntityId::new(3);
///
/// assert!(player < enemy);
/// assert_eq!(format!("{enemy} {enemy:?}"), "3 EntityId(3)");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity type tag.
///
/// # Variants
///
/// - `Tank`: Player and enemy tanks
/// - `Bullet`: Shells in flight
/// - `Wall`: Soil or metal grid blocks
/// - `Base`: The objective the player defends
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Player or enemy tank
    Tank,
    /// Shell in flight
    Bullet,
    /// Soil or metal wall
    Wall,
    /// The base objective
    Base,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tank => write!(f, "Tank"),
            Self::Bullet => write!(f, "Bullet"),
            Self::Wall => write!(f, "Wall"),
            Self::Base => write!(f, "Base"),
        }
    }
}

/// Type-safe storage for entity-specific components.
///
/// # Consistency with EntityTag
///
/// The `EntityInner` variant should always match the entity's `EntityTag`.
/// [`crate::arena::Arena::spawn`] derives the tag from the inner value, so
/// entities created through the arena are always consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Tank components (position, tuning, pilot)
    Tank(TankComponents),
    /// Bullet components (position, direction, owner)
    Bullet(BulletComponents),
    /// Wall components (position, material)
    Wall(WallComponents),
    /// Base components (position)
    Base(BaseComponents),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Tank(_) => EntityTag::Tank,
            Self::Bullet(_) => EntityTag::Bullet,
            Self::Wall(_) => EntityTag::Wall,
            Self::Base(_) => EntityTag::Base,
        }
    }

    /// Returns a reference to the tank components, if this is a tank.
    #[must_use]
    pub const fn as_tank(&self) -> Option<&TankComponents> {
        match self {
            Self::Tank(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the tank components, if this is a tank.
    #[must_use]
    pub fn as_tank_mut(&mut self) -> Option<&mut TankComponents> {
        match self {
            Self::Tank(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the bullet components, if this is a bullet.
    #[must_use]
    pub const fn as_bullet(&self) -> Option<&BulletComponents> {
        match self {
            Self::Bullet(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a mutable reference to the bullet components, if this is a bullet.
    #[must_use]
    pub fn as_bullet_mut(&mut self) -> Option<&mut BulletComponents> {
        match self {
            Self::Bullet(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the wall components, if this is a wall.
    #[must_use]
    pub const fn as_wall(&self) -> Option<&WallComponents> {
        match self {
            Self::Wall(components) => Some(components),
            _ => None,
        }
    }

    /// Returns a reference to the base components, if this is the base.
    #[must_use]
    pub const fn as_base(&self) -> Option<&BaseComponents> {
        match self {
            Self::Base(components) => Some(components),
            _ => None,
        }
    }
}

/// A complete entity in the simulation.
///
/// An `Entity` combines:
/// - A unique [`EntityId`] for identification and ordering
/// - An [`EntityTag`] for quick classification
/// - An [`EntityInner`] containing type-specific components
/// - [`StatusFlags`] marking it for removal at the next sweep
///
/// # Example
///
/// ```
/// use tankbattle_core::entity::{Entity, EntityId, StatusFlags};
/// use tankbattle_core::entity::{WallComponents, WallKind};
/// use glam::Vec2;
///
/// let mut wall = Entity::from_inner(
///     EntityId::new(1),
///     WallComponents::new(WallKind::Soil, Vec2::ZERO, 40.0).into(),
/// );
///
/// assert!(wall.is_wall());
/// wall.mark(StatusFlags::DESTROYED);
/// assert!(wall.is_destroyed());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    inner: EntityInner,
    #[serde(default)]
    status: StatusFlags,
}

impl Entity {
    /// Creates a new entity with the given ID, tag, and inner storage.
    ///
    /// # Note
    ///
    /// The caller is responsible for ensuring `tag` and `inner` are consistent
    /// (e.g., `EntityTag::Tank` with `EntityInner::Tank(_)`).
    #[must_use]
    pub const fn new(id: EntityId, tag: EntityTag, inner: EntityInner) -> Self {
        Self {
            id,
            tag,
            inner,
            status: StatusFlags::empty(),
        }
    }

    /// Creates an entity whose tag is derived from `inner`.
    #[must_use]
    pub const fn from_inner(id: EntityId, inner: EntityInner) -> Self {
        Self::new(id, inner.tag(), inner)
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns a reference to the entity's inner component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns a mutable reference to the entity's inner component storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns the lifecycle flags.
    #[must_use]
    pub const fn status(&self) -> StatusFlags {
        self.status
    }

    /// Sets a lifecycle flag.
    pub fn mark(&mut self, flag: StatusFlags) {
        self.status.insert(flag);
    }

    /// Returns `true` once the entity is flagged for removal.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.status.is_removable()
    }

    /// Returns `true` if this entity is a tank.
    #[must_use]
    pub const fn is_tank(&self) -> bool {
        matches!(self.tag, EntityTag::Tank)
    }

    /// Returns `true` if this entity is a bullet.
    #[must_use]
    pub const fn is_bullet(&self) -> bool {
        matches!(self.tag, EntityTag::Bullet)
    }

    /// Returns `true` if this entity is a wall.
    #[must_use]
    pub const fn is_wall(&self) -> bool {
        matches!(self.tag, EntityTag::Wall)
    }

    /// Returns `true` if this entity is the base.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        matches!(self.tag, EntityTag::Base)
    }

    /// Returns the tank components if this is a tank, `None` otherwise.
    #[must_use]
    pub const fn as_tank(&self) -> Option<&TankComponents> {
        self.inner.as_tank()
    }

    /// Returns mutable tank components if this is a tank, `None` otherwise.
    #[must_use]
    pub fn as_tank_mut(&mut self) -> Option<&mut TankComponents> {
        self.inner.as_tank_mut()
    }

    /// Returns the bullet components if this is a bullet, `None` otherwise.
    #[must_use]
    pub const fn as_bullet(&self) -> Option<&BulletComponents> {
        self.inner.as_bullet()
    }

    /// Returns mutable bullet components if this is a bullet, `None` otherwise.
    #[must_use]
    pub fn as_bullet_mut(&mut self) -> Option<&mut BulletComponents> {
        self.inner.as_bullet_mut()
    }

    /// Returns the wall components if this is a wall, `None` otherwise.
    #[must_use]
    pub const fn as_wall(&self) -> Option<&WallComponents> {
        self.inner.as_wall()
    }

    /// Returns the base components if this is the base, `None` otherwise.
    #[must_use]
    pub const fn as_base(&self) -> Option<&BaseComponents> {
        self.inner.as_base()
    }
}

impl From<TankComponents> for EntityInner {
    fn from(c: TankComponents) -> Self {
        Self::Tank(c)
    }
}

impl From<BulletComponents> for EntityInner {
    fn from(c: BulletComponents) -> Self {
        Self::Bullet(c)
    }
}

impl From<WallComponents> for EntityInner {
    fn from(c: WallComponents) -> Self {
        Self::Wall(c)
    }
}

impl From<BaseComponents> for EntityInner {
    fn from(c: BaseComponents) -> Self {
        Self::Base(c)
    }
}
