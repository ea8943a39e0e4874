//! Arena module: the world container.
//!
//! The Arena owns every entity of a match. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity lifecycle management (spawn, flag, sweep)
//! - Typed views over tanks, bullets, walls and the base
//! - The tick counter and the playfield extent
//!
//! # Deferred Removal
//!
//! Passes that destroy entities never remove them directly. They set a
//! [`StatusFlags`] bit on the entity and keep iterating; [`Arena::sweep`]
//! compacts flagged entities once the pass is over. Typed views skip flagged
//! entities, so a wall destroyed earlier in a pass no longer blocks anything
//! later in the same pass.
//!
//! # Example
//!
//! ```
//! use tankbattle_core::arena::Arena;
//! use tankbattle_core::entity::{StatusFlags, WallComponents, WallKind};
//! use tankbattle_core::geometry::Playfield;
//! use glam::Vec2;
//!
//! let mut arena = Arena::new(Playfield::default());
//! let wall = arena.spawn(WallComponents::new(WallKind::Soil, Vec2::ZERO, 40.0));
//!
//! arena.mark(wall, StatusFlags::DESTROYED);
//! assert_eq!(arena.walls().count(), 0);
//! assert_eq!(arena.entity_count(), 1);
//!
//! assert_eq!(arena.sweep(), vec![wall]);
//! assert!(arena.is_empty());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::entity::{
    BaseComponents, BulletComponents, Entity, EntityId, EntityInner, StatusFlags,
    TankComponents, TankKind, WallComponents,
};
use crate::geometry::{Playfield, Rect};

/// Container for all simulation entities.
///
/// # Determinism
///
/// Entity ids are assigned monotonically and stored in a `BTreeMap`, so
/// iteration always follows spawn order. Ids are not reused after a clear,
/// which keeps stale handles held by the AI or vision maps from resolving to
/// a different entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Current simulation tick.
    tick: u64,
    /// Extent of the coordinate space.
    playfield: Playfield,
}

impl Arena {
    /// Creates an empty arena at tick 0.
    #[must_use]
    pub fn new(playfield: Playfield) -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            tick: 0,
            playfield,
        }
    }

    /// Spawns a new entity and returns its id.
    ///
    /// The tag is derived from the component variant.
    pub fn spawn(&mut self, inner: impl Into<EntityInner>) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::from_inner(id, inner.into()));
        id
    }

    /// Removes an entity immediately, returning it if it existed.
    ///
    /// Simulation passes should prefer [`Arena::mark`] plus [`Arena::sweep`].
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Flags an entity. Unknown ids are ignored.
    pub fn mark(&mut self, id: EntityId, flag: StatusFlags) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mark(flag);
        }
    }

    /// Removes every flagged entity and returns their ids in id order.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let removed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.is_destroyed())
            .map(Entity::id)
            .collect();
        for id in &removed {
            self.entities.remove(id);
        }
        removed
    }

    /// Removes every entity and resets the tick. The id counter keeps going.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.tick = 0;
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns an iterator over entity IDs in deterministic (sorted) order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in deterministic (sorted by ID) order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities, flagged ones included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances the simulation tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Returns the playfield extent.
    #[must_use]
    pub const fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    // =========================================================================
    // Typed views (flagged entities are skipped)
    // =========================================================================

    fn live(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(|e| !e.is_destroyed())
    }

    /// Unflagged tanks, dead or alive, in id order.
    pub fn tanks(&self) -> impl Iterator<Item = (EntityId, &TankComponents)> + '_ {
        self.live().filter_map(|e| e.as_tank().map(|t| (e.id(), t)))
    }

    /// Tanks with hit points remaining.
    pub fn living_tanks(&self) -> impl Iterator<Item = (EntityId, &TankComponents)> + '_ {
        self.tanks().filter(|(_, t)| t.is_alive())
    }

    /// Unflagged bullets in id order.
    pub fn bullets(&self) -> impl Iterator<Item = (EntityId, &BulletComponents)> + '_ {
        self.live().filter_map(|e| e.as_bullet().map(|b| (e.id(), b)))
    }

    /// Unflagged walls in id order.
    pub fn walls(&self) -> impl Iterator<Item = (EntityId, &WallComponents)> + '_ {
        self.live().filter_map(|e| e.as_wall().map(|w| (e.id(), w)))
    }

    /// The base, if one exists and is not destroyed.
    #[must_use]
    pub fn base(&self) -> Option<(EntityId, &BaseComponents)> {
        self.live().find_map(|e| e.as_base().map(|b| (e.id(), b)))
    }

    /// The first living player tank.
    #[must_use]
    pub fn player(&self) -> Option<(EntityId, &TankComponents)> {
        self.living_tanks().find(|(_, t)| t.kind == TankKind::Player)
    }

    /// Tank components by id, if the id names an unflagged tank.
    #[must_use]
    pub fn tank(&self, id: EntityId) -> Option<&TankComponents> {
        self.entities
            .get(&id)
            .filter(|e| !e.is_destroyed())
            .and_then(Entity::as_tank)
    }

    /// Mutable tank components by id.
    #[must_use]
    pub fn tank_mut(&mut self, id: EntityId) -> Option<&mut TankComponents> {
        self.entities
            .get_mut(&id)
            .filter(|e| !e.is_destroyed())
            .and_then(Entity::as_tank_mut)
    }

    /// Ids of unflagged tanks, collected so callers can mutate while walking.
    #[must_use]
    pub fn tank_ids(&self) -> Vec<EntityId> {
        self.tanks().map(|(id, _)| id).collect()
    }

    /// Ids of unflagged bullets.
    #[must_use]
    pub fn bullet_ids(&self) -> Vec<EntityId> {
        self.bullets().map(|(id, _)| id).collect()
    }

    /// True if `rect` overlaps any unflagged wall or any living tank other
    /// than `ignore`.
    #[must_use]
    pub fn is_blocked(&self, rect: &Rect, ignore: Option<EntityId>) -> bool {
        self.walls().any(|(_, w)| rect.intersects(&w.rect()))
            || self
                .living_tanks()
                .any(|(id, t)| Some(id) != ignore && rect.intersects(&t.rect()))
    }

    /// Order-sensitive hash of every entity's observable state.
    ///
    /// Two arenas with the same hash hold the same entities in the same
    /// places. Floats are hashed by bit pattern.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for entity in self.entities_sorted() {
            entity.id().hash(&mut hasher);
            entity.status().bits().hash(&mut hasher);
            match entity.inner() {
                EntityInner::Tank(t) => {
                    t.position.x.to_bits().hash(&mut hasher);
                    t.position.y.to_bits().hash(&mut hasher);
                    t.facing.hash(&mut hasher);
                    t.hit_points.hash(&mut hasher);
                    t.last_shot_ms.hash(&mut hasher);
                }
                EntityInner::Bullet(b) => {
                    b.position.x.to_bits().hash(&mut hasher);
                    b.position.y.to_bits().hash(&mut hasher);
                    b.owner.hash(&mut hasher);
                }
                EntityInner::Wall(w) => {
                    w.position.x.to_bits().hash(&mut hasher);
                    w.position.y.to_bits().hash(&mut hasher);
                    w.kind.hash(&mut hasher);
                }
                EntityInner::Base(b) => {
                    b.position.x.to_bits().hash(&mut hasher);
                    b.position.y.to_bits().hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(Playfield::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
