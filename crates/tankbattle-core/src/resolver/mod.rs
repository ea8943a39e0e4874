//! Resolver module: bullet motion and the ordered impact passes.
//!
//! Resolvers are the write phase of a tick. Each one walks the arena in id
//! order, flags the entities it destroys and records what happened in the
//! [`EventLog`]. Nothing is removed until [`Arena::sweep`] runs after the last
//! resolver.
//!
//! # Ordering
//!
//! [`default_pipeline`] returns the resolvers in the order they must run:
//!
//! 1. [`BulletMotion`]: advance bullets, flag those that left the playfield
//! 2. [`WallImpact`]: bullets against walls (Soil walls break)
//! 3. [`TankImpact`]: bullets against living tanks other than their owner
//! 4. [`BaseImpact`]: bullets against the base
//!
//! # Invariants
//!
//! - A flagged bullet takes part in no later impact, so each bullet hits at
//!   most one thing per tick.
//! - A wall or tank flagged earlier in the pass no longer stops bullets.
//! - Overlap is strict: touching edges are not an impact.

mod base;
mod motion;
mod tank;
mod wall;

pub use base::BaseImpact;
pub use motion::BulletMotion;
pub use tank::TankImpact;
pub use wall::WallImpact;

use crate::arena::Arena;
use crate::event::EventLog;

/// One write pass over the arena.
///
/// # Example
///
/// ```
/// use tankbattle_core::arena::Arena;
/// use tankbattle_core::event::EventLog;
/// use tankbattle_core::resolver::Resolver;
///
/// struct Noop;
///
/// impl Resolver for Noop {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     fn resolve(&self, _arena: &mut Arena, _events: &mut EventLog) {}
/// }
///
/// let mut arena = Arena::default();
/// Noop.resolve(&mut arena, &mut EventLog::new());
/// ```
pub trait Resolver: Send + Sync {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;

    /// Applies this pass to the arena.
    ///
    /// # Arguments
    ///
    /// * `arena` - World state; flag entities instead of removing them
    /// * `events` - Log receiving one event per state change
    fn resolve(&self, arena: &mut Arena, events: &mut EventLog);
}

/// The resolvers of a tick in execution order.
#[must_use]
pub fn default_pipeline() -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(BulletMotion),
        Box::new(WallImpact),
        Box::new(TankImpact),
        Box::new(BaseImpact),
    ]
}
