//! Game events for telemetry, audio cues and tests.
//!
//! Every state change worth reporting is recorded as a [`GameEvent`] stamped
//! with the tick it happened on. The log never feeds back into the
//! simulation; callers drain it with [`EventLog::take`] (usually once per
//! tick through `Simulation::take_events`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ai::AiMode;
use crate::entity::{EntityId, TankKind};

/// Which side won a finished match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// Every enemy tank was destroyed.
    Player,
    /// The player died or the base was hit.
    Enemy,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A match began.
    MatchStarted {
        /// Tanks on the field.
        tanks: usize,
        /// Walls on the field.
        walls: usize,
    },
    /// A tank fired.
    BulletFired {
        /// New bullet.
        bullet: EntityId,
        /// Firing tank.
        owner: EntityId,
    },
    /// A bullet left the playfield.
    BulletExpired {
        /// Removed bullet.
        bullet: EntityId,
    },
    /// A bullet struck a wall.
    BulletStopped {
        /// Removed bullet.
        bullet: EntityId,
        /// Wall it struck.
        wall: EntityId,
    },
    /// A soil wall was destroyed.
    WallDestroyed {
        /// Destroyed wall.
        wall: EntityId,
    },
    /// A tank lost a hit point.
    TankHit {
        /// Damaged tank.
        tank: EntityId,
        /// Bullet responsible.
        bullet: EntityId,
        /// Hit points left.
        remaining: u32,
    },
    /// A tank reached zero hit points.
    TankDestroyed {
        /// Destroyed tank.
        tank: EntityId,
        /// Its kind.
        kind: TankKind,
    },
    /// A bullet struck the base.
    BaseDestroyed {
        /// Bullet responsible.
        bullet: EntityId,
    },
    /// An AI tank switched behaviour.
    AiStateChanged {
        /// The tank.
        tank: EntityId,
        /// Previous mode.
        from: AiMode,
        /// New mode.
        to: AiMode,
    },
    /// An enemy could not be placed.
    SpawnSkipped {
        /// Kind that was dropped.
        kind: TankKind,
    },
    /// The match reached a terminal state.
    MatchOver {
        /// Winning side.
        winner: Winner,
    },
}

/// A [`GameEvent`] with the tick it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Tick number.
    pub tick: u64,
    /// What happened.
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Append-only per-tick event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TimedEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Records an event.
    pub fn record(&mut self, tick: u64, event: GameEvent) {
        self.events.push(TimedEvent { tick, event });
    }

    /// Drains every recorded event in recording order.
    pub fn take(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drops every undrained event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn pending(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Number of undrained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is waiting to be drained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
