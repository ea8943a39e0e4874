//! Per-tank AI state.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Ticks an attacking tank waits between shots, on top of its own cooldown.
pub const ATTACK_COOLDOWN_TICKS: u32 = 30;

/// Consecutive ticks without progress before a patrol picks a new waypoint.
pub const STUCK_LIMIT: u32 = 10;

/// Distance at which a waypoint counts as reached.
pub const ARRIVAL_RADIUS: f32 = 20.0;

/// Behaviour an AI tank is currently running.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    /// Wander between random waypoints.
    #[default]
    Patrol,
    /// Chase and shoot a target tank.
    Attack,
    /// Circle the base.
    Defend,
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patrol => write!(f, "patrol"),
            Self::Attack => write!(f, "attack"),
            Self::Defend => write!(f, "defend"),
        }
    }
}

/// Transient state the engine keeps for one AI tank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    /// Current behaviour.
    pub mode: AiMode,
    /// Tank being attacked. Revalidated before every use.
    pub target: Option<EntityId>,
    /// Patrol destination for the tank's top-left corner.
    pub waypoint: Option<Vec2>,
    /// Ticks until the next attack shot is allowed.
    pub attack_cooldown: u32,
    /// Consecutive patrol ticks that made no progress.
    pub stuck_ticks: u32,
    /// Simulated time of the last decision; `None` until the first.
    pub last_decision_ms: Option<u64>,
}

impl AiState {
    /// Fresh patrol state with no waypoint and no decision yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a decision is due at `now_ms`.
    ///
    /// The first call always returns true.
    #[must_use]
    pub fn decision_due(&self, now_ms: u64, interval_ms: u64) -> bool {
        match self.last_decision_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        }
    }

    /// Counts one tick off the attack cooldown.
    pub fn cool_down(&mut self) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);
    }

    /// Switches mode, returning the previous one if it changed.
    pub fn switch(&mut self, mode: AiMode) -> Option<AiMode> {
        let previous = self.mode;
        self.mode = mode;
        (previous != mode).then_some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_decision_is_always_due() {
        let state = AiState::new();
        assert!(state.decision_due(0, 1000));
    }

    #[test]
    fn decisions_follow_interval() {
        let state = AiState {
            last_decision_ms: Some(1000),
            ..AiState::new()
        };
        assert!(!state.decision_due(1999, 1000));
        assert!(state.decision_due(2000, 1000));
    }

    #[test]
    fn cooldown_floors_at_zero() {
        let mut state = AiState {
            attack_cooldown: 1,
            ..AiState::new()
        };
        state.cool_down();
        state.cool_down();
        assert_eq!(state.attack_cooldown, 0);
    }

    #[test]
    fn switch_reports_changes_only() {
        let mut state = AiState::new();
        assert_eq!(state.switch(AiMode::Patrol), None);
        assert_eq!(state.switch(AiMode::Attack), Some(AiMode::Patrol));
        assert_eq!(state.mode, AiMode::Attack);
    }
}
