//! Discrete player intents consumed by [`crate::simulation::Simulation::step`].
//!
//! The input layer maps devices to [`Intent`]s and never touches entity
//! state. Movement keys map to [`Intent::BeginMove`] on press and
//! [`Intent::EndMove`] on release; the simulation keeps the held direction
//! and moves the player every tick while it matches the facing.

use serde::{Deserialize, Serialize};

use crate::geometry::Direction;

/// One discrete request from the input layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Face a direction without moving.
    Rotate(Direction),
    /// Face a direction, take one step, and hold it.
    BeginMove(Direction),
    /// Release a held direction.
    EndMove(Direction),
    /// Fire, subject to cooldown.
    Fire,
    /// Start the match over from the same map source.
    Restart,
    /// Leave the match.
    ReturnToMenu,
}

/// Intents gathered for one tick, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    intents: Vec<Intent>,
}

impl InputFrame {
    /// An empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            intents: Vec::new(),
        }
    }

    /// Appends an intent.
    #[must_use]
    pub fn with(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    /// Appends an intent in place.
    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Intents in arrival order.
    #[must_use]
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// True if no intents were gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

impl FromIterator<Intent> for InputFrame {
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        Self {
            intents: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_preserves_order() {
        let frame = InputFrame::new()
            .with(Intent::Rotate(Direction::Left))
            .with(Intent::Fire);
        assert_eq!(frame.intents(), &[Intent::Rotate(Direction::Left), Intent::Fire]);
    }

    #[test]
    fn collect_into_frame() {
        let frame: InputFrame = [Intent::Fire, Intent::Restart].into_iter().collect();
        assert_eq!(frame.intents().len(), 2);
        assert_eq!(frame.intents()[1], Intent::Restart);
        assert!(InputFrame::default().is_empty());
    }
}
