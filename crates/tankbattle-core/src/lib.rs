//! # Tank Battle Core
//!
//! Simulation core for Tank Battle, a top-down tank-combat arcade game.
//!
//! This crate owns everything that decides what happens in a match and
//! nothing that draws it. A renderer reads [`snapshot::WorldSnapshot`]s, an
//! input layer feeds [`input::InputFrame`]s, and a map loader hands over
//! [`map::MapLayout`]s.
//!
//! ## Architecture
//!
//! - **Entities** ([`entity`], [`arena`]): tanks, bullets, walls and the base,
//!   stored by stable [`entity::EntityId`] with mark-then-sweep removal
//! - **Resolvers** ([`resolver`]): bullet motion and the ordered impact passes
//! - **Vision** ([`vision`]): per-tank field of view with wall occlusion and
//!   commander-shared sight
//! - **AI** ([`ai`]): patrol / attack / defend state machine with greedy
//!   steering
//! - **Orchestration** ([`simulation`]): the tick pipeline and match outcome
//!
//! ## Usage
//!
//! ```
//! use tankbattle_core::input::InputFrame;
//! use tankbattle_core::settings::Settings;
//! use tankbattle_core::simulation::{Control, Simulation};
//!
//! let settings = Settings::default().with_difficulty("easy").unwrap();
//! let mut sim = Simulation::new(settings, 2024).unwrap();
//! sim.start_random_match();
//!
//! for _ in 0..60 {
//!     if sim.step(&InputFrame::new()) != Control::Running {
//!         break;
//!     }
//! }
//! let frame = sim.snapshot();
//! assert!(!frame.walls.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ai;
pub mod arena;
pub mod entity;
pub mod event;
pub mod geometry;
pub mod input;
pub mod map;
pub mod resolver;
pub mod settings;
pub mod simulation;
pub mod snapshot;
pub mod spawn;
pub mod vision;

#[cfg(test)]
mod tests;
