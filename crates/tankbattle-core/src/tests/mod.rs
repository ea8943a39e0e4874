//! Crate-level tests that drive the whole simulation.
//!
//! - `determinism.rs`: same seed and inputs reproduce the same match
//! - `integration.rs`: end-to-end matches through the tick pipeline
//! - `properties.rs`: invariants that hold for any input sequence
//! - `helpers.rs`: scenario setup and factory functions

mod helpers;
mod integration;
