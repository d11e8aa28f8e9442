//! Level-based fluid automaton.
//!
//! Fluid voxels carry a [`FluidState`] in their variant bits: a level where
//! `0` is an infinite source and larger values are weaker, plus a falling
//! flag for gravity-fed columns. [`FluidEngine`] spreads, drops and retracts
//! fluid one breadth-first ring per fixed tick.

mod engine;
mod flow;
mod state;

pub use engine::{FluidConfig, FluidEngine};
pub use state::FluidState;
