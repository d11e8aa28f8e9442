//! Owning tick loop for the blockworld engines.
//!
//! [`Simulation`] holds the [`World`](blockworld_voxel::World) together with
//! the light and fluid engines, and is the only place world events are
//! drained and handed out.

mod simulation;

pub use simulation::{Simulation, TickStats};
