//! Two-channel (sky / torch) voxel lighting.
//!
//! Light is a 4-bit level per channel stored in each chunk's light field.
//! [`LightEngine`] keeps it consistent with the voxels: full rebuilds when a
//! chunk loads, and incremental remove-then-respread passes when a voxel
//! changes. Work is queued from world events and drained under a per-update
//! budget.

mod engine;
mod propagate;

pub use engine::{LightConfig, LightEngine, LightState};
pub use propagate::{LightChannel, LightRules};
