//! Voxel-accurate collision queries.
//!
//! Everything here is a pure function of a solidity predicate
//! `FnMut(IVec3) -> bool`, so callers decide what "solid" means and where
//! the voxels come from. [`WorldSolidity`] adapts a loaded
//! [`World`](blockworld_voxel::World).

mod aabb;
mod box_cast;
mod raycast;
mod resolve;
mod world_access;

pub use aabb::{Aabb, Axis};
pub use box_cast::{BoxHit, hitboxes_collision};
pub use raycast::{RayHit, ray_trace_block};
pub use resolve::{Movement, move_box};
pub use world_access::WorldSolidity;
