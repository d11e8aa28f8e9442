//! Solidity and friction lookups over a loaded world.

use blockworld_voxel::{BlockPos, World};
use glam::{DVec3, IVec3};

use crate::aabb::Aabb;
use crate::raycast::{RayHit, ray_trace_block};

/// Read-only view of a [`World`] for collision queries.
///
/// Cells in unloaded chunks count as solid, so nothing moves or sees into
/// terrain that has not been generated yet.
#[derive(Clone, Copy)]
pub struct WorldSolidity<'w> {
    world: &'w World,
}

impl<'w> WorldSolidity<'w> {
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    pub fn is_solid(&self, cell: IVec3) -> bool {
        match self.world.get_voxel(to_block(cell)) {
            Some(voxel) => self.world.catalog().is_solid(voxel),
            None => true,
        }
    }

    /// Friction of the block at `cell`, or `None` if it is not loaded.
    pub fn block_friction(&self, cell: IVec3) -> Option<f32> {
        let voxel = self.world.get_voxel(to_block(cell))?;
        Some(self.world.catalog().friction(voxel))
    }

    /// Friction of the block directly under the centre of `aabb`'s bottom
    /// face, or `None` if that block is not loaded.
    pub fn ground_friction(&self, aabb: &Aabb) -> Option<f32> {
        let center = aabb.center();
        let below = DVec3::new(center.x, aabb.min.y - 0.5, center.z);
        self.block_friction(below.floor().as_ivec3())
    }

    /// First solid block on the segment `start → end`.
    pub fn ray_trace(&self, start: DVec3, end: DVec3) -> Option<RayHit> {
        ray_trace_block(start, end, |cell| self.is_solid(cell))
    }
}

fn to_block(cell: IVec3) -> BlockPos {
    BlockPos::new(cell.x, cell.y, cell.z)
}
