//! World change events.
//!
//! [`World`](crate::World) records a [`WorldEvent`] into its
//! [`WorldEventBuffer`] synchronously inside every successful mutation, after
//! the write and before the call returns. The owning tick loop drains the
//! buffer and hands each event to the engines, which turn them into entries
//! in their own work queues.

use crate::coords::{BlockPos, ChunkCoord};
use crate::voxel::Voxel;

/// Which subsystem issued a voxel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Gameplay, tools, or any caller outside the simulation engines.
    External,
    /// The fluid engine updating fluid levels.
    Fluid,
}

/// One voxel write: `(position, new, old)` plus who made it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelChange {
    pub pos: BlockPos,
    pub new: Voxel,
    pub old: Voxel,
    pub origin: ChangeOrigin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// A voxel changed identity or variant.
    VoxelChanged(VoxelChange),
    /// A chunk was generated and registered.
    ChunkLoaded(ChunkCoord),
    /// A chunk was removed from the world.
    ChunkUnloaded(ChunkCoord),
}

/// FIFO of events awaiting dispatch.
#[derive(Debug, Default)]
pub struct WorldEventBuffer {
    events: Vec<WorldEvent>,
}

impl WorldEventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// Returns the pending events without consuming them.
    pub fn read(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.iter()
    }

    /// Removes and returns every pending event in the order it was sent.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
