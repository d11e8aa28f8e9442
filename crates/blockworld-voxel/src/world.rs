//! The world registry: sole owner of loaded chunks and sole writer of voxel
//! identity.
//!
//! All global ↔ chunk-local coordinate math lives here. The lighting and
//! fluid engines address the world purely by [`BlockPos`] and treat a `None`
//! answer as "not loaded, try again later".

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::catalog::BlockCatalog;
use crate::chunk::{CHUNK_VOLUME, Chunk, SAVE_DIRTY, VoxelLight};
use crate::coords::{BlockPos, ChunkCoord};
use crate::events::{ChangeOrigin, VoxelChange, WorldEvent, WorldEventBuffer};
use crate::voxel::{BlockId, Voxel};

/// Fills a freshly allocated chunk buffer.
///
/// Implementations must write a valid voxel into every one of the
/// `CHUNK_VOLUME` slots (indexed as [`Chunk::index`]) before returning. The
/// buffer arrives filled with air.
pub trait ChunkGenerator {
    fn generate(&mut self, coord: ChunkCoord, voxels: &mut [Voxel]);
}

impl<F> ChunkGenerator for F
where
    F: FnMut(ChunkCoord, &mut [Voxel]),
{
    fn generate(&mut self, coord: ChunkCoord, voxels: &mut [Voxel]) {
        self(coord, voxels)
    }
}

#[derive(Debug, Error)]
pub enum WorldError {
    /// The generator produced a voxel whose type is not in the catalog.
    #[error("chunk {coord:?}: generator produced unknown block id {block} at index {index}")]
    UnknownBlock {
        coord: ChunkCoord,
        index: usize,
        block: u16,
    },
}

/// Sparse map from chunk coordinate to [`Chunk`], plus the catalog and the
/// generator used to populate new chunks.
pub struct World {
    catalog: Arc<BlockCatalog>,
    generator: Box<dyn ChunkGenerator>,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    events: WorldEventBuffer,
}

impl World {
    pub fn new(catalog: Arc<BlockCatalog>, generator: impl ChunkGenerator + 'static) -> Self {
        Self {
            catalog,
            generator: Box::new(generator),
            chunks: FxHashMap::default(),
            events: WorldEventBuffer::new(),
        }
    }

    /// Read-only access to the block catalog.
    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    /// Shared handle to the block catalog.
    pub fn catalog_handle(&self) -> Arc<BlockCatalog> {
        Arc::clone(&self.catalog)
    }

    // -----------------------------------------------------------------------
    // Chunks
    // -----------------------------------------------------------------------

    /// Returns the chunk at `coord` if it is loaded. Never generates.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Returns the chunk at `coord`, generating and registering it first if
    /// needed. A newly created chunk fires [`WorldEvent::ChunkLoaded`].
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownBlock`] if the generator wrote a block id
    /// the catalog does not know. The chunk is not registered in that case.
    pub fn load_chunk(&mut self, coord: ChunkCoord) -> Result<&Chunk, WorldError> {
        if self.chunks.contains_key(&coord) {
            return Ok(&self.chunks[&coord]);
        }

        let mut buffer = vec![Voxel::AIR; CHUNK_VOLUME];
        self.generator.generate(coord, &mut buffer);
        if let Some(index) = buffer.iter().position(|v| !self.catalog.contains(v.block())) {
            let block = buffer[index].block().0;
            tracing::error!(
                "Rejecting chunk {:?}: unknown block id {} at index {}",
                coord,
                block,
                index
            );
            return Err(WorldError::UnknownBlock {
                coord,
                index,
                block,
            });
        }

        tracing::debug!("Loaded chunk {:?}", coord);
        self.events.send(WorldEvent::ChunkLoaded(coord));
        Ok(self.chunks.entry(coord).or_insert(Chunk::from_voxels(buffer)))
    }

    /// Removes the chunk at `coord`, firing [`WorldEvent::ChunkUnloaded`].
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let chunk = self.chunks.remove(&coord)?;
        tracing::debug!(
            "Unloaded chunk {:?} (unsaved edits: {})",
            coord,
            chunk.is_dirty(SAVE_DIRTY)
        );
        self.events.send(WorldEvent::ChunkUnloaded(coord));
        Some(chunk)
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn loaded_coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.chunks.keys()
    }

    /// Mutable chunk access for bookkeeping such as clearing dirty flags.
    ///
    /// Voxel and light writes should go through the world-level setters so
    /// events are recorded.
    pub fn get_chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    // -----------------------------------------------------------------------
    // Voxels
    // -----------------------------------------------------------------------

    /// Returns the voxel at `pos`, or `None` if its chunk is not loaded.
    pub fn get_voxel(&self, pos: BlockPos) -> Option<Voxel> {
        let (coord, local) = pos.split();
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.get(local.x, local.y, local.z))
    }

    /// Writes a voxel on behalf of an external caller.
    ///
    /// Returns the previous voxel, or `None` if the chunk is not loaded.
    pub fn set_voxel(&mut self, pos: BlockPos, voxel: Voxel) -> Option<Voxel> {
        self.set_voxel_from(pos, voxel, ChangeOrigin::External)
    }

    /// Writes a voxel and records a [`WorldEvent::VoxelChanged`] tagged with
    /// `origin` before returning. Writing the value already stored is not a
    /// change and records nothing.
    ///
    /// # Panics
    ///
    /// Panics if `voxel` references a block id the catalog does not know.
    pub fn set_voxel_from(
        &mut self,
        pos: BlockPos,
        voxel: Voxel,
        origin: ChangeOrigin,
    ) -> Option<Voxel> {
        assert!(
            self.catalog.contains(voxel.block()),
            "set_voxel with unknown block id {}",
            voxel.block().0
        );
        let (coord, local) = pos.split();
        let chunk = self.chunks.get_mut(&coord)?;
        let old = chunk.set(local.x, local.y, local.z, voxel);
        if old != voxel {
            self.events.send(WorldEvent::VoxelChanged(VoxelChange {
                pos,
                new: voxel,
                old,
                origin,
            }));
        }
        Some(old)
    }

    /// Block type at `pos`, or `None` if not loaded.
    pub fn get_block(&self, pos: BlockPos) -> Option<BlockId> {
        self.get_voxel(pos).map(Voxel::block)
    }

    // -----------------------------------------------------------------------
    // Light
    // -----------------------------------------------------------------------

    pub fn get_light(&self, pos: BlockPos) -> Option<VoxelLight> {
        let (coord, local) = pos.split();
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.light(local.x, local.y, local.z))
    }

    pub fn get_skylight(&self, pos: BlockPos) -> Option<u8> {
        self.get_light(pos).map(VoxelLight::skylight)
    }

    pub fn get_torchlight(&self, pos: BlockPos) -> Option<u8> {
        self.get_light(pos).map(VoxelLight::torchlight)
    }

    /// Light-field write. Reserved for the lighting engine.
    ///
    /// Returns `false` if the chunk is not loaded.
    pub fn set_skylight(&mut self, pos: BlockPos, level: u8) -> bool {
        let (coord, local) = pos.split();
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.set_skylight(local.x, local.y, local.z, level);
                true
            }
            None => false,
        }
    }

    /// Light-field write. Reserved for the lighting engine.
    ///
    /// Returns `false` if the chunk is not loaded.
    pub fn set_torchlight(&mut self, pos: BlockPos, level: u8) -> bool {
        let (coord, local) = pos.split();
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.set_torchlight(local.x, local.y, local.z, level);
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Pending events, oldest first.
    pub fn events(&self) -> &WorldEventBuffer {
        &self.events
    }

    /// Removes and returns all pending events.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        self.events.drain()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BlockDef;
    use crate::chunk::CHUNK_SIZE;

    fn catalog() -> Arc<BlockCatalog> {
        let mut catalog = BlockCatalog::new();
        catalog.register(BlockDef::solid("stone")).unwrap();
        Arc::new(catalog)
    }

    /// Stone below y = 0, air above.
    fn layered_world() -> World {
        World::new(catalog(), |coord: ChunkCoord, voxels: &mut [Voxel]| {
            if coord.y < 0 {
                voxels.fill(Voxel::of(BlockId(1)));
            }
        })
    }

    #[test]
    fn test_get_chunk_never_generates() {
        let world = layered_world();
        assert!(world.get_chunk(ChunkCoord::new(0, 0, 0)).is_none());
        assert_eq!(world.loaded_count(), 0);
        assert!(world.get_voxel(BlockPos::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_load_chunk_generates_once_and_fires_event() {
        let mut world = layered_world();
        let coord = ChunkCoord::new(0, -1, 0);
        assert_eq!(
            world.load_chunk(coord).unwrap().get(0, 0, 0),
            Voxel::of(BlockId(1))
        );
        world.load_chunk(coord).unwrap();
        assert_eq!(world.loaded_count(), 1);
        assert_eq!(world.take_events(), vec![WorldEvent::ChunkLoaded(coord)]);
    }

    #[test]
    fn test_generator_output_is_validated() {
        let mut world = World::new(catalog(), |_: ChunkCoord, voxels: &mut [Voxel]| {
            voxels[5] = Voxel::of(BlockId(99));
        });
        let err = world.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            WorldError::UnknownBlock {
                index: 5,
                block: 99,
                ..
            }
        ));
        assert_eq!(world.loaded_count(), 0);
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_negative_positions_resolve_to_correct_chunk() {
        let mut world = layered_world();
        world.load_chunk(ChunkCoord::new(-1, -1, -1)).unwrap();
        assert_eq!(
            world.get_voxel(BlockPos::new(-1, -1, -1)),
            Some(Voxel::of(BlockId(1)))
        );
        assert_eq!(world.get_voxel(BlockPos::new(0, -1, -1)), None);
    }

    #[test]
    fn test_set_voxel_returns_old_and_records_event() {
        let mut world = layered_world();
        world.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        world.take_events();

        let pos = BlockPos::new(3, 4, 5);
        let stone = Voxel::of(BlockId(1));
        assert_eq!(world.set_voxel(pos, stone), Some(Voxel::AIR));
        assert_eq!(world.get_voxel(pos), Some(stone));

        let events = world.take_events();
        assert_eq!(
            events,
            vec![WorldEvent::VoxelChanged(VoxelChange {
                pos,
                new: stone,
                old: Voxel::AIR,
                origin: ChangeOrigin::External,
            })]
        );
    }

    #[test]
    fn test_set_voxel_unloaded_returns_none() {
        let mut world = layered_world();
        assert_eq!(world.set_voxel(BlockPos::new(0, 0, 0), Voxel::AIR), None);
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_set_same_voxel_records_nothing() {
        let mut world = layered_world();
        world.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        world.take_events();
        assert_eq!(
            world.set_voxel(BlockPos::new(1, 1, 1), Voxel::AIR),
            Some(Voxel::AIR)
        );
        assert!(world.events().is_empty());
    }

    #[test]
    #[should_panic(expected = "unknown block id")]
    fn test_set_voxel_unknown_block_panics() {
        let mut world = layered_world();
        world.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        world.set_voxel(BlockPos::new(0, 0, 0), Voxel::of(BlockId(7)));
    }

    #[test]
    fn test_light_accessors() {
        let mut world = layered_world();
        world.load_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        let pos = BlockPos::new(CHUNK_SIZE as i32 - 1, 0, 2);
        assert!(world.set_skylight(pos, 12));
        assert!(world.set_torchlight(pos, 3));
        assert_eq!(world.get_skylight(pos), Some(12));
        assert_eq!(world.get_torchlight(pos), Some(3));
        assert!(!world.set_skylight(BlockPos::new(-1, 0, 0), 1));
        assert_eq!(world.get_light(BlockPos::new(-1, 0, 0)), None);
    }

    #[test]
    fn test_unload_fires_event() {
        let mut world = layered_world();
        let coord = ChunkCoord::new(2, 0, 0);
        world.load_chunk(coord).unwrap();
        world.take_events();
        assert!(world.unload_chunk(coord).is_some());
        assert!(world.unload_chunk(coord).is_none());
        assert_eq!(world.take_events(), vec![WorldEvent::ChunkUnloaded(coord)]);
    }
}
