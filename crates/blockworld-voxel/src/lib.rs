//! Chunked voxel storage: long-id voxel encoding, the block catalog, dense
//! chunks with a parallel light field, and the world registry that owns them.

pub mod catalog;
pub mod chunk;
pub mod chunk_loading;
pub mod coords;
pub mod events;
pub mod voxel;
pub mod world;

pub use catalog::{BlockCatalog, BlockDef, CatalogError, FluidDef};
pub use chunk::{CHUNK_SIZE, CHUNK_VOLUME, Chunk, MESH_DIRTY, SAVE_DIRTY, VoxelLight};
pub use chunk_loading::{ChunkLoadConfig, ChunkLoadQueue, ChunkStreamTickResult, ChunkStreamer};
pub use coords::{BlockPos, ChunkCoord, Direction, LocalPos};
pub use events::{ChangeOrigin, VoxelChange, WorldEvent, WorldEventBuffer};
pub use voxel::{BlockId, Voxel};
pub use world::{ChunkGenerator, World, WorldError};
