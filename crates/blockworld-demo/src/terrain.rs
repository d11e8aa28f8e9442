//! Heightmap terrain with lakes.

use blockworld_config::TerrainConfig;
use blockworld_fluid::FluidState;
use blockworld_voxel::{BlockCatalog, CHUNK_SIZE, Chunk, ChunkCoord, Voxel};
use noise::{NoiseFn, Simplex};

const OCTAVES: u32 = 4;
const DIRT_DEPTH: i32 = 3;

/// Block types the generator places.
#[derive(Clone, Copy, Debug)]
pub struct TerrainBlocks {
    pub stone: Voxel,
    pub dirt: Voxel,
    pub grass: Voxel,
    pub sand: Voxel,
    pub water: Voxel,
}

impl TerrainBlocks {
    /// Resolves the generator's blocks by name. Returns the first missing
    /// name on failure.
    pub fn from_catalog(catalog: &BlockCatalog) -> Result<Self, &'static str> {
        let get = |name: &'static str| catalog.lookup_by_name(name).ok_or(name);
        Ok(Self {
            stone: Voxel::of(get("stone")?),
            dirt: Voxel::of(get("dirt")?),
            grass: Voxel::of(get("grass")?),
            sand: Voxel::of(get("sand")?),
            water: FluidState::SOURCE.voxel(get("water")?),
        })
    }
}

/// Fills chunks from an fBm heightmap; air under `water_level` becomes
/// still water.
pub struct TerrainGenerator {
    noise: Simplex,
    params: TerrainConfig,
    blocks: TerrainBlocks,
}

impl TerrainGenerator {
    pub fn new(params: TerrainConfig, blocks: TerrainBlocks) -> Self {
        Self {
            noise: Simplex::new(params.seed),
            params,
            blocks,
        }
    }

    /// Surface height of the column at `(x, z)`.
    pub fn height(&self, x: i32, z: i32) -> i32 {
        let mut total = 0.0;
        let mut frequency = self.params.frequency;
        let mut amplitude = 1.0;
        let mut norm = 0.0;
        for _ in 0..OCTAVES {
            total += self.noise.get([x as f64 * frequency, z as f64 * frequency]) * amplitude;
            norm += amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        self.params.base_height + (total / norm * self.params.amplitude).round() as i32
    }

    /// Voxel at world position `(x, y, z)` given the column height.
    fn voxel_at(&self, y: i32, height: i32) -> Voxel {
        let beach = height <= self.params.water_level + 1;
        if y > height {
            if y <= self.params.water_level {
                self.blocks.water
            } else {
                Voxel::AIR
            }
        } else if y == height {
            if beach { self.blocks.sand } else { self.blocks.grass }
        } else if y > height - DIRT_DEPTH {
            if beach { self.blocks.sand } else { self.blocks.dirt }
        } else {
            self.blocks.stone
        }
    }

    pub fn generate(&self, coord: ChunkCoord, voxels: &mut [Voxel]) {
        let origin = coord.origin();
        for lx in 0..CHUNK_SIZE as u8 {
            for lz in 0..CHUNK_SIZE as u8 {
                let height = self.height(origin.x + lx as i32, origin.z + lz as i32);
                for ly in 0..CHUNK_SIZE as u8 {
                    voxels[Chunk::index(lx, ly, lz)] = self.voxel_at(origin.y + ly as i32, height);
                }
            }
        }
    }
}
