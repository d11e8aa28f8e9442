#![allow(dead_code)]

use std::sync::Arc;

use blockworld_fluid::{FluidConfig, FluidState};
use blockworld_lighting::LightConfig;
use blockworld_sim::Simulation;
use blockworld_voxel::{BlockCatalog, BlockDef, BlockId, CHUNK_SIZE, Chunk, ChunkCoord, Voxel, World};

pub const WATER_MAX_LEVEL: u8 = 7;
pub const LAVA_MAX_LEVEL: u8 = 3;

/// One simulated fluid interval at the default config.
pub const FLUID_DT: f32 = 0.25;

pub struct Blocks {
    pub stone: Voxel,
    pub glass: Voxel,
    pub water: BlockId,
    pub lava: BlockId,
}

impl Blocks {
    pub fn water_source(&self) -> Voxel {
        FluidState::SOURCE.voxel(self.water)
    }

    pub fn lava_source(&self) -> Voxel {
        FluidState::SOURCE.voxel(self.lava)
    }
}

pub fn catalog() -> (Arc<BlockCatalog>, Blocks) {
    let mut catalog = BlockCatalog::new();
    let stone = Voxel::of(catalog.register(BlockDef::solid("stone")).unwrap());
    let glass = Voxel::of(
        catalog
            .register(BlockDef::solid("glass").with_opacity(0))
            .unwrap(),
    );
    let water = catalog
        .register(BlockDef::fluid("water", 2, WATER_MAX_LEVEL))
        .unwrap();
    let lava = catalog
        .register(BlockDef::fluid("lava", 15, LAVA_MAX_LEVEL).with_luminance(15))
        .unwrap();
    (
        Arc::new(catalog),
        Blocks {
            stone,
            glass,
            water,
            lava,
        },
    )
}

/// Stone floor at y = 0 in every chunk with `coord.y == 0`, air elsewhere.
pub fn floor_world(catalog: Arc<BlockCatalog>, stone: Voxel) -> World {
    World::new(catalog, move |coord: ChunkCoord, voxels: &mut [Voxel]| {
        if coord.y == 0 {
            for x in 0..CHUNK_SIZE as u8 {
                for z in 0..CHUNK_SIZE as u8 {
                    voxels[Chunk::index(x, 0, z)] = stone;
                }
            }
        }
    })
}

/// Solid chunk (0, 0, 0) holding a 10x10x3 basin with its floor at y = 1, a
/// one-wide shaft from the basin roof up to y = 14 above (5, _, 5), and
/// optionally a pit in the basin floor at (8, 1, 5).
pub fn basin_world(catalog: Arc<BlockCatalog>, stone: Voxel, pit: bool) -> World {
    World::new(catalog, move |coord: ChunkCoord, voxels: &mut [Voxel]| {
        if coord != ChunkCoord::new(0, 0, 0) {
            return;
        }
        voxels.fill(stone);
        for x in 1..=10 {
            for z in 1..=10 {
                for y in 2..=4 {
                    voxels[Chunk::index(x, y, z)] = Voxel::AIR;
                }
            }
        }
        for y in 5..=14 {
            voxels[Chunk::index(5, y, 5)] = Voxel::AIR;
        }
        if pit {
            voxels[Chunk::index(8, 1, 5)] = Voxel::AIR;
        }
    })
}

pub fn simulation(world: World, sky_column: bool) -> Simulation {
    let light = LightConfig {
        unattenuated_sky_column: sky_column,
        ..Default::default()
    };
    Simulation::new(world, light, FluidConfig::default())
}

pub fn settle(sim: &mut Simulation) {
    assert!(
        sim.run_until_settled(FLUID_DT, 10_000).is_some(),
        "simulation did not settle"
    );
}

/// Sky and torch light of every loaded chunk, in a stable order.
pub fn light_snapshot(world: &World) -> Vec<(ChunkCoord, Vec<u8>)> {
    let mut coords: Vec<ChunkCoord> = world.loaded_coords().copied().collect();
    coords.sort_by_key(|c| (c.x, c.y, c.z));
    coords
        .into_iter()
        .map(|coord| {
            let light = world.get_chunk(coord).unwrap().light_field();
            (coord, light.iter().map(|l| l.0).collect())
        })
        .collect()
}
