//! Chunk retention: loads chunks around a focus point and evicts distant ones.
//!
//! Chunks within `load_radius` of the focus chunk are queued nearest-first and
//! loaded under a per-tick budget. Chunks beyond `unload_radius` are evicted,
//! also under a budget. The gap between the two radii is a hysteresis band so
//! a focus hovering near a boundary does not thrash.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::chunk::SAVE_DIRTY;
use crate::coords::ChunkCoord;
use crate::world::World;

/// Configuration for the chunk streamer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLoadConfig {
    /// Chunks within this radius (in chunk units) around the focus are loaded.
    pub load_radius: u32,
    /// Chunks beyond this radius are unloaded.
    /// Must be > `load_radius` to create a hysteresis band.
    pub unload_radius: u32,
    /// Maximum number of chunk loads per tick.
    pub loads_per_tick: u32,
    /// Maximum number of chunk unloads per tick.
    pub unloads_per_tick: u32,
}

impl Default for ChunkLoadConfig {
    fn default() -> Self {
        Self {
            load_radius: 4,
            unload_radius: 6,
            loads_per_tick: 4,
            unloads_per_tick: 8,
        }
    }
}

/// Min-heap of chunks awaiting loading, ordered by distance to the focus.
#[derive(Debug, Default)]
pub struct ChunkLoadQueue {
    queue: BinaryHeap<Reverse<(u64, ChunkCoord)>>,
    /// Coordinates already in the queue (dedup guard).
    pending: FxHashSet<ChunkCoord>,
}

impl ChunkLoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a chunk with its squared distance to the focus.
    ///
    /// Duplicates are ignored.
    pub fn enqueue(&mut self, coord: ChunkCoord, dist_sq: u64) {
        if self.pending.insert(coord) {
            self.queue.push(Reverse((dist_sq, coord)));
        }
    }

    /// Dequeues the nearest chunk.
    pub fn dequeue(&mut self) -> Option<(u64, ChunkCoord)> {
        while let Some(Reverse((dist_sq, coord))) = self.queue.pop() {
            if self.pending.remove(&coord) {
                return Some((dist_sq, coord));
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}

/// Outcome of one [`ChunkStreamer::tick`].
#[derive(Debug, Default)]
pub struct ChunkStreamTickResult {
    pub loaded: u32,
    pub unloaded: u32,
    /// Chunks the generator rejected this tick.
    pub failed: Vec<ChunkCoord>,
    /// Chunks unloaded while carrying unsaved edits.
    pub dirty_unloaded: Vec<ChunkCoord>,
}

/// Distance-based chunk loading and eviction policy.
#[derive(Debug)]
pub struct ChunkStreamer {
    config: ChunkLoadConfig,
    load_queue: ChunkLoadQueue,
    /// Chunks the generator rejected. Not retried until they fall outside
    /// `unload_radius`.
    rejected: FxHashSet<ChunkCoord>,
}

impl ChunkStreamer {
    pub fn new(config: ChunkLoadConfig) -> Self {
        if config.unload_radius <= config.load_radius {
            tracing::warn!(
                "unload_radius {} <= load_radius {}: no hysteresis band",
                config.unload_radius,
                config.load_radius
            );
        }
        Self {
            config,
            load_queue: ChunkLoadQueue::new(),
            rejected: FxHashSet::default(),
        }
    }

    pub fn config(&self) -> &ChunkLoadConfig {
        &self.config
    }

    pub fn load_queue(&self) -> &ChunkLoadQueue {
        &self.load_queue
    }

    /// Whether the generator rejected `coord` and it is being skipped.
    pub fn is_rejected(&self, coord: ChunkCoord) -> bool {
        self.rejected.contains(&coord)
    }

    /// Runs one streaming step around `focus`.
    ///
    /// 1. Queues every unloaded chunk within `load_radius`.
    /// 2. Loads up to `loads_per_tick` of them, nearest first.
    /// 3. Unloads up to `unloads_per_tick` chunks beyond `unload_radius`.
    pub fn tick(&mut self, focus: ChunkCoord, world: &mut World) -> ChunkStreamTickResult {
        let mut result = ChunkStreamTickResult::default();

        let lr = self.config.load_radius as i32;
        let lr_sq = (self.config.load_radius as u64).pow(2);
        for dx in -lr..=lr {
            for dy in -lr..=lr {
                for dz in -lr..=lr {
                    let coord = focus.offset(dx, dy, dz);
                    let dist_sq = focus.distance_sq(coord);
                    if dist_sq <= lr_sq
                        && !world.is_loaded(coord)
                        && !self.rejected.contains(&coord)
                    {
                        self.load_queue.enqueue(coord, dist_sq);
                    }
                }
            }
        }

        let mut loads = 0;
        while loads < self.config.loads_per_tick {
            let Some((_dist_sq, coord)) = self.load_queue.dequeue() else {
                break;
            };
            if world.is_loaded(coord) {
                continue;
            }
            loads += 1;
            match world.load_chunk(coord) {
                Ok(_) => result.loaded += 1,
                Err(err) => {
                    tracing::warn!("Chunk streaming skipped {:?}: {}", coord, err);
                    self.rejected.insert(coord);
                    result.failed.push(coord);
                }
            }
        }

        let ur_sq = (self.config.unload_radius as u64).pow(2);
        self.rejected.retain(|coord| coord.distance_sq(focus) <= ur_sq);
        let mut candidates: Vec<ChunkCoord> = world
            .loaded_coords()
            .filter(|coord| coord.distance_sq(focus) > ur_sq)
            .copied()
            .collect();
        // Farthest first so a tight budget evicts the least useful chunks.
        candidates.sort_by_key(|coord| Reverse(coord.distance_sq(focus)));

        for coord in candidates
            .into_iter()
            .take(self.config.unloads_per_tick as usize)
        {
            if let Some(chunk) = world.unload_chunk(coord) {
                if chunk.is_dirty(SAVE_DIRTY) {
                    result.dirty_unloaded.push(coord);
                }
                result.unloaded += 1;
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::{BlockCatalog, BlockDef};
    use crate::coords::BlockPos;
    use crate::voxel::{BlockId, Voxel};

    fn empty_world() -> World {
        let mut catalog = BlockCatalog::new();
        catalog.register(BlockDef::solid("stone")).unwrap();
        World::new(Arc::new(catalog), |_: ChunkCoord, _: &mut [Voxel]| {})
    }

    fn coord(x: i32, y: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x, y, z)
    }

    #[test]
    fn test_chunks_within_radius_loaded() {
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 2,
            unload_radius: 4,
            loads_per_tick: 1000,
            unloads_per_tick: 1000,
        });
        let mut world = empty_world();
        streamer.tick(coord(0, 0, 0), &mut world);

        let mut expected = 0;
        for dx in -2i32..=2 {
            for dy in -2i32..=2 {
                for dz in -2i32..=2 {
                    if dx * dx + dy * dy + dz * dz <= 4 {
                        expected += 1;
                    }
                }
            }
        }
        assert_eq!(world.loaded_count(), expected);
    }

    #[test]
    fn test_hysteresis_band_keeps_chunks() {
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 1,
            unload_radius: 3,
            loads_per_tick: 1000,
            unloads_per_tick: 1000,
        });
        let mut world = empty_world();
        world.load_chunk(coord(3, 0, 0)).unwrap();

        // Distance 3: inside the band, retained.
        streamer.tick(coord(0, 0, 0), &mut world);
        assert!(world.is_loaded(coord(3, 0, 0)));

        // Distance 4: evicted.
        streamer.tick(coord(-1, 0, 0), &mut world);
        assert!(!world.is_loaded(coord(3, 0, 0)));
    }

    #[test]
    fn test_priority_queue_orders_by_distance() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(coord(5, 0, 0), 25);
        queue.enqueue(coord(2, 0, 0), 4);
        queue.enqueue(coord(1, 0, 0), 1);
        queue.enqueue(coord(2, 0, 0), 4);
        assert_eq!(queue.len(), 3);

        let mut distances = Vec::new();
        while let Some((dist_sq, _)) = queue.dequeue() {
            distances.push(dist_sq);
        }
        assert_eq!(distances, vec![1, 4, 25]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_budget_limits_loads_per_tick() {
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 10,
            unload_radius: 12,
            loads_per_tick: 3,
            unloads_per_tick: 8,
        });
        let mut world = empty_world();
        assert_eq!(streamer.tick(coord(0, 0, 0), &mut world).loaded, 3);
        assert_eq!(streamer.tick(coord(0, 0, 0), &mut world).loaded, 3);
        assert_eq!(world.loaded_count(), 6);
        // Nearest first: the focus chunk is always among the first loads.
        assert!(world.is_loaded(coord(0, 0, 0)));
    }

    #[test]
    fn test_dirty_chunks_reported_on_unload() {
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 0,
            unload_radius: 1,
            loads_per_tick: 0,
            unloads_per_tick: 10,
        });
        let mut world = empty_world();
        world.load_chunk(coord(5, 0, 0)).unwrap();
        world.load_chunk(coord(6, 0, 0)).unwrap();
        world.set_voxel(BlockPos::new(80, 0, 0), Voxel::of(BlockId(1)));

        let result = streamer.tick(coord(0, 0, 0), &mut world);
        assert_eq!(result.unloaded, 2);
        assert_eq!(result.dirty_unloaded, vec![coord(5, 0, 0)]);
    }

    #[test]
    fn test_rejected_chunks_reported() {
        let catalog = Arc::new(BlockCatalog::new());
        let mut world = World::new(catalog, |_: ChunkCoord, v: &mut [Voxel]| {
            v[0] = Voxel::of(BlockId(3));
        });
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 0,
            unload_radius: 1,
            loads_per_tick: 1,
            unloads_per_tick: 1,
        });
        let result = streamer.tick(coord(0, 0, 0), &mut world);
        assert_eq!(result.loaded, 0);
        assert_eq!(result.failed, vec![coord(0, 0, 0)]);
        assert!(streamer.is_rejected(coord(0, 0, 0)));
    }

    #[test]
    fn test_rejected_chunk_is_not_retried_nearby() {
        let catalog = Arc::new(BlockCatalog::new());
        let mut world = World::new(catalog, |c: ChunkCoord, v: &mut [Voxel]| {
            if c == ChunkCoord::new(0, 0, 0) {
                v[0] = Voxel::of(BlockId(3));
            }
        });
        let mut streamer = ChunkStreamer::new(ChunkLoadConfig {
            load_radius: 1,
            unload_radius: 2,
            loads_per_tick: 100,
            unloads_per_tick: 100,
        });
        let first = streamer.tick(coord(0, 0, 0), &mut world);
        assert_eq!(first.failed, vec![coord(0, 0, 0)]);
        assert_eq!(first.loaded, 6);
        assert!(streamer.load_queue().is_empty());

        let again = streamer.tick(coord(0, 0, 0), &mut world);
        assert!(again.failed.is_empty());
        assert!(streamer.load_queue().is_empty());

        // Leaving the unload radius forgets the rejection.
        streamer.tick(coord(5, 0, 0), &mut world);
        assert!(!streamer.is_rejected(coord(0, 0, 0)));
    }
}
