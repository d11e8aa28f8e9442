//! Fluid engine: fixed-interval ticks, spreading, falling and retraction.

use std::collections::VecDeque;

use blockworld_voxel::{
    BlockCatalog, BlockId, BlockPos, CHUNK_VOLUME, ChangeOrigin, Chunk, ChunkCoord, Direction,
    Voxel, World, WorldEvent,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::flow::{ALL_HORIZONTAL, Cell, DirectionMask, accepts, classify, find_holes};
use crate::state::FluidState;

/// Tunables for the fluid engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Real time between fluid ticks. Each tick advances one ring.
    pub tick_interval_ms: u64,
    /// Upper bound on positions processed in a single tick.
    pub max_cells_per_tick: usize,
    /// Upper bound on ticks run by one [`FluidEngine::update`] call after a
    /// long frame.
    pub max_ticks_per_update: u32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            max_cells_per_tick: 4096,
            max_ticks_per_update: 4,
        }
    }
}

impl FluidConfig {
    pub fn tick_interval_secs(&self) -> f32 {
        self.tick_interval_ms as f32 / 1000.0
    }
}

/// A fluid cell erased during retraction, with the fluid and state it had.
type Removed = (BlockPos, BlockId, FluidState);

pub struct FluidEngine {
    config: FluidConfig,
    accumulator: f32,
    /// Positions awaiting a spread step, in ring order.
    spread: VecDeque<BlockPos>,
    queued: FxHashSet<BlockPos>,
    /// Erased cells whose dependents still need draining.
    removal: VecDeque<Removed>,
    /// Positions waiting for a chunk to load, keyed by that chunk.
    parked: FxHashMap<ChunkCoord, Vec<BlockPos>>,
    /// Cells whose spread was narrowed toward a hole. They are revisited
    /// once the queues drain, provided something changed in the meantime.
    watching: Vec<BlockPos>,
    watched: FxHashSet<BlockPos>,
    /// Watched cells currently back in the spread queue.
    released: FxHashSet<BlockPos>,
    /// Set by every write or external change since watchers were last
    /// released.
    progress: bool,
    ticks: u64,
}

impl FluidEngine {
    pub fn new(config: FluidConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            spread: VecDeque::new(),
            queued: FxHashSet::default(),
            removal: VecDeque::new(),
            parked: FxHashMap::default(),
            watching: Vec::new(),
            watched: FxHashSet::default(),
            released: FxHashSet::default(),
            progress: false,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    /// Positions waiting for their next spread step.
    pub fn pending(&self) -> usize {
        self.spread.len()
    }

    /// Erased cells whose neighbours have not been checked yet.
    pub fn pending_removals(&self) -> usize {
        self.removal.len()
    }

    /// Positions held back until a chunk loads.
    pub fn parked(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }

    /// Fluid ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Cells waiting to recheck a hole they could not reach.
    pub fn watching(&self) -> usize {
        self.watching.len()
    }

    /// `true` when neither spread nor retraction work is queued and no
    /// watched cell is due for a revisit. Parked positions do not count.
    pub fn is_settled(&self) -> bool {
        self.spread.is_empty() && self.removal.is_empty() && !self.release_due()
    }

    fn release_due(&self) -> bool {
        self.progress && !self.watching.is_empty()
    }

    fn watch(&mut self, pos: BlockPos) {
        if self.watched.insert(pos) {
            self.watching.push(pos);
        }
    }

    /// Requeues every watched cell and clears the progress flag. Called only
    /// when both queues are empty and [`release_due`](Self::release_due).
    fn release_watchers(&mut self) {
        self.progress = false;
        self.watched.clear();
        tracing::trace!("Releasing {} watched fluid cells", self.watching.len());
        for pos in std::mem::take(&mut self.watching) {
            self.released.insert(pos);
            self.enqueue(pos);
        }
    }

    /// Queues `pos` for a spread step. Duplicates are ignored.
    pub fn enqueue(&mut self, pos: BlockPos) {
        if self.queued.insert(pos) {
            self.spread.push_back(pos);
        }
    }

    /// Turns a world event into queued fluid work.
    ///
    /// The engine's own writes are ignored.
    pub fn handle_event(&mut self, world: &World, event: &WorldEvent) {
        match event {
            WorldEvent::ChunkLoaded(coord) => self.on_chunk_loaded(world, *coord),
            WorldEvent::ChunkUnloaded(coord) => self.on_chunk_unloaded(*coord),
            WorldEvent::VoxelChanged(change) => {
                if change.origin == ChangeOrigin::Fluid {
                    return;
                }
                self.progress = true;
                let catalog = world.catalog();
                let old = catalog.fluid(change.old);
                let new = catalog.fluid(change.new);

                if let Some(old) = old
                    && new.map(|n| n.canonical) != Some(old.canonical)
                {
                    tracing::trace!("Fluid removed at {:?}, retracting", change.pos);
                    self.removal
                        .push_back((change.pos, old.canonical, FluidState::of(change.old)));
                }
                if new.is_some() {
                    self.enqueue(change.pos);
                }
                for dir in Direction::ALL {
                    let npos = change.pos.neighbor(dir);
                    if world
                        .get_voxel(npos)
                        .is_some_and(|voxel| catalog.fluid(voxel).is_some())
                    {
                        self.enqueue(npos);
                    }
                }
            }
        }
    }

    /// Advances the tick clock by `dt` seconds and runs every tick that came
    /// due, up to `max_ticks_per_update`. Returns the positions processed.
    pub fn update(&mut self, world: &mut World, dt: f32) -> usize {
        let interval = self.config.tick_interval_secs();
        self.accumulator += dt;

        let max_backlog = interval * self.config.max_ticks_per_update as f32;
        if self.accumulator > max_backlog {
            tracing::warn!(
                "Fluid tick backlog of {:.1}ms exceeds maximum, clamping to {:.1}ms",
                self.accumulator * 1000.0,
                max_backlog * 1000.0
            );
            self.accumulator = max_backlog;
        }

        let mut processed = 0;
        while self.accumulator >= interval {
            self.accumulator -= interval;
            processed += self.tick(world);
        }
        processed
    }

    /// Runs one tick immediately: one ring of retraction if any is pending,
    /// otherwise one ring of spreading. Returns the positions processed.
    pub fn tick(&mut self, world: &mut World) -> usize {
        self.ticks += 1;
        if !self.removal.is_empty() {
            return self.retract_ring(world);
        }
        if self.spread.is_empty() && self.release_due() {
            self.release_watchers();
        }

        let catalog = world.catalog_handle();
        let ring = self.spread.len().min(self.config.max_cells_per_tick);
        for _ in 0..ring {
            let Some(pos) = self.spread.pop_front() else {
                break;
            };
            self.queued.remove(&pos);
            let released = self.released.remove(&pos);
            self.step(world, &catalog, pos, released);
        }
        if ring > 0 {
            tracing::trace!(
                "Fluid tick {}: {} cells, {} queued",
                self.ticks,
                ring,
                self.spread.len()
            );
        }
        ring
    }

    fn park(&mut self, missing: ChunkCoord, pos: BlockPos) {
        let parked = self.parked.entry(missing).or_default();
        if !parked.contains(&pos) {
            parked.push(pos);
        }
    }

    fn on_chunk_loaded(&mut self, world: &World, coord: ChunkCoord) {
        self.progress = true;
        if let Some(parked) = self.parked.remove(&coord) {
            tracing::debug!("Releasing {} parked fluid cells for {:?}", parked.len(), coord);
            for pos in parked {
                self.enqueue(pos);
            }
        }

        let Some(chunk) = world.get_chunk(coord) else {
            return;
        };
        let catalog = world.catalog();
        let origin = coord.origin();
        let mut found = 0;
        for index in 0..CHUNK_VOLUME {
            let voxel = chunk.voxels()[index];
            let Some(info) = catalog.fluid(voxel) else {
                continue;
            };
            let (x, y, z) = Chunk::coords_of(index);
            let pos = origin.offset(x as i32, y as i32, z as i32);
            if !FluidState::of(voxel).is_source() || has_open_neighbor(world, catalog, info.canonical, pos) {
                self.enqueue(pos);
                found += 1;
            }
        }
        if found > 0 {
            tracing::debug!("Chunk {:?} brought {} active fluid cells", coord, found);
        }
    }

    fn on_chunk_unloaded(&mut self, coord: ChunkCoord) {
        self.parked.remove(&coord);
        self.parked.retain(|_, positions| {
            positions.retain(|pos| pos.chunk() != coord);
            !positions.is_empty()
        });
        self.watching.retain(|pos| pos.chunk() != coord);
        self.watched.retain(|pos| pos.chunk() != coord);
        self.released.retain(|pos| pos.chunk() != coord);
    }

    /// One spread step for the fluid cell at `pos`.
    ///
    /// `released` marks a watched cell revisited after the queues drained.
    /// If its flow toward the hole still moves nothing, the hole is out of
    /// reach and the cell spreads in every direction instead.
    fn step(&mut self, world: &mut World, catalog: &BlockCatalog, pos: BlockPos, released: bool) {
        let Some(voxel) = world.get_voxel(pos) else {
            return;
        };
        let Some(info) = catalog.fluid(voxel) else {
            return;
        };
        let fluid = info.canonical;
        let state = FluidState::of(voxel);

        let below = pos.below();
        let Some(under) = world.get_voxel(below) else {
            self.park(below.chunk(), pos);
            return;
        };
        match classify(catalog, fluid, under) {
            cell @ (Cell::Open | Cell::Same(_)) if accepts(cell, state.level) => {
                write(world, below, fluid, FluidState::falling(state.level));
                self.progress = true;
                self.enqueue(below);
                // Revisit once the column below has taken the fluid.
                self.enqueue(pos);
                return;
            }
            Cell::Same(_) if state.falling => return,
            _ => {}
        }

        if state.level >= info.max_level {
            return;
        }
        let next = FluidState::flowing(state.level + 1);
        let range = info.max_level - state.level;

        let Some(holes) = find_holes(world, catalog, fluid, pos, state.level, range) else {
            self.spread_to(world, catalog, fluid, pos, next, ALL_HORIZONTAL);
            return;
        };
        let wrote = self.spread_to(world, catalog, fluid, pos, next, holes);
        if released && !wrote {
            tracing::trace!("Hole near {:?} is out of reach, spreading evenly", pos);
            self.spread_to(world, catalog, fluid, pos, next, ALL_HORIZONTAL & !holes);
        } else {
            self.watch(pos);
        }
    }

    /// Writes `next` into every horizontal neighbour selected by `mask` that
    /// accepts it. Returns `true` if anything was written.
    fn spread_to(
        &mut self,
        world: &mut World,
        catalog: &BlockCatalog,
        fluid: BlockId,
        pos: BlockPos,
        next: FluidState,
        mask: DirectionMask,
    ) -> bool {
        let mut wrote = false;
        for (i, dir) in Direction::HORIZONTAL.iter().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            let npos = pos.neighbor(*dir);
            let Some(target) = world.get_voxel(npos) else {
                self.park(npos.chunk(), pos);
                continue;
            };
            if accepts(classify(catalog, fluid, target), next.level) {
                write(world, npos, fluid, next);
                self.enqueue(npos);
                wrote = true;
            }
        }
        if wrote {
            self.progress = true;
        }
        wrote
    }

    /// Drains one ring of retraction.
    ///
    /// A horizontal neighbour is fed by the erased cell when it is a plain
    /// flowing cell with a strictly higher level; a falling cell directly
    /// below always is. Those are erased in turn. Every other same-fluid
    /// neighbour survives and is queued to spread back into the gap once
    /// retraction finishes.
    fn retract_ring(&mut self, world: &mut World) -> usize {
        let catalog = world.catalog_handle();
        let ring = self.removal.len();
        let mut erased = 0;

        for _ in 0..ring {
            let Some((pos, fluid, removed)) = self.removal.pop_front() else {
                break;
            };
            for dir in Direction::ALL {
                let npos = pos.neighbor(dir);
                let Some(voxel) = world.get_voxel(npos) else {
                    continue;
                };
                let Cell::Same(state) = classify(&catalog, fluid, voxel) else {
                    continue;
                };
                let dependent = match dir {
                    Direction::NegY => state.falling,
                    Direction::PosY => false,
                    _ => !state.is_source() && !state.falling && state.level > removed.level,
                };
                if dependent {
                    world.set_voxel_from(npos, Voxel::AIR, ChangeOrigin::Fluid);
                    self.progress = true;
                    self.removal.push_back((npos, fluid, state));
                    erased += 1;
                } else {
                    self.enqueue(npos);
                }
            }
        }

        if erased > 0 {
            tracing::trace!("Fluid retraction erased {} cells", erased);
        }
        if self.removal.is_empty() {
            tracing::debug!("Fluid retraction finished, {} cells to respread", self.spread.len());
        }
        ring
    }
}

fn write(world: &mut World, pos: BlockPos, fluid: BlockId, state: FluidState) {
    world.set_voxel_from(pos, state.voxel(fluid), ChangeOrigin::Fluid);
}

/// `true` if fluid at `pos` could move into the cell below or beside it.
fn has_open_neighbor(world: &World, catalog: &BlockCatalog, fluid: BlockId, pos: BlockPos) -> bool {
    std::iter::once(Direction::NegY)
        .chain(Direction::HORIZONTAL)
        .any(|dir| {
            world
                .get_voxel(pos.neighbor(dir))
                .is_some_and(|voxel| accepts(classify(catalog, fluid, voxel), 1))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
