//! Light engine: task queue, re-entrancy state and the per-update budget.

use std::collections::VecDeque;

use blockworld_voxel::{BlockPos, CHUNK_SIZE, CHUNK_VOLUME, Chunk, ChunkCoord, Direction, World, WorldEvent};
use serde::{Deserialize, Serialize};

use crate::propagate::{LightChannel, LightQueues, LightRules, source_level};

/// Tunables for the light engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Maximum queued tasks (chunk builds and tile updates) run per call to
    /// [`LightEngine::update`].
    pub max_tasks_per_update: usize,
    /// See [`LightRules::unattenuated_sky_column`].
    pub unattenuated_sky_column: bool,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_update: 64,
            unattenuated_sky_column: true,
        }
    }
}

impl LightConfig {
    pub fn rules(&self) -> LightRules {
        LightRules {
            unattenuated_sky_column: self.unattenuated_sky_column,
        }
    }
}

/// What the engine is doing right now.
///
/// Requests that arrive while the engine is not [`Idle`](LightState::Idle)
/// are queued instead of interleaving with the running pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightState {
    #[default]
    Idle,
    Removing,
    Propagating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LightTask {
    /// A chunk loaded above: cells that assumed open sky at the top of the
    /// chunk below are now covered.
    CoverBelow(ChunkCoord),
    /// Recompute a whole chunk from its voxels and neighbour boundaries.
    BuildChunk(ChunkCoord),
    /// A chunk unloaded: neighbours lose whatever light crossed its faces.
    Evict(ChunkCoord),
    /// A voxel's opacity or luminance changed.
    Tile(BlockPos),
}

pub struct LightEngine {
    config: LightConfig,
    rules: LightRules,
    state: LightState,
    tasks: VecDeque<LightTask>,
    queues: LightQueues,
}

impl LightEngine {
    pub fn new(config: LightConfig) -> Self {
        let rules = config.rules();
        Self {
            config,
            rules,
            state: LightState::Idle,
            tasks: VecDeque::new(),
            queues: LightQueues::default(),
        }
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    pub fn rules(&self) -> LightRules {
        self.rules
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    /// Number of queued tasks not yet run.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when nothing is queued and no pass is running.
    pub fn is_settled(&self) -> bool {
        self.tasks.is_empty() && self.state == LightState::Idle
    }

    /// Turns a world event into queued light work.
    pub fn handle_event(&mut self, world: &World, event: &WorldEvent) {
        match event {
            WorldEvent::ChunkLoaded(coord) => {
                self.tasks.push_back(LightTask::CoverBelow(*coord));
                self.tasks.push_back(LightTask::BuildChunk(*coord));
            }
            WorldEvent::ChunkUnloaded(coord) => {
                self.tasks.push_back(LightTask::Evict(*coord));
            }
            WorldEvent::VoxelChanged(change) => {
                let catalog = world.catalog();
                if catalog.opacity(change.old) == catalog.opacity(change.new)
                    && catalog.luminance(change.old) == catalog.luminance(change.new)
                {
                    return;
                }
                self.tasks.push_back(LightTask::Tile(change.pos));
            }
        }
    }

    /// Runs up to `max_tasks_per_update` queued tasks. Returns how many ran.
    ///
    /// Lighting is budgeted by task count, so `_dt` is unused.
    pub fn update(&mut self, world: &mut World, _dt: f32) -> usize {
        let mut ran = 0;
        while ran < self.config.max_tasks_per_update {
            let Some(task) = self.tasks.pop_front() else {
                break;
            };
            match task {
                LightTask::CoverBelow(coord) => self.cover_below(world, coord),
                LightTask::BuildChunk(coord) => self.build_chunk(world, coord),
                LightTask::Evict(coord) => self.evict(world, coord),
                LightTask::Tile(pos) => self.update_tile(world, pos),
            }
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!("Light update ran {} tasks, {} pending", ran, self.tasks.len());
        }
        ran
    }

    /// Runs queued tasks until none remain.
    pub fn flush(&mut self, world: &mut World) -> usize {
        let mut ran = 0;
        while !self.tasks.is_empty() {
            ran += self.update(world, 0.0);
        }
        ran
    }

    /// Incrementally relights around `pos` after its voxel changed.
    ///
    /// Both channels are cleared outward from `pos` as far as the old light
    /// reached, then respread from the surviving boundary and from the new
    /// voxel's own emission. The result equals a full rebuild.
    pub fn update_tile(&mut self, world: &mut World, pos: BlockPos) {
        if self.state != LightState::Idle {
            self.tasks.push_back(LightTask::Tile(pos));
            return;
        }
        let Some(voxel) = world.get_voxel(pos) else {
            return;
        };
        let catalog = world.catalog_handle();

        for channel in LightChannel::BOTH {
            self.state = LightState::Removing;
            let old = channel.read(world, pos).unwrap_or(0);
            channel.write(world, pos, 0);
            self.queues.removal.push_back((pos, old));
            self.queues.remove(world, &self.rules, channel);

            let own = source_level(world, &catalog, channel, pos, voxel);
            if own > 0 {
                channel.write(world, pos, own);
            }
            self.queues.spread.push_back(pos);

            self.state = LightState::Propagating;
            self.queues.spread(world, &self.rules, channel);
        }

        self.state = LightState::Idle;
        tracing::trace!("Relit tile {:?}", pos);
    }

    /// Recomputes both channels of the chunk at `coord` from scratch.
    ///
    /// Seeds come from luminous blocks, from open sky above the top face
    /// when the chunk above is not loaded, and from the light already present
    /// across each face in loaded neighbours. Light then spreads freely,
    /// including back out into neighbours it can brighten.
    pub fn build_chunk(&mut self, world: &mut World, coord: ChunkCoord) {
        if self.state != LightState::Idle {
            self.tasks.push_back(LightTask::BuildChunk(coord));
            return;
        }
        let Some(chunk) = world.get_chunk_mut(coord) else {
            return;
        };
        chunk.clear_light();

        let catalog = world.catalog_handle();
        let origin = coord.origin();
        let mut writes = 0;
        self.state = LightState::Propagating;

        for channel in LightChannel::BOTH {
            for index in 0..CHUNK_VOLUME {
                let (x, y, z) = Chunk::coords_of(index);
                let pos = origin.offset(x as i32, y as i32, z as i32);
                let Some(voxel) = world.get_voxel(pos) else {
                    continue;
                };
                let opacity = catalog.opacity(voxel);
                let mut level = source_level(world, &catalog, channel, pos, voxel);

                if is_on_face(x, y, z) {
                    for dir in Direction::ALL {
                        let npos = pos.neighbor(dir);
                        if npos.chunk() == coord {
                            continue;
                        }
                        if let Some(outside) = channel.read(world, npos) {
                            let incoming = self.rules.transfer(channel, outside, dir.opposite(), opacity);
                            level = level.max(incoming);
                        }
                    }
                }

                if level > 0 {
                    channel.write(world, pos, level);
                    self.queues.spread.push_back(pos);
                }
            }
            writes += self.queues.spread(world, &self.rules, channel);
        }

        self.state = LightState::Idle;
        tracing::debug!("Built light for chunk {:?} ({} spread writes)", coord, writes);
    }

    /// Clears the light loaded neighbours got through the faces of the
    /// unloaded chunk at `coord`, then relights them from their own sources
    /// and from open sky where the chunk used to cover them.
    ///
    /// Without this, a reload that regenerates the chunk would sample the
    /// stale boundary light back in.
    fn evict(&mut self, world: &mut World, coord: ChunkCoord) {
        let catalog = world.catalog_handle();
        let origin = coord.origin();
        let mut writes = 0;

        for channel in LightChannel::BOTH {
            self.state = LightState::Removing;
            let mut boundary = Vec::new();
            for index in 0..CHUNK_VOLUME {
                let (x, y, z) = Chunk::coords_of(index);
                if !is_on_face(x, y, z) {
                    continue;
                }
                let pos = origin.offset(x as i32, y as i32, z as i32);
                for dir in Direction::ALL {
                    let npos = pos.neighbor(dir);
                    if npos.chunk() == coord {
                        continue;
                    }
                    let Some(level) = channel.read(world, npos) else {
                        continue;
                    };
                    boundary.push(npos);
                    if level > 0 {
                        channel.write(world, npos, 0);
                        self.queues.removal.push_back((npos, level));
                    }
                }
            }
            self.queues.remove(world, &self.rules, channel);

            for pos in boundary {
                let Some(voxel) = world.get_voxel(pos) else {
                    continue;
                };
                let own = source_level(world, &catalog, channel, pos, voxel);
                if channel.read(world, pos).is_some_and(|current| current < own) {
                    channel.write(world, pos, own);
                }
                self.queues.spread.push_back(pos);
            }

            self.state = LightState::Propagating;
            writes += self.queues.spread(world, &self.rules, channel);
        }

        self.state = LightState::Idle;
        tracing::debug!("Evicted light of chunk {:?} ({} spread writes)", coord, writes);
    }

    /// Strips open-sky seeds from the top layer of the chunk under `coord`.
    fn cover_below(&mut self, world: &mut World, coord: ChunkCoord) {
        let below = coord.neighbor(Direction::NegY);
        if !world.is_loaded(coord) || !world.is_loaded(below) {
            return;
        }

        self.state = LightState::Removing;
        let channel = LightChannel::Sky;
        let top = below.origin().offset(0, CHUNK_SIZE as i32 - 1, 0);
        for x in 0..CHUNK_SIZE as i32 {
            for z in 0..CHUNK_SIZE as i32 {
                let pos = top.offset(x, 0, z);
                let level = channel.read(world, pos).unwrap_or(0);
                if level > 0 {
                    channel.write(world, pos, 0);
                    self.queues.removal.push_back((pos, level));
                }
            }
        }
        self.queues.remove(world, &self.rules, channel);

        self.state = LightState::Propagating;
        self.queues.spread(world, &self.rules, channel);
        self.state = LightState::Idle;
    }
}

fn is_on_face(x: u8, y: u8, z: u8) -> bool {
    let max = CHUNK_SIZE as u8 - 1;
    x == 0 || y == 0 || z == 0 || x == max || y == max || z == max
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
