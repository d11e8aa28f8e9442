use blockworld_fluid::{FluidConfig, FluidEngine};
use blockworld_lighting::{LightConfig, LightEngine};
use blockworld_physics::WorldSolidity;
use blockworld_voxel::{
    BlockPos, ChunkCoord, ChunkStreamTickResult, ChunkStreamer, Voxel, World, WorldError,
};

/// Work done by one [`Simulation::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// World events dispatched to the engines.
    pub events: usize,
    /// Positions the fluid engine processed.
    pub fluid_cells: usize,
    /// Light tasks run.
    pub light_tasks: usize,
}

/// A world and the engines that keep it consistent.
pub struct Simulation {
    world: World,
    light: LightEngine,
    fluid: FluidEngine,
    ticks: u64,
}

impl Simulation {
    pub fn new(world: World, light: LightConfig, fluid: FluidConfig) -> Self {
        Self {
            world,
            light: LightEngine::new(light),
            fluid: FluidEngine::new(fluid),
            ticks: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access. Changes made here are still seen by the engines,
    /// since every mutation records an event.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn light(&self) -> &LightEngine {
        &self.light
    }

    pub fn fluid(&self) -> &FluidEngine {
        &self.fluid
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Collision view of the current world.
    pub fn solidity(&self) -> WorldSolidity<'_> {
        WorldSolidity::new(&self.world)
    }

    pub fn load_chunk(&mut self, coord: ChunkCoord) -> Result<(), WorldError> {
        self.world.load_chunk(coord).map(|_| ())
    }

    /// Returns `true` if the chunk was loaded.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> bool {
        self.world.unload_chunk(coord).is_some()
    }

    /// Writes a voxel as an external edit. Returns the previous voxel, or
    /// `None` if its chunk is not loaded.
    pub fn set_voxel(&mut self, pos: BlockPos, voxel: Voxel) -> Option<Voxel> {
        self.world.set_voxel(pos, voxel)
    }

    /// Runs one chunk streaming step around `focus`.
    pub fn stream(
        &mut self,
        streamer: &mut ChunkStreamer,
        focus: ChunkCoord,
    ) -> ChunkStreamTickResult {
        streamer.tick(focus, &mut self.world)
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Pending events go to both engines, then fluid runs whatever ticks came
    /// due, then the events fluid produced are dispatched, then lighting
    /// drains its budget. Light always sees the fluid writes of the same
    /// step.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        self.ticks += 1;
        let mut stats = TickStats {
            events: self.dispatch(),
            ..Default::default()
        };
        stats.fluid_cells = self.fluid.update(&mut self.world, dt);
        stats.events += self.dispatch();
        stats.light_tasks = self.light.update(&mut self.world, dt);

        if stats != TickStats::default() {
            tracing::trace!(
                "Tick {}: {} events, {} fluid cells, {} light tasks",
                self.ticks,
                stats.events,
                stats.fluid_cells,
                stats.light_tasks
            );
        }
        stats
    }

    /// `true` when no events are pending and neither engine has queued work.
    pub fn is_settled(&self) -> bool {
        self.world.events().is_empty() && self.light.is_settled() && self.fluid.is_settled()
    }

    /// Ticks with `dt` until settled. Returns the number of ticks taken, or
    /// `None` if `max_ticks` ran out first.
    pub fn run_until_settled(&mut self, dt: f32, max_ticks: usize) -> Option<usize> {
        for n in 0..max_ticks {
            if self.is_settled() {
                return Some(n);
            }
            self.tick(dt);
        }
        if self.is_settled() {
            Some(max_ticks)
        } else {
            tracing::warn!("Simulation not settled after {} ticks", max_ticks);
            None
        }
    }

    fn dispatch(&mut self) -> usize {
        let events = self.world.take_events();
        for event in &events {
            self.light.handle_event(&self.world, event);
            self.fluid.handle_event(&self.world, event);
        }
        events.len()
    }
}
