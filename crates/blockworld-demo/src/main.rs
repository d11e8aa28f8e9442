//! Scripted blockworld run.
//!
//! Streams terrain around a walker, drops fluids and lights into the world,
//! and logs what the engines do with them.

mod driver;
mod terrain;
mod walker;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use blockworld_config::{CliArgs, Config, default_config_dir};
use blockworld_fluid::FluidState;
use blockworld_sim::Simulation;
use blockworld_voxel::{BlockCatalog, BlockPos, ChunkCoord, ChunkStreamer, Voxel, World};
use clap::Parser;
use glam::DVec3;
use tracing::{error, info, warn};

use crate::driver::FixedStep;
use crate::terrain::{TerrainBlocks, TerrainGenerator};
use crate::walker::Walker;

const BLOCK_CATALOG: &str = include_str!("../assets/blocks.ron");

/// Horizontal walking speed in blocks per second.
const WALK_SPEED: f64 = 3.0;
/// How far ahead of the eye the walker looks for a block to edit.
const REACH: f64 = 6.0;

/// One timed edit in the script.
#[derive(Clone, Copy, Debug)]
enum Action {
    PlaceWater,
    PlaceLava,
    PlaceGlowstone,
    RemoveWater,
    RemoveLava,
}

const SCRIPT: &[(f64, Action)] = &[
    (1.0, Action::PlaceWater),
    (2.5, Action::PlaceGlowstone),
    (4.0, Action::PlaceLava),
    (6.0, Action::RemoveWater),
    (8.0, Action::RemoveLava),
];

struct Palette {
    water: Voxel,
    lava: Voxel,
    glowstone: Voxel,
}

impl Palette {
    fn from_catalog(catalog: &BlockCatalog) -> Option<Self> {
        Some(Self {
            water: FluidState::SOURCE.voxel(catalog.lookup_by_name("water")?),
            lava: FluidState::SOURCE.voxel(catalog.lookup_by_name("lava")?),
            glowstone: Voxel::of(catalog.lookup_by_name("glowstone")?),
        })
    }
}

fn resolve_config_dir(args: &CliArgs) -> PathBuf {
    args.config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".blockworld"))
}

fn focus_chunk(feet: DVec3) -> ChunkCoord {
    BlockPos::new(feet.x.floor() as i32, feet.y.floor() as i32, feet.z.floor() as i32).chunk()
}

/// Cell in front of the walker's gaze where a block can be placed, if the
/// gaze hits anything within reach.
fn target_cell(sim: &Simulation, walker: &Walker) -> Option<BlockPos> {
    let eye = walker.eye();
    let gaze = DVec3::new(1.0, -1.0, 0.0).normalize() * REACH;
    let hit = sim.solidity().ray_trace(eye, eye + gaze)?;
    if hit.is_inside() {
        return None;
    }
    let cell = hit.adjacent();
    Some(BlockPos::new(cell.x, cell.y, cell.z))
}

struct Script {
    palette: Palette,
    next: usize,
    water_at: Option<BlockPos>,
    lava_at: Option<BlockPos>,
}

impl Script {
    fn run_due(&mut self, sim: &mut Simulation, walker: &Walker, sim_time: f64) {
        while let Some(&(at, action)) = SCRIPT.get(self.next) {
            if sim_time < at {
                return;
            }
            self.next += 1;
            self.perform(sim, walker, action);
        }
    }

    fn perform(&mut self, sim: &mut Simulation, walker: &Walker, action: Action) {
        let placed = match action {
            Action::PlaceWater => self.place(sim, walker, self.palette.water).inspect(|pos| {
                self.water_at = Some(*pos);
            }),
            Action::PlaceLava => self.place(sim, walker, self.palette.lava).inspect(|pos| {
                self.lava_at = Some(*pos);
            }),
            Action::PlaceGlowstone => self.place(sim, walker, self.palette.glowstone),
            Action::RemoveWater => self.water_at.take().inspect(|pos| {
                sim.set_voxel(*pos, Voxel::AIR);
            }),
            Action::RemoveLava => self.lava_at.take().inspect(|pos| {
                sim.set_voxel(*pos, Voxel::AIR);
            }),
        };
        match placed {
            Some(pos) => info!("{:?} at {:?}", action, pos),
            None => warn!("{:?} skipped: nothing in reach", action),
        }
    }

    fn place(&self, sim: &mut Simulation, walker: &Walker, voxel: Voxel) -> Option<BlockPos> {
        let pos = target_cell(sim, walker)?;
        sim.set_voxel(pos, voxel)?;
        Some(pos)
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = resolve_config_dir(&args);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("{e}, using defaults");
        config = Config::default();
    }

    let log_dir = config_dir.join("logs");
    blockworld_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let catalog = match BlockCatalog::from_ron_str(BLOCK_CATALOG) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            error!("Block catalog rejected: {e}");
            return ExitCode::FAILURE;
        }
    };
    let (blocks, palette) = match (
        TerrainBlocks::from_catalog(&catalog),
        Palette::from_catalog(&catalog),
    ) {
        (Ok(blocks), Some(palette)) => (blocks, palette),
        (Err(name), _) => {
            error!("Block catalog has no {name:?}");
            return ExitCode::FAILURE;
        }
        (_, None) => {
            error!("Block catalog is missing a scripted block");
            return ExitCode::FAILURE;
        }
    };
    info!("Block catalog: {} types", catalog.len());

    let generator = TerrainGenerator::new(config.terrain.clone(), blocks);
    let spawn_height = generator.height(0, 0).max(config.terrain.water_level) + 3;
    let world = World::new(catalog, move |coord: ChunkCoord, voxels: &mut [Voxel]| {
        generator.generate(coord, voxels)
    });
    let mut sim = Simulation::new(world, config.lighting.clone(), config.fluid.clone());
    let mut streamer = ChunkStreamer::new(config.world.clone());

    let mut walker = Walker::at_feet(DVec3::new(0.5, spawn_height as f64, 0.5));
    let mut script = Script {
        palette,
        next: 0,
        water_at: None,
        lava_at: None,
    };

    // Load the spawn area before anything moves.
    let spawn = focus_chunk(walker.feet());
    loop {
        let streamed = sim.stream(&mut streamer, spawn);
        if !streamed.failed.is_empty() {
            error!("Spawn chunks {:?} failed to generate", streamed.failed);
            return ExitCode::FAILURE;
        }
        sim.tick(0.0);
        if streamer.load_queue().is_empty() {
            break;
        }
    }
    info!(
        "Spawn at {:?}, {} chunks loaded",
        walker.feet(),
        sim.world().loaded_count()
    );

    let mut driver = FixedStep::new(
        config.run.step_ms as f64 / 1000.0,
        config.run.max_frame_ms as f64 / 1000.0,
    );
    let frame = Duration::from_millis(config.run.step_ms);
    let duration = config.run.duration_secs as f64;
    let mut last_report = 0.0;
    let mut previous = Instant::now();

    while driver.sim_time() < duration {
        std::thread::sleep(frame);
        let now = Instant::now();
        let frame_time = now.duration_since(previous).as_secs_f64();
        previous = now;

        driver.advance(frame_time, |dt, sim_time| {
            let streamed = sim.stream(&mut streamer, focus_chunk(walker.feet()));
            if streamed.loaded + streamed.unloaded > 0 {
                tracing::debug!(
                    "Streamed {} in, {} out ({} failed)",
                    streamed.loaded,
                    streamed.unloaded,
                    streamed.failed.len()
                );
            }

            script.run_due(&mut sim, &walker, sim_time);
            sim.tick(dt as f32);
            walker.step(&sim.solidity(), DVec3::new(WALK_SPEED, 0.0, 0.0), dt);
        });

        if driver.sim_time() - last_report >= 1.0 {
            last_report = driver.sim_time();
            info!(
                "t={:.1}s chunks={} light_tasks={} fluid_pending={} walker={:.1?} grounded={}",
                driver.sim_time(),
                sim.world().loaded_count(),
                sim.light().pending_tasks(),
                sim.fluid().pending(),
                walker.feet(),
                walker.on_ground
            );
        }
    }

    info!(
        "Finished after {} steps ({} simulation ticks, {} fluid ticks)",
        driver.steps(),
        sim.ticks(),
        sim.fluid().ticks()
    );
    ExitCode::SUCCESS
}
