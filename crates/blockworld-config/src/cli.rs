//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Blockworld command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "blockworld", about = "Voxel world simulation")]
pub struct CliArgs {
    /// Chunk load radius around the focus.
    #[arg(long)]
    pub load_radius: Option<u32>,

    /// Terrain seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Milliseconds between fluid ticks.
    #[arg(long)]
    pub fluid_tick_ms: Option<u64>,

    /// Let skylight fall through clear air without losing a level.
    #[arg(long)]
    pub sky_column: Option<bool>,

    /// Simulated seconds to run.
    #[arg(long)]
    pub duration: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// A load radius at or past the unload radius pushes the unload radius
    /// out to keep the hysteresis band.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.load_radius {
            self.world.load_radius = radius;
            if self.world.unload_radius <= radius {
                self.world.unload_radius = radius + 2;
            }
        }
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(ms) = args.fluid_tick_ms {
            self.fluid.tick_interval_ms = ms;
        }
        if let Some(sky) = args.sky_column {
            self.lighting.unattenuated_sky_column = sky;
        }
        if let Some(duration) = args.duration {
            self.run.duration_secs = duration;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
