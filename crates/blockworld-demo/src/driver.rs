//! Fixed-step accumulator for the demo loop.

use tracing::warn;

/// Turns variable frame times into a whole number of fixed steps.
///
/// Frames longer than `max_frame` are clamped, so a stall costs simulated
/// time instead of a burst of catch-up steps.
#[derive(Debug)]
pub struct FixedStep {
    step: f64,
    max_frame: f64,
    accumulator: f64,
    sim_time: f64,
    steps: u64,
}

impl FixedStep {
    pub fn new(step: f64, max_frame: f64) -> Self {
        Self {
            step,
            max_frame: max_frame.max(step),
            accumulator: 0.0,
            sim_time: 0.0,
            steps: 0,
        }
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Adds `frame_time` seconds and calls `update(step, sim_time)` for every
    /// step that came due.
    pub fn advance(&mut self, mut frame_time: f64, mut update: impl FnMut(f64, f64)) {
        if frame_time > self.max_frame {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                self.max_frame * 1000.0
            );
            frame_time = self.max_frame;
        }
        self.accumulator += frame_time;

        while self.accumulator >= self.step {
            update(self.step, self.sim_time);
            self.sim_time += self.step;
            self.accumulator -= self.step;
            self.steps += 1;
        }
    }
}
