//! A box-shaped walker with gravity, used to exercise collision.

use blockworld_physics::{Aabb, WorldSolidity, move_box};
use glam::DVec3;

const GRAVITY: f64 = -20.0;
const TERMINAL_SPEED: f64 = 40.0;
const WIDTH: f64 = 0.6;
const HEIGHT: f64 = 1.8;
const EYE_HEIGHT: f64 = 1.6;

#[derive(Clone, Debug)]
pub struct Walker {
    pub aabb: Aabb,
    pub velocity: DVec3,
    pub on_ground: bool,
}

impl Walker {
    pub fn at_feet(feet: DVec3) -> Self {
        Self {
            aabb: Aabb::from_feet(feet, WIDTH, HEIGHT),
            velocity: DVec3::ZERO,
            on_ground: false,
        }
    }

    pub fn feet(&self) -> DVec3 {
        let c = self.aabb.center();
        DVec3::new(c.x, self.aabb.min.y, c.z)
    }

    pub fn eye(&self) -> DVec3 {
        self.feet() + DVec3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// Advances by `dt` seconds while trying to walk at `walk` (horizontal
    /// blocks per second). Ground friction scales how much of `walk` is
    /// picked up each step.
    pub fn step(&mut self, solidity: &WorldSolidity<'_>, walk: DVec3, dt: f64) {
        let grip = if self.on_ground {
            solidity.ground_friction(&self.aabb).unwrap_or(1.0) as f64
        } else {
            0.1
        };
        let blend = grip.clamp(0.0, 1.0);
        self.velocity.x += (walk.x - self.velocity.x) * blend;
        self.velocity.z += (walk.z - self.velocity.z) * blend;
        self.velocity.y = (self.velocity.y + GRAVITY * dt).max(-TERMINAL_SPEED);

        let requested = self.velocity * dt;
        let movement = move_box(&self.aabb, requested, |cell| solidity.is_solid(cell));
        self.aabb = movement.aabb;
        self.on_ground = movement.on_ground(requested);
        if movement.blocked.x {
            self.velocity.x = 0.0;
        }
        if movement.blocked.y {
            self.velocity.y = 0.0;
        }
        if movement.blocked.z {
            self.velocity.z = 0.0;
        }
    }
}
