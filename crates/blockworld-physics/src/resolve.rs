//! Per-axis movement resolution.

use glam::{BVec3, DVec3, IVec3};

use crate::aabb::{Aabb, Axis};
use crate::box_cast::hitboxes_collision;

/// Outcome of [`move_box`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Movement {
    /// The box at its final position.
    pub aabb: Aabb,
    /// Displacement actually applied.
    pub applied: DVec3,
    /// Axes on which the requested displacement was cut short.
    pub blocked: BVec3,
}

impl Movement {
    /// `true` when downward motion was stopped by the ground.
    pub fn on_ground(&self, requested: DVec3) -> bool {
        self.blocked.y && requested.y < 0.0
    }
}

/// Moves `aabb` by `displacement`, resolving X, then Y, then Z.
///
/// Each axis is swept on its own from where the previous axis left the box,
/// and clamped flush against the first solid cell it meets. This is not a
/// simultaneous 3D sweep.
pub fn move_box(
    aabb: &Aabb,
    displacement: DVec3,
    mut is_solid: impl FnMut(IVec3) -> bool,
) -> Movement {
    let mut current = *aabb;
    let mut applied = DVec3::ZERO;
    let mut blocked = [false; 3];

    for axis in Axis::ALL {
        let i = axis.index();
        let d = displacement[i];
        if d == 0.0 {
            continue;
        }

        let moved = match hitboxes_collision(&current, axis.unit() * d, &mut is_solid) {
            Some(hit) => {
                blocked[i] = true;
                let lead = if d > 0.0 { current.max[i] } else { current.min[i] };
                tracing::trace!("Movement blocked on {:?} at {:.3}", axis, hit.position);
                hit.position - lead
            }
            None => d,
        };

        let offset = axis.unit() * moved;
        current = current.translated(offset);
        applied += offset;
    }

    Movement {
        aabb: current,
        applied,
        blocked: BVec3::from(blocked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground(cell: IVec3) -> bool {
        cell.y < 0
    }

    fn player(x: f64, y: f64, z: f64) -> Aabb {
        Aabb::from_feet(DVec3::new(x, y, z), 0.6, 1.8)
    }

    #[test]
    fn test_free_move_applies_everything() {
        let aabb = player(0.5, 5.0, 0.5);
        let requested = DVec3::new(1.0, -2.0, 0.5);
        let movement = move_box(&aabb, requested, ground);
        assert_eq!(movement.applied, requested);
        assert_eq!(movement.blocked, BVec3::FALSE);
        assert!(!movement.on_ground(requested));
    }

    #[test]
    fn test_landing_clamps_to_floor() {
        let aabb = player(0.5, 1.2, 0.5);
        let requested = DVec3::new(0.3, -3.0, 0.0);
        let movement = move_box(&aabb, requested, ground);
        assert!(movement.blocked.y);
        assert!(!movement.blocked.x);
        assert!(movement.aabb.min.y.abs() < 1e-9);
        assert!((movement.applied.x - 0.3).abs() < 1e-9);
        assert!(movement.on_ground(requested));
    }

    #[test]
    fn test_wall_stops_one_axis_only() {
        let wall = |cell: IVec3| cell.y < 0 || cell.x == 3;
        let aabb = player(1.5, 0.0, 0.5);
        let movement = move_box(&aabb, DVec3::new(4.0, 0.0, 2.0), wall);
        assert!(movement.blocked.x);
        assert!(!movement.blocked.z);
        assert!((movement.aabb.max.x - 3.0).abs() < 1e-9);
        assert!((movement.applied.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_resting_on_floor_stays_put() {
        let aabb = player(0.5, 0.0, 0.5);
        let movement = move_box(&aabb, DVec3::new(0.0, -0.5, 0.0), ground);
        assert_eq!(movement.applied, DVec3::ZERO);
        assert!(movement.blocked.y);
    }
}
