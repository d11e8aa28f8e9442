//! Swept AABB against the voxel grid.

use glam::{DVec3, IVec3};

use crate::aabb::{Aabb, Axis};
use crate::raycast::soonest;

/// Slack used when turning box faces into cell ranges, so a face lying
/// exactly on a grid plane does not count as overlapping the cell beyond it.
const EPSILON: f64 = 1e-7;

/// First blocking contact of a moving box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxHit {
    /// Axis whose leading face touched a solid cell.
    pub axis: Axis,
    /// Direction of travel along `axis` (+1 or -1).
    pub step: i32,
    /// Coordinate of the leading face along `axis` at contact. Always a grid
    /// plane.
    pub position: f64,
    /// Fraction of the displacement travelled before contact, in `[0, 1]`.
    pub t: f64,
}

/// Sweeps `aabb` along `displacement` and returns the first time its leading
/// face enters a solid cell.
///
/// At every grid plane crossed by a leading face, the whole cross-section of
/// the box on the other two axes (as positioned at that moment) is tested,
/// since the box has area rather than being a point. A zero or non-finite
/// displacement never collides.
///
/// Movement physics should call this once per axis with a single non-zero
/// component (see [`move_box`](crate::move_box)); diagonal sweeps can miss
/// edge-on corner contacts.
pub fn hitboxes_collision(
    aabb: &Aabb,
    displacement: DVec3,
    mut is_solid: impl FnMut(IVec3) -> bool,
) -> Option<BoxHit> {
    if displacement == DVec3::ZERO || !displacement.is_finite() {
        return None;
    }

    let mut step = [0i32; 3];
    // Next grid plane the leading face reaches, and the cell behind it.
    let mut plane = [0.0f64; 3];
    let mut cell = [0i32; 3];
    let mut next = [f64::INFINITY; 3];
    let mut delta = [f64::INFINITY; 3];

    for i in 0..3 {
        let d = displacement[i];
        if d == 0.0 {
            continue;
        }
        delta[i] = 1.0 / d.abs();
        if d > 0.0 {
            step[i] = 1;
            plane[i] = (aabb.max[i] - EPSILON).floor() + 1.0;
            cell[i] = plane[i] as i32;
            next[i] = (plane[i] - aabb.max[i]).max(0.0) / d;
        } else {
            step[i] = -1;
            plane[i] = (aabb.min[i] + EPSILON).ceil() - 1.0;
            cell[i] = plane[i] as i32 - 1;
            next[i] = (aabb.min[i] - plane[i]).max(0.0) / -d;
        }
    }

    loop {
        let i = soonest(&next);
        let t = next[i];
        if t > 1.0 {
            return None;
        }

        let axis = Axis::from_index(i);
        let [a, b] = axis.others();
        let (a_lo, a_hi) = cell_span(aabb, displacement, a, t);
        let (b_lo, b_hi) = cell_span(aabb, displacement, b, t);

        for ca in a_lo..=a_hi {
            for cb in b_lo..=b_hi {
                let mut cell_pos = IVec3::ZERO;
                cell_pos[i] = cell[i];
                cell_pos[a.index()] = ca;
                cell_pos[b.index()] = cb;
                if is_solid(cell_pos) {
                    return Some(BoxHit {
                        axis,
                        step: step[i],
                        position: plane[i],
                        t,
                    });
                }
            }
        }

        plane[i] += step[i] as f64;
        cell[i] += step[i];
        next[i] += delta[i];
    }
}

/// Cells overlapped on `axis` by the box moved to fraction `t`.
fn cell_span(aabb: &Aabb, displacement: DVec3, axis: Axis, t: f64) -> (i32, i32) {
    let i = axis.index();
    let offset = displacement[i] * t;
    let lo = (aabb.min[i] + offset + EPSILON).floor() as i32;
    let hi = (aabb.max[i] + offset - EPSILON).floor() as i32;
    (lo, hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_at_zero(cell: IVec3) -> bool {
        cell.y < 0
    }

    fn unit_box(x: f64, y: f64, z: f64) -> Aabb {
        Aabb::new(DVec3::new(x, y, z), DVec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    #[test]
    fn test_zero_displacement_never_collides() {
        let aabb = unit_box(0.0, 0.0, 0.0);
        assert_eq!(hitboxes_collision(&aabb, DVec3::ZERO, |_| true), None);
    }

    #[test]
    fn test_infinite_displacement_never_collides() {
        let aabb = unit_box(0.0, 3.0, 0.0);
        let down = DVec3::new(0.0, f64::NEG_INFINITY, 0.0);
        assert_eq!(hitboxes_collision(&aabb, down, floor_at_zero), None);
    }

    #[test]
    fn test_falls_onto_floor() {
        let aabb = Aabb::from_feet(DVec3::new(0.5, 2.5, 0.5), 0.6, 1.8);
        let hit = hitboxes_collision(&aabb, DVec3::new(0.0, -5.0, 0.0), floor_at_zero).unwrap();
        assert_eq!(hit.axis, Axis::Y);
        assert_eq!(hit.step, -1);
        assert_eq!(hit.position, 0.0);
        assert!((hit.t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_hit_when_displacement_too_short() {
        let aabb = Aabb::from_feet(DVec3::new(0.5, 2.5, 0.5), 0.6, 1.8);
        assert_eq!(
            hitboxes_collision(&aabb, DVec3::new(0.0, -2.0, 0.0), floor_at_zero),
            None
        );
    }

    #[test]
    fn test_resting_box_is_blocked_immediately() {
        let aabb = unit_box(0.0, 0.0, 0.0);
        let hit = hitboxes_collision(&aabb, DVec3::new(0.0, -0.1, 0.0), floor_at_zero).unwrap();
        assert_eq!(hit.t, 0.0);
        assert_eq!(hit.position, 0.0);
    }

    #[test]
    fn test_resting_box_slides_freely() {
        let aabb = unit_box(0.0, 0.0, 0.0);
        assert_eq!(
            hitboxes_collision(&aabb, DVec3::new(3.0, 0.0, 0.0), floor_at_zero),
            None
        );
    }

    #[test]
    fn test_cross_section_catches_off_centre_pillar() {
        // The box spans x in [0.2, 1.8]; a pillar at x = 1 is not under its
        // centre line at x = 1.0 but is under the box.
        let aabb = Aabb::new(DVec3::new(0.2, 3.0, 0.2), DVec3::new(1.8, 4.0, 0.8));
        let pillar = |cell: IVec3| cell == IVec3::new(1, 1, 0);
        let hit = hitboxes_collision(&aabb, DVec3::new(0.0, -3.0, 0.0), pillar).unwrap();
        assert_eq!(hit.position, 2.0);
        assert!((hit.t - 1.0 / 3.0).abs() < 1e-9);

        let narrow = Aabb::new(DVec3::new(0.2, 3.0, 0.2), DVec3::new(0.9, 4.0, 0.8));
        assert_eq!(
            hitboxes_collision(&narrow, DVec3::new(0.0, -3.0, 0.0), pillar),
            None
        );
    }

    #[test]
    fn test_wall_hit_along_negative_x() {
        let aabb = unit_box(5.5, 0.0, 0.0);
        let wall = |cell: IVec3| cell.x == 2;
        let hit = hitboxes_collision(&aabb, DVec3::new(-4.0, 0.0, 0.0), wall).unwrap();
        assert_eq!(hit.axis, Axis::X);
        assert_eq!(hit.step, -1);
        assert_eq!(hit.position, 3.0);
        assert!((hit.t - 2.5 / 4.0).abs() < 1e-9);
    }
}
