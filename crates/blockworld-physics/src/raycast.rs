//! Segment traversal of the voxel grid (Amanatides & Woo DDA).

use glam::{DVec3, IVec3};

use crate::aabb::Axis;

/// First solid block along a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Axis of the face the segment entered through, or `None` when the
    /// segment starts inside a solid block.
    pub axis: Option<Axis>,
    /// Direction the traversal was stepping along `axis` (+1 or -1), `0` for
    /// the inside case.
    pub step: i32,
    /// The solid block.
    pub block: IVec3,
    /// Distance from the segment start to the entry point.
    pub distance: f64,
}

impl RayHit {
    /// `true` if the segment started inside `block`.
    pub fn is_inside(&self) -> bool {
        self.axis.is_none()
    }

    /// Outward normal of the face that was hit, or zero for the inside case.
    pub fn normal(&self) -> IVec3 {
        match self.axis {
            Some(axis) => axis.ivec(-self.step),
            None => IVec3::ZERO,
        }
    }

    /// The empty block in front of the hit face, where a placed block would
    /// go.
    pub fn adjacent(&self) -> IVec3 {
        self.block + self.normal()
    }
}

/// Walks every block the segment `start → end` passes through, in order,
/// and returns the first one for which `is_solid` holds.
///
/// A zero-length segment or one with a non-finite endpoint never hits. If the block
/// containing `start` is solid the result is the inside sentinel
/// (`axis: None`) for that block.
pub fn ray_trace_block(
    start: DVec3,
    end: DVec3,
    mut is_solid: impl FnMut(IVec3) -> bool,
) -> Option<RayHit> {
    if start == end || !start.is_finite() || !end.is_finite() {
        return None;
    }

    let mut block = start.floor().as_ivec3();
    if is_solid(block) {
        return Some(RayHit {
            axis: None,
            step: 0,
            block,
            distance: 0.0,
        });
    }

    let direction = end - start;
    let length = direction.length();

    // Per axis: step sign, distance between boundaries, distance to the
    // next boundary.
    let mut step = [0i32; 3];
    let mut delta = [f64::INFINITY; 3];
    let mut next = [f64::INFINITY; 3];
    for i in 0..3 {
        let d = direction[i];
        if d == 0.0 {
            continue;
        }
        step[i] = if d > 0.0 { 1 } else { -1 };
        delta[i] = length / d.abs();
        let boundary = if d > 0.0 {
            block[i] as f64 + 1.0
        } else {
            block[i] as f64
        };
        next[i] = (boundary - start[i]).abs() / d.abs() * length;
    }

    loop {
        let i = soonest(&next);
        let distance = next[i];
        if distance > length {
            return None;
        }

        block[i] += step[i];
        if is_solid(block) {
            return Some(RayHit {
                axis: Some(Axis::from_index(i)),
                step: step[i],
                block,
                distance,
            });
        }
        next[i] += delta[i];
    }
}

/// Index of the smallest value. Ties go to the lower axis.
pub(crate) fn soonest(values: &[f64; 3]) -> usize {
    if values[0] <= values[1] && values[0] <= values[2] {
        0
    } else if values[1] <= values[2] {
        1
    } else {
        2
    }
}
