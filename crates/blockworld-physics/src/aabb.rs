use glam::{DVec3, IVec3};

/// One of the three world axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Resolution order used by [`move_box`](crate::move_box).
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    /// The other two axes, in ascending order.
    pub const fn others(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }

    pub fn unit(self) -> DVec3 {
        let mut v = DVec3::ZERO;
        v[self.index()] = 1.0;
        v
    }

    /// Integer vector pointing `step` along this axis.
    pub fn ivec(self, step: i32) -> IVec3 {
        let mut v = IVec3::ZERO;
        v[self.index()] = step;
        v
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(min.cmple(max).all(), "inverted aabb {min} .. {max}");
        Self { min, max }
    }

    /// Box of the given full `size` centred on `center`.
    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    /// Box of width `width` and height `height` whose bottom face is centred
    /// on `feet`.
    pub fn from_feet(feet: DVec3, width: f64, height: f64) -> Self {
        let half = width * 0.5;
        Self::new(
            DVec3::new(feet.x - half, feet.y, feet.z - half),
            DVec3::new(feet.x + half, feet.y + height, feet.z + half),
        )
    }

    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_others() {
        assert_eq!(Axis::Y.others(), [Axis::X, Axis::Z]);
        for axis in Axis::ALL {
            assert_eq!(Axis::from_index(axis.index()), axis);
            assert!(!axis.others().contains(&axis));
        }
    }

    #[test]
    fn test_from_feet() {
        let aabb = Aabb::from_feet(DVec3::new(1.0, 2.0, 3.0), 0.6, 1.8);
        assert!((aabb.min.x - 0.7).abs() < 1e-12);
        assert_eq!(aabb.min.y, 2.0);
        assert!((aabb.max.y - 3.8).abs() < 1e-12);
        assert!((aabb.center().z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_translated_keeps_size() {
        let aabb = Aabb::from_center_size(DVec3::ZERO, DVec3::splat(2.0));
        let moved = aabb.translated(DVec3::new(5.0, -1.0, 0.5));
        assert_eq!(moved.size(), aabb.size());
        assert_eq!(moved.center(), DVec3::new(5.0, -1.0, 0.5));
    }
}
