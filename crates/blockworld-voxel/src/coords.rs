//! Global block positions, chunk coordinates, and the conversions between them.
//!
//! Chunk membership is computed with floored division so that negative block
//! coordinates land in the chunk below zero (`-1` lives in chunk `-1` at local
//! `15`), never in chunk `0`.

use serde::{Deserialize, Serialize};

use crate::chunk::CHUNK_SIZE;

const S: i32 = CHUNK_SIZE as i32;

/// Integer position of a voxel in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position offset by `(dx, dy, dz)`.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the adjacent position in `dir`.
    pub fn neighbor(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.offset();
        self.offset(dx, dy, dz)
    }

    pub fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Chunk containing this position.
    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord::new(self.x.div_euclid(S), self.y.div_euclid(S), self.z.div_euclid(S))
    }

    /// Position within the containing chunk.
    pub fn local(self) -> LocalPos {
        LocalPos::new(
            self.x.rem_euclid(S) as u8,
            self.y.rem_euclid(S) as u8,
            self.z.rem_euclid(S) as u8,
        )
    }

    /// Splits into `(chunk, local)`.
    pub fn split(self) -> (ChunkCoord, LocalPos) {
        (self.chunk(), self.local())
    }

    /// Inverse of [`split`](Self::split).
    pub fn from_parts(chunk: ChunkCoord, local: LocalPos) -> Self {
        chunk
            .origin()
            .offset(local.x as i32, local.y as i32, local.z as i32)
    }

    /// Manhattan distance on the horizontal plane.
    pub fn horizontal_manhattan(self, other: BlockPos) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

/// Chunk-space coordinate (block coordinate floor-divided by the chunk size).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate of the chunk offset by `(dx, dy, dz)`.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the face-adjacent chunk in `dir`.
    pub fn neighbor(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.offset();
        self.offset(dx, dy, dz)
    }

    /// World position of local `(0, 0, 0)`.
    pub fn origin(self) -> BlockPos {
        BlockPos::new(self.x * S, self.y * S, self.z * S)
    }

    /// Squared Euclidean distance in chunk units.
    pub fn distance_sq(self, other: ChunkCoord) -> u64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        (dx * dx + dy * dy + dz * dz) as u64
    }
}

/// Position inside a chunk, each component in `[0, CHUNK_SIZE)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// The six axis-aligned directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    /// The four cardinal directions on the horizontal plane.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosZ,
        Direction::NegZ,
    ];

    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::PosX => (1, 0, 0),
            Direction::NegX => (-1, 0, 0),
            Direction::PosY => (0, 1, 0),
            Direction::NegY => (0, -1, 0),
            Direction::PosZ => (0, 0, 1),
            Direction::NegZ => (0, 0, -1),
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::PosX => Direction::NegX,
            Direction::NegX => Direction::PosX,
            Direction::PosY => Direction::NegY,
            Direction::NegY => Direction::PosY,
            Direction::PosZ => Direction::NegZ,
            Direction::NegZ => Direction::PosZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_coordinates_use_floored_division() {
        let pos = BlockPos::new(-1, -16, -17);
        assert_eq!(pos.chunk(), ChunkCoord::new(-1, -1, -2));
        assert_eq!(pos.local(), LocalPos::new(15, 0, 15));
    }

    #[test]
    fn test_split_and_from_parts_are_inverse() {
        for &(x, y, z) in &[(0, 0, 0), (15, 16, -1), (-33, 47, 1000), (i32::MIN / 2, 5, -5)] {
            let pos = BlockPos::new(x, y, z);
            let (chunk, local) = pos.split();
            assert_eq!(BlockPos::from_parts(chunk, local), pos);
        }
    }

    #[test]
    fn test_neighbor_crosses_chunk_boundary() {
        let edge = BlockPos::new(15, 0, 0);
        let next = edge.neighbor(Direction::PosX);
        assert_eq!(next.chunk(), ChunkCoord::new(1, 0, 0));
        assert_eq!(next.local(), LocalPos::new(0, 0, 0));
    }

    #[test]
    fn test_opposite_roundtrips() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy, dz) = dir.offset();
            let (ox, oy, oz) = dir.opposite().offset();
            assert_eq!((dx + ox, dy + oy, dz + oz), (0, 0, 0));
        }
    }

    #[test]
    fn test_chunk_distance() {
        let a = ChunkCoord::new(0, 0, 0);
        assert_eq!(a.distance_sq(ChunkCoord::new(1, 2, -2)), 9);
    }
}
