//! Dense 16×16×16 voxel storage with a parallel per-voxel light field.
//!
//! Both arrays share one linear index, `idx(x, y, z) = (y * S + z) * S + x`.
//! Every subsystem goes through [`Chunk::index`], so the layout is defined in
//! exactly one place.

use crate::voxel::Voxel;

/// Side length of a chunk in voxels.
pub const CHUNK_SIZE: usize = 16;

/// Total number of voxels in a chunk (16³).
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Dirty-flag bit: chunk mesh needs rebuilding (voxel or light changed).
pub const MESH_DIRTY: u8 = 0b0000_0001;
/// Dirty-flag bit: chunk voxels differ from what the generator produced.
pub const SAVE_DIRTY: u8 = 0b0000_0010;

/// Packed light value: high nibble = skylight, low nibble = torchlight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoxelLight(pub u8);

impl VoxelLight {
    /// Maximum light level for either channel.
    pub const MAX_LEVEL: u8 = 15;

    pub fn new(skylight: u8, torchlight: u8) -> Self {
        let mut light = Self(0);
        light.set_skylight(skylight);
        light.set_torchlight(torchlight);
        light
    }

    /// Returns the skylight level (0–15).
    pub fn skylight(self) -> u8 {
        (self.0 >> 4) & 0xF
    }

    /// Returns the torchlight level (0–15).
    pub fn torchlight(self) -> u8 {
        self.0 & 0xF
    }

    /// Sets the skylight level (0–15).
    pub fn set_skylight(&mut self, level: u8) {
        debug_assert!(level <= Self::MAX_LEVEL);
        self.0 = (self.0 & 0x0F) | ((level & 0x0F) << 4);
    }

    /// Sets the torchlight level (0–15).
    pub fn set_torchlight(&mut self, level: u8) {
        debug_assert!(level <= Self::MAX_LEVEL);
        self.0 = (self.0 & 0xF0) | (level & 0x0F);
    }
}

/// A 16³ block of voxels plus its light field, dirty flags, and version.
///
/// Coordinates are chunk-local and must be in `[0, 16)`; anything else is a
/// programming error and panics.
#[derive(Clone, Debug)]
pub struct Chunk {
    voxels: Box<[Voxel]>,
    light: Box<[VoxelLight]>,
    dirty: u8,
    /// Incremented on each voxel mutation.
    version: u64,
}

impl Chunk {
    /// Creates a chunk filled with air and no light.
    pub fn new() -> Self {
        Self::new_filled(Voxel::AIR)
    }

    /// Creates a chunk filled with the given voxel.
    pub fn new_filled(voxel: Voxel) -> Self {
        Self {
            voxels: vec![voxel; CHUNK_VOLUME].into_boxed_slice(),
            light: vec![VoxelLight(0); CHUNK_VOLUME].into_boxed_slice(),
            dirty: 0,
            version: 0,
        }
    }

    /// Wraps a fully populated generator buffer.
    ///
    /// # Panics
    ///
    /// Panics if `voxels.len() != CHUNK_VOLUME`.
    pub fn from_voxels(voxels: Vec<Voxel>) -> Self {
        assert_eq!(
            voxels.len(),
            CHUNK_VOLUME,
            "chunk buffer must hold exactly {CHUNK_VOLUME} voxels"
        );
        Self {
            voxels: voxels.into_boxed_slice(),
            light: vec![VoxelLight(0); CHUNK_VOLUME].into_boxed_slice(),
            dirty: 0,
            version: 0,
        }
    }

    /// Linear index of `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is `>= CHUNK_SIZE`.
    #[inline]
    pub fn index(x: u8, y: u8, z: u8) -> usize {
        let (x, y, z) = (x as usize, y as usize, z as usize);
        assert!(
            x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE,
            "chunk-local coordinate out of range: ({x}, {y}, {z})"
        );
        (y * CHUNK_SIZE + z) * CHUNK_SIZE + x
    }

    /// Inverse of [`index`](Self::index).
    pub fn coords_of(index: usize) -> (u8, u8, u8) {
        assert!(index < CHUNK_VOLUME, "chunk index out of range: {index}");
        let x = index % CHUNK_SIZE;
        let z = (index / CHUNK_SIZE) % CHUNK_SIZE;
        let y = index / (CHUNK_SIZE * CHUNK_SIZE);
        (x as u8, y as u8, z as u8)
    }

    pub fn get(&self, x: u8, y: u8, z: u8) -> Voxel {
        self.voxels[Self::index(x, y, z)]
    }

    /// Writes a voxel and returns the previous value.
    pub fn set(&mut self, x: u8, y: u8, z: u8, voxel: Voxel) -> Voxel {
        let slot = &mut self.voxels[Self::index(x, y, z)];
        let old = std::mem::replace(slot, voxel);
        if old != voxel {
            self.dirty |= MESH_DIRTY | SAVE_DIRTY;
            self.version += 1;
        }
        old
    }

    pub fn light(&self, x: u8, y: u8, z: u8) -> VoxelLight {
        self.light[Self::index(x, y, z)]
    }

    pub fn skylight(&self, x: u8, y: u8, z: u8) -> u8 {
        self.light(x, y, z).skylight()
    }

    pub fn torchlight(&self, x: u8, y: u8, z: u8) -> u8 {
        self.light(x, y, z).torchlight()
    }

    pub fn set_skylight(&mut self, x: u8, y: u8, z: u8, level: u8) {
        let slot = &mut self.light[Self::index(x, y, z)];
        if slot.skylight() != level {
            slot.set_skylight(level);
            self.dirty |= MESH_DIRTY;
        }
    }

    pub fn set_torchlight(&mut self, x: u8, y: u8, z: u8, level: u8) {
        let slot = &mut self.light[Self::index(x, y, z)];
        if slot.torchlight() != level {
            slot.set_torchlight(level);
            self.dirty |= MESH_DIRTY;
        }
    }

    /// Zeroes both light channels everywhere.
    pub fn clear_light(&mut self) {
        self.light.fill(VoxelLight(0));
        self.dirty |= MESH_DIRTY;
    }

    /// All voxels in linear-index order.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// The whole light field in linear-index order.
    pub fn light_field(&self) -> &[VoxelLight] {
        &self.light
    }

    pub fn dirty_flags(&self) -> u8 {
        self.dirty
    }

    /// Returns `true` if the specified dirty flag (or combination) is set.
    pub fn is_dirty(&self, flag: u8) -> bool {
        self.dirty & flag == flag
    }

    pub fn clear_dirty(&mut self, flags: u8) {
        self.dirty &= !flags;
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
