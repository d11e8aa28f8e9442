//! The packed "long-id" voxel value.
//!
//! A [`Voxel`] packs a block type id and a variant into a single `u32`.
//! The layout is frozen: the low 16 bits hold the type id, the high 16 bits
//! hold the variant (fluid level, orientation, ...).

use serde::{Deserialize, Serialize};

/// Index into the [`BlockCatalog`](crate::BlockCatalog).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Air is always registered first.
    pub const AIR: BlockId = BlockId(0);

    /// Returns `true` for the air block.
    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

/// One grid cell's content: block type plus variant, packed into 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel(u32);

impl Voxel {
    /// Empty space (type 0, variant 0).
    pub const AIR: Voxel = Voxel(0);

    /// Packs a block id and a variant.
    pub const fn pack(block: BlockId, variant: u16) -> Self {
        Self((block.0 as u32) | ((variant as u32) << 16))
    }

    /// Shorthand for a voxel with variant 0.
    pub const fn of(block: BlockId) -> Self {
        Self::pack(block, 0)
    }

    /// Splits the voxel back into `(block, variant)`.
    pub const fn unpack(self) -> (BlockId, u16) {
        (self.block(), self.variant())
    }

    /// Block type id (low 16 bits).
    pub const fn block(self) -> BlockId {
        BlockId((self.0 & 0xFFFF) as u16)
    }

    /// Variant (high 16 bits).
    pub const fn variant(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns a copy with the variant replaced.
    pub const fn with_variant(self, variant: u16) -> Self {
        Self::pack(self.block(), variant)
    }

    /// The raw packed representation.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Rebuilds a voxel from its raw packed representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns `true` if the block id is air, regardless of variant.
    pub fn is_air(self) -> bool {
        self.block().is_air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_extremes() {
        for (id, variant) in [(0, 0), (1, 0), (0, 1), (u16::MAX, u16::MAX), (513, 7)] {
            let v = Voxel::pack(BlockId(id), variant);
            assert_eq!(v.unpack(), (BlockId(id), variant));
            assert_eq!(Voxel::from_raw(v.to_raw()), v);
        }
    }

    #[test]
    fn test_layout_is_low_id_high_variant() {
        let v = Voxel::pack(BlockId(0x1234), 0xABCD);
        assert_eq!(v.to_raw(), 0xABCD_1234);
    }

    #[test]
    fn test_with_variant_keeps_block() {
        let v = Voxel::pack(BlockId(9), 3).with_variant(12);
        assert_eq!(v.block(), BlockId(9));
        assert_eq!(v.variant(), 12);
    }

    #[test]
    fn test_air_ignores_variant() {
        assert!(Voxel::AIR.is_air());
        assert!(Voxel::pack(BlockId::AIR, 4).is_air());
        assert!(!Voxel::of(BlockId(1)).is_air());
    }
}
