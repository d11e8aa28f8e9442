use blockworld_voxel::{BlockId, Voxel};

const LEVEL_MASK: u16 = 0b0_1111;
const FALLING_BIT: u16 = 0b1_0000;

/// Fluid sub-state packed into the low bits of a voxel's variant.
///
/// Bits 0-3 hold the level, bit 4 the falling flag. The remaining variant
/// bits are left at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FluidState {
    pub level: u8,
    pub falling: bool,
}

impl FluidState {
    pub const SOURCE: FluidState = FluidState {
        level: 0,
        falling: false,
    };

    /// A horizontally spread cell.
    pub const fn flowing(level: u8) -> Self {
        Self {
            level,
            falling: false,
        }
    }

    /// A cell in a column fed from above.
    pub const fn falling(level: u8) -> Self {
        Self {
            level,
            falling: true,
        }
    }

    pub fn from_variant(variant: u16) -> Self {
        Self {
            level: (variant & LEVEL_MASK) as u8,
            falling: variant & FALLING_BIT != 0,
        }
    }

    pub fn to_variant(self) -> u16 {
        let falling = if self.falling { FALLING_BIT } else { 0 };
        (self.level as u16 & LEVEL_MASK) | falling
    }

    pub fn of(voxel: Voxel) -> Self {
        Self::from_variant(voxel.variant())
    }

    /// Packs this state onto `fluid`.
    pub fn voxel(self, fluid: BlockId) -> Voxel {
        Voxel::pack(fluid, self.to_variant())
    }

    /// Level 0 and not falling. Sources persist without any inflow and are
    /// never overwritten by spreading.
    pub fn is_source(self) -> bool {
        self.level == 0 && !self.falling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_layout() {
        assert_eq!(FluidState::SOURCE.to_variant(), 0);
        assert_eq!(FluidState::flowing(5).to_variant(), 5);
        assert_eq!(FluidState::falling(3).to_variant(), 0b1_0011);
        assert_eq!(FluidState::from_variant(0b1_0111), FluidState::falling(7));
    }

    #[test]
    fn test_falling_level_zero_is_not_a_source() {
        assert!(FluidState::SOURCE.is_source());
        assert!(!FluidState::falling(0).is_source());
        assert!(!FluidState::flowing(1).is_source());
    }

    #[test]
    fn test_voxel_carries_state() {
        let water = BlockId(4);
        let voxel = FluidState::flowing(6).voxel(water);
        assert_eq!(voxel.block(), water);
        assert_eq!(FluidState::of(voxel), FluidState::flowing(6));
    }
}
