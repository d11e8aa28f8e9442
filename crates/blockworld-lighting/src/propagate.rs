//! Breadth-first light spreading and removal over the world.
//!
//! Both passes address voxels by global [`BlockPos`] and ask the [`World`]
//! for everything else, so chunk boundaries need no special handling.
//! Positions in unloaded chunks are skipped; the chunk build that runs when
//! such a chunk arrives samples the boundary light instead.

use std::collections::VecDeque;

use blockworld_voxel::catalog::MAX_LIGHT;
use blockworld_voxel::{BlockCatalog, BlockPos, Direction, Voxel, World};

/// One of the two independent light fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    /// Light entering from open sky.
    Sky,
    /// Light emitted by luminous blocks.
    Torch,
}

impl LightChannel {
    pub const BOTH: [LightChannel; 2] = [LightChannel::Torch, LightChannel::Sky];

    /// Current level at `pos`, or `None` if its chunk is not loaded.
    pub fn read(self, world: &World, pos: BlockPos) -> Option<u8> {
        match self {
            LightChannel::Sky => world.get_skylight(pos),
            LightChannel::Torch => world.get_torchlight(pos),
        }
    }

    pub(crate) fn write(self, world: &mut World, pos: BlockPos, level: u8) {
        match self {
            LightChannel::Sky => world.set_skylight(pos, level),
            LightChannel::Torch => world.set_torchlight(pos, level),
        };
    }
}

/// Attenuation rules shared by every pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightRules {
    /// Full skylight falls straight down through a block losing only that
    /// block's opacity, instead of the usual `opacity + 1`.
    pub unattenuated_sky_column: bool,
}

impl LightRules {
    /// Level that a cell lit at `from` gives the cell reached by moving in
    /// `dir`, given that cell's opacity.
    pub fn transfer(&self, channel: LightChannel, from: u8, dir: Direction, target_opacity: u8) -> u8 {
        if target_opacity >= MAX_LIGHT {
            return 0;
        }
        if self.is_sky_column(channel, from, dir) {
            return MAX_LIGHT - target_opacity;
        }
        from.saturating_sub(target_opacity + 1)
    }

    fn is_sky_column(&self, channel: LightChannel, from: u8, dir: Direction) -> bool {
        self.unattenuated_sky_column
            && channel == LightChannel::Sky
            && dir == Direction::NegY
            && from == MAX_LIGHT
    }
}

/// Skylight a cell receives straight from open sky.
///
/// Only cells directly under an unloaded chunk see open sky; everything else
/// gets its skylight from neighbours.
pub(crate) fn open_sky_level(world: &World, catalog: &BlockCatalog, pos: BlockPos, voxel: Voxel) -> u8 {
    if world.is_loaded(pos.above().chunk()) {
        return 0;
    }
    MAX_LIGHT - catalog.opacity(voxel)
}

/// Level a cell has on its own, independent of any neighbour.
pub(crate) fn source_level(
    world: &World,
    catalog: &BlockCatalog,
    channel: LightChannel,
    pos: BlockPos,
    voxel: Voxel,
) -> u8 {
    match channel {
        LightChannel::Torch => catalog.luminance(voxel),
        LightChannel::Sky => open_sky_level(world, catalog, pos, voxel),
    }
}

/// Transient work queues for one channel pass.
#[derive(Debug, Default)]
pub(crate) struct LightQueues {
    /// Cells whose light must be pushed to (or pulled from) their neighbours.
    pub spread: VecDeque<BlockPos>,
    /// Cells already zeroed, with the level they had.
    pub removal: VecDeque<(BlockPos, u8)>,
}

impl LightQueues {
    /// Drains the spread queue. Returns the number of light writes.
    ///
    /// Each popped cell pushes light outward into dimmer neighbours and, in
    /// the other direction, pulls light in from a brighter neighbour, so the
    /// result does not depend on which side of a gap was queued first.
    pub fn spread(&mut self, world: &mut World, rules: &LightRules, channel: LightChannel) -> usize {
        let catalog = world.catalog_handle();
        let mut writes = 0;

        while let Some(pos) = self.spread.pop_front() {
            let (Some(voxel), Some(mut level)) = (world.get_voxel(pos), channel.read(world, pos))
            else {
                continue;
            };
            let own_opacity = catalog.opacity(voxel);

            for dir in Direction::ALL {
                let npos = pos.neighbor(dir);
                let (Some(nvoxel), Some(nlevel)) =
                    (world.get_voxel(npos), channel.read(world, npos))
                else {
                    continue;
                };

                let outward = rules.transfer(channel, level, dir, catalog.opacity(nvoxel));
                if outward > nlevel {
                    channel.write(world, npos, outward);
                    self.spread.push_back(npos);
                    writes += 1;
                    continue;
                }

                let inward = rules.transfer(channel, nlevel, dir.opposite(), own_opacity);
                if inward > level {
                    level = inward;
                    channel.write(world, pos, level);
                    self.spread.push_back(pos);
                    writes += 1;
                }
            }
        }

        writes
    }

    /// Drains the removal queue, erasing light that depended on the removed
    /// values.
    ///
    /// A lit neighbour dimmer than the removed level was fed by it and is
    /// zeroed. A neighbour at least as bright has another source and is
    /// queued for spreading instead, as is every zeroed cell that is a source
    /// in its own right. Call [`spread`](Self::spread) afterwards.
    pub fn remove(&mut self, world: &mut World, rules: &LightRules, channel: LightChannel) {
        let catalog = world.catalog_handle();
        let mut sources = Vec::new();

        while let Some((pos, removed)) = self.removal.pop_front() {
            for dir in Direction::ALL {
                let npos = pos.neighbor(dir);
                let (Some(nvoxel), Some(nlevel)) =
                    (world.get_voxel(npos), channel.read(world, npos))
                else {
                    continue;
                };
                if nlevel == 0 {
                    continue;
                }

                if nlevel < removed || rules.is_sky_column(channel, removed, dir) {
                    channel.write(world, npos, 0);
                    self.removal.push_back((npos, nlevel));
                    let own = source_level(world, &catalog, channel, npos, nvoxel);
                    if own > 0 {
                        sources.push((npos, own));
                    }
                } else {
                    self.spread.push_back(npos);
                }
            }
        }

        for (pos, level) in sources {
            if channel.read(world, pos).is_some_and(|current| current < level) {
                channel.write(world, pos, level);
            }
            self.spread.push_back(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMN: LightRules = LightRules {
        unattenuated_sky_column: true,
    };
    const DIFFUSE: LightRules = LightRules {
        unattenuated_sky_column: false,
    };

    #[test]
    fn test_transfer_decays_by_opacity_plus_one() {
        assert_eq!(COLUMN.transfer(LightChannel::Torch, 15, Direction::PosX, 0), 14);
        assert_eq!(COLUMN.transfer(LightChannel::Torch, 15, Direction::PosX, 3), 11);
        assert_eq!(COLUMN.transfer(LightChannel::Torch, 1, Direction::PosX, 0), 0);
        assert_eq!(COLUMN.transfer(LightChannel::Torch, 15, Direction::NegY, 0), 14);
    }

    #[test]
    fn test_transfer_blocked_by_opaque() {
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 15, Direction::NegY, 15), 0);
        assert_eq!(COLUMN.transfer(LightChannel::Torch, 15, Direction::PosY, 15), 0);
    }

    #[test]
    fn test_sky_column_only_straight_down_from_full() {
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 15, Direction::NegY, 0), 15);
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 15, Direction::NegY, 2), 13);
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 14, Direction::NegY, 0), 13);
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 15, Direction::PosY, 0), 14);
        assert_eq!(COLUMN.transfer(LightChannel::Sky, 15, Direction::PosX, 0), 14);
        assert_eq!(DIFFUSE.transfer(LightChannel::Sky, 15, Direction::NegY, 0), 14);
    }
}
