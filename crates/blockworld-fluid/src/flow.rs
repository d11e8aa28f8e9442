//! Cell classification and the hole-seeking search.

use blockworld_voxel::{BlockCatalog, BlockId, BlockPos, Direction, Voxel, World};
use rustc_hash::FxHashMap;

use crate::state::FluidState;

/// Bit `i` set means [`Direction::HORIZONTAL`]`[i]`.
pub(crate) type DirectionMask = u8;

pub(crate) const ALL_HORIZONTAL: DirectionMask = 0b1111;

/// How a voxel looks to one particular fluid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cell {
    /// Air: fluid may move in.
    Open,
    /// The same fluid (after canonicalisation) in the given state.
    Same(FluidState),
    /// Anything else, including other fluids.
    Blocked,
}

pub(crate) fn classify(catalog: &BlockCatalog, fluid: BlockId, voxel: Voxel) -> Cell {
    if voxel.is_air() {
        return Cell::Open;
    }
    match catalog.fluid(voxel) {
        Some(info) if info.canonical == fluid => Cell::Same(FluidState::of(voxel)),
        _ => Cell::Blocked,
    }
}

/// `true` if fluid arriving at `level` could move into a cell holding
/// `cell`: it is air, or a weaker non-source cell of the same fluid.
pub(crate) fn accepts(cell: Cell, level: u8) -> bool {
    match cell {
        Cell::Open => true,
        Cell::Same(state) => !state.is_source() && state.level > level,
        Cell::Blocked => false,
    }
}

/// Searches the horizontal plane around `origin` for the nearest holes: cells
/// whose voxel below would accept fluid arriving there.
///
/// Only air and non-source cells of the same fluid are walked, and at most
/// `range` steps. Returns the first-step directions that lie on a shortest
/// path to any nearest hole, or `None` if no hole is in reach.
pub(crate) fn find_holes(
    world: &World,
    catalog: &BlockCatalog,
    fluid: BlockId,
    origin: BlockPos,
    level: u8,
    range: u8,
) -> Option<DirectionMask> {
    let walkable = |pos: BlockPos| match world.get_voxel(pos) {
        Some(voxel) => match classify(catalog, fluid, voxel) {
            Cell::Open => true,
            Cell::Same(state) => !state.is_source(),
            Cell::Blocked => false,
        },
        None => false,
    };
    let is_hole = |pos: BlockPos, arriving: u8| {
        world
            .get_voxel(pos.below())
            .is_some_and(|below| accepts(classify(catalog, fluid, below), arriving))
    };

    // Position → (distance, first-step mask).
    let mut visited: FxHashMap<BlockPos, (u8, DirectionMask)> = FxHashMap::default();
    let mut frontier = Vec::new();
    for (i, dir) in Direction::HORIZONTAL.iter().enumerate() {
        let pos = origin.neighbor(*dir);
        if walkable(pos) {
            visited.insert(pos, (1, 1 << i));
            frontier.push(pos);
        }
    }

    for distance in 1..=range {
        let mut found = 0;
        for pos in &frontier {
            if is_hole(*pos, level + distance) {
                found |= visited[pos].1;
            }
        }
        if found != 0 {
            return Some(found);
        }
        if distance == range {
            break;
        }

        let mut next = Vec::new();
        for pos in &frontier {
            let mask = visited[pos].1;
            for dir in Direction::HORIZONTAL {
                let npos = pos.neighbor(dir);
                if npos == origin {
                    continue;
                }
                match visited.get_mut(&npos) {
                    Some((seen_at, seen_mask)) => {
                        if *seen_at == distance + 1 {
                            *seen_mask |= mask;
                        }
                    }
                    None => {
                        if walkable(npos) {
                            visited.insert(npos, (distance + 1, mask));
                            next.push(npos);
                        }
                    }
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    None
}
