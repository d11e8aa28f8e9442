//! Block catalog: maps compact [`BlockId`] values to rich [`BlockDef`] metadata.
//!
//! The catalog is built once during startup and then shared read-only. Air is
//! always ID 0 so that zero-initialized voxel buffers represent empty space.
//! Construction is the one place where malformed data is a hard error; every
//! later lookup assumes a fully validated catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::voxel::{BlockId, Voxel};

/// Highest light level and highest opacity.
pub const MAX_LIGHT: u8 = 15;

/// Largest fluid level that fits the level bits of a fluid variant.
pub const MAX_FLUID_LEVEL: u8 = 15;

/// Fluid behaviour of a block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluidDef {
    /// Weakest level a flow can reach before it stops spreading.
    pub max_level: u8,
    /// Name of the block this one collapses to for level arithmetic
    /// (e.g. `"water_flowing"` → `"water"`). `None` means the block is its
    /// own canonical fluid.
    #[serde(default)]
    pub canonical: Option<String>,
}

/// Full descriptor for a block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Unique human-readable name (e.g. "stone", "water").
    pub name: String,
    /// Light attenuation, 0 = fully transparent, 15 = fully opaque.
    #[serde(default)]
    pub opacity: u8,
    /// Emitted torchlight level.
    #[serde(default)]
    pub luminance: u8,
    /// Surface friction coefficient used by movement code.
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// Whether moving boxes and rays collide with this block.
    #[serde(default)]
    pub solid: bool,
    /// Present for fluid blocks.
    #[serde(default)]
    pub fluid: Option<FluidDef>,
}

fn default_friction() -> f32 {
    1.0
}

impl BlockDef {
    /// A solid, fully opaque block.
    pub fn solid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opacity: MAX_LIGHT,
            luminance: 0,
            friction: 1.0,
            solid: true,
            fluid: None,
        }
    }

    /// A non-solid, fully transparent block.
    pub fn transparent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opacity: 0,
            luminance: 0,
            friction: 1.0,
            solid: false,
            fluid: None,
        }
    }

    /// A non-solid fluid block.
    pub fn fluid(name: impl Into<String>, opacity: u8, max_level: u8) -> Self {
        Self {
            name: name.into(),
            opacity,
            luminance: 0,
            friction: 1.0,
            solid: false,
            fluid: Some(FluidDef {
                max_level,
                canonical: None,
            }),
        }
    }

    pub fn with_luminance(mut self, luminance: u8) -> Self {
        self.luminance = luminance;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Marks this fluid as a variant of `canonical`.
    pub fn canonical_fluid(mut self, canonical: impl Into<String>) -> Self {
        if let Some(fluid) = self.fluid.as_mut() {
            fluid.canonical = Some(canonical.into());
        }
        self
    }

    /// Returns `true` if light cannot pass through this block at all.
    pub fn is_opaque(&self) -> bool {
        self.opacity >= MAX_LIGHT
    }
}

/// Errors that can occur while building the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A type with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 ids are in use.
    #[error("block catalog is full (max 65536 types)")]
    CatalogFull,
    /// Opacity outside `0..=15`.
    #[error("block {name}: opacity {value} exceeds 15")]
    OpacityOutOfRange { name: String, value: u8 },
    /// Luminance outside `0..=15`.
    #[error("block {name}: luminance {value} exceeds 15")]
    LuminanceOutOfRange { name: String, value: u8 },
    /// Fluid max level outside `1..=15`.
    #[error("block {name}: fluid max level {value} must be in 1..=15")]
    FluidLevelOutOfRange { name: String, value: u8 },
    /// A fluid names a canonical fluid that is not registered yet.
    #[error("block {name}: canonical fluid {canonical} is not a registered fluid")]
    UnknownCanonicalFluid { name: String, canonical: String },
    /// The catalog file could not be parsed.
    #[error("failed to parse block catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Resolved fluid facts for one block id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FluidInfo {
    /// Id used for level arithmetic and same-fluid comparisons.
    pub canonical: BlockId,
    pub max_level: u8,
}

/// Maps [`BlockId`] → [`BlockDef`] with O(1) lookup by index and by name.
#[derive(Debug)]
pub struct BlockCatalog {
    /// Dense array where `index == BlockId.0`.
    defs: Vec<BlockDef>,
    /// Resolved fluid info, parallel to `defs`.
    fluids: Vec<Option<FluidInfo>>,
    name_to_id: HashMap<String, BlockId>,
}

impl BlockCatalog {
    /// Creates a catalog with Air pre-registered as ID 0.
    pub fn new() -> Self {
        let mut name_to_id = HashMap::new();
        name_to_id.insert("air".to_string(), BlockId::AIR);
        Self {
            defs: vec![BlockDef::transparent("air")],
            fluids: vec![None],
            name_to_id,
        }
    }

    /// Parses a RON list of block definitions and registers them in order.
    ///
    /// Air is implicit and must not appear in the list.
    pub fn from_ron_str(source: &str) -> Result<Self, CatalogError> {
        let defs: Vec<BlockDef> = ron::from_str(source)?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.register(def)?;
        }
        tracing::debug!("Loaded block catalog with {} types", catalog.len());
        Ok(catalog)
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// IDs are assigned sequentially starting from 1 (0 is Air).
    ///
    /// # Errors
    ///
    /// Rejects duplicate names, out-of-range opacity, luminance or fluid
    /// levels, and canonical fluids that are not registered yet.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, CatalogError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(CatalogError::DuplicateName(def.name));
        }
        if self.defs.len() > u16::MAX as usize {
            return Err(CatalogError::CatalogFull);
        }
        if def.opacity > MAX_LIGHT {
            return Err(CatalogError::OpacityOutOfRange {
                name: def.name,
                value: def.opacity,
            });
        }
        if def.luminance > MAX_LIGHT {
            return Err(CatalogError::LuminanceOutOfRange {
                name: def.name,
                value: def.luminance,
            });
        }

        let id = BlockId(self.defs.len() as u16);
        let fluid = match &def.fluid {
            None => None,
            Some(fluid) => {
                if fluid.max_level == 0 || fluid.max_level > MAX_FLUID_LEVEL {
                    return Err(CatalogError::FluidLevelOutOfRange {
                        name: def.name,
                        value: fluid.max_level,
                    });
                }
                let canonical = match &fluid.canonical {
                    None => id,
                    Some(name) => {
                        let target = self
                            .name_to_id
                            .get(name)
                            .copied()
                            .filter(|t| self.fluids[t.0 as usize].is_some());
                        match target {
                            Some(target) => target,
                            None => {
                                return Err(CatalogError::UnknownCanonicalFluid {
                                    name: def.name.clone(),
                                    canonical: name.clone(),
                                });
                            }
                        }
                    }
                };
                Some(FluidInfo {
                    canonical,
                    max_level: fluid.max_level,
                })
            }
        };

        self.name_to_id.insert(def.name.clone(), id);
        self.defs.push(def);
        self.fluids.push(fluid);
        Ok(id)
    }

    /// Returns the definition for `id`, or `None` for an unregistered id.
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.defs.get(id.0 as usize)
    }

    /// Returns the definition for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered. Chunks are validated against the
    /// catalog when they are loaded, so ids read back from the world are
    /// always known.
    pub fn def(&self, id: BlockId) -> &BlockDef {
        match self.defs.get(id.0 as usize) {
            Some(def) => def,
            None => panic!("block id {} is not in the catalog", id.0),
        }
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: BlockId) -> bool {
        (id.0 as usize) < self.defs.len()
    }

    /// Returns the ID for a named block type, or `None` if not found.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    pub fn opacity(&self, voxel: Voxel) -> u8 {
        self.def(voxel.block()).opacity
    }

    pub fn luminance(&self, voxel: Voxel) -> u8 {
        self.def(voxel.block()).luminance
    }

    pub fn is_opaque(&self, voxel: Voxel) -> bool {
        self.def(voxel.block()).is_opaque()
    }

    pub fn is_solid(&self, voxel: Voxel) -> bool {
        self.def(voxel.block()).solid
    }

    pub fn friction(&self, voxel: Voxel) -> f32 {
        self.def(voxel.block()).friction
    }

    /// Canonical fluid id and max level, or `None` for non-fluids.
    pub fn fluid(&self, voxel: Voxel) -> Option<FluidInfo> {
        self.fluids.get(voxel.block().0 as usize).copied().flatten()
    }

    /// Total number of registered types (including Air).
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if only Air is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
