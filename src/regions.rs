//! Named island rectangles on the world map.
//!
//! The built-in table is embedded in the binary via `include_str!`; a config
//! file can replace it with its own `regions` list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CropError, Result};

const DEFAULT_REGIONS_JSON: &str = include_str!("../data/regions.json");

/// Resolution of the world map the built-in coordinates were measured on.
pub const CANONICAL_MAP_SIZE: (u32, u32) = (5504, 3072);

/// A named rectangle given by its center and half extents, in source pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub center_x: i32,
    pub center_y: i32,
    pub half_width: i32,
    pub half_height: i32,
}

impl Region {
    pub fn new(name: impl Into<String>, center_x: i32, center_y: i32, half_width: i32, half_height: i32) -> Self {
        Self {
            name: name.into(),
            center_x,
            center_y,
            half_width,
            half_height,
        }
    }

    /// Scale center and extents independently on each axis, rounding to the nearest pixel.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        let scale = |v: i32, s: f64| (v as f64 * s).round() as i32;
        Self {
            name: self.name.clone(),
            center_x: scale(self.center_x, sx),
            center_y: scale(self.center_y, sy),
            half_width: scale(self.half_width, sx),
            half_height: scale(self.half_height, sy),
        }
    }
}

/// Container for deserializing the embedded region file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionsFile {
    pub regions: Vec<Region>,
}

impl RegionsFile {
    /// Parse the table compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(serde_json::from_str(DEFAULT_REGIONS_JSON)?)
    }
}

/// Ordered, validated set of regions. Iteration follows declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionTable {
    regions: Vec<Region>,
}

impl RegionTable {
    /// Build a table, rejecting empty or duplicate names and negative extents.
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut seen = HashSet::new();
        for region in &regions {
            if region.name.trim().is_empty() {
                return Err(CropError::Config("region with empty name".to_string()));
            }
            if !seen.insert(region.name.as_str()) {
                return Err(CropError::Config(format!("duplicate region name '{}'", region.name)));
            }
            if region.half_width < 0 || region.half_height < 0 {
                return Err(CropError::Config(format!(
                    "region '{}' has negative half extents ({}, {})",
                    region.name, region.half_width, region.half_height
                )));
            }
        }
        Ok(Self { regions })
    }

    /// The 17 islands of the built-in world map.
    pub fn builtin() -> Result<Self> {
        Self::new(RegionsFile::embedded()?.regions)
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Rescale every region, e.g. when the source image is a resized export of the canonical map.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            regions: self.regions.iter().map(|r| r.scaled(sx, sy)).collect(),
        }
    }

    /// Keep only the named regions, preserving table order.
    pub fn retain_named(&self, names: &[String]) -> Result<Self> {
        if let Some(missing) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(CropError::UnknownRegion(missing.clone()));
        }
        Ok(Self {
            regions: self
                .regions
                .iter()
                .filter(|r| names.contains(&r.name))
                .cloned()
                .collect(),
        })
    }
}
