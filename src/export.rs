//! Writing island crops and the placement manifest.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use serde::Serialize;

use crate::crop::{CropBounds, Placement};
use crate::error::Result;

/// Create the output directory (and parents) if it does not exist yet.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Output path for a region: `<dir>/<name>.png`
pub fn output_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.png", name))
}

/// Save a processed crop as PNG, overwriting any previous file.
pub fn save_crop(dir: &Path, name: &str, image: &RgbaImage) -> Result<PathBuf> {
    let path = output_path(dir, name);
    image.save_with_format(&path, ImageFormat::Png)?;
    Ok(path)
}

/// One manifest record per written island
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub bounds: CropBounds,
    pub placement: Placement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<[u8; 3]>,
}

/// Placement data for downstream layout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Manifest {
    pub source_width: u32,
    pub source_height: u32,
    pub policy: String,
    pub islands: Vec<ManifestEntry>,
}

impl Manifest {
    /// Write as pretty-printed `manifest.json` in `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("manifest.json");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
