//! Run configuration.
//!
//! Values come from built-in defaults, optionally overridden by a JSON config
//! file, optionally overridden again by command-line flags in `main`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::background::{BackgroundClassifier, BackgroundPolicy, EdgeSampledDistance, StatisticalThreshold};
use crate::error::{CropError, Result};
use crate::regions::{Region, RegionTable, CANONICAL_MAP_SIZE};

/// What to do when the source image is not the resolution the regions were measured on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMismatch {
    /// Abort the run
    #[default]
    Reject,
    /// Scale the region table to the actual image size
    Rescale,
}

/// Configuration for a cropping run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// World map to crop from
    pub source_path: PathBuf,
    /// Directory receiving one PNG per region
    pub output_dir: PathBuf,
    /// Region list; the built-in island table when absent
    pub regions: Option<Vec<Region>>,
    /// Restrict the run to these region names (empty = all)
    pub only: Vec<String>,
    pub policy: BackgroundPolicy,
    /// Alpha blur sigma; defaults per policy
    pub blur_radius: Option<f32>,
    /// Spread threshold (statistical) or color distance (edge-sampled); defaults per policy
    pub threshold: Option<f32>,
    /// Exclusive brightness window for the statistical policy
    pub min_brightness: f32,
    pub max_brightness: f32,
    /// Resolution the region coordinates refer to; `null` disables the check
    pub canonical_size: Option<(u32, u32)>,
    pub size_mismatch: SizeMismatch,
    /// Process regions on the rayon thread pool
    pub parallel: bool,
    /// Write `manifest.json` with placement data next to the crops
    pub write_manifest: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        let statistical = StatisticalThreshold::default();
        Self {
            source_path: PathBuf::from("fisch-world-map.png"),
            output_dir: PathBuf::from("islands"),
            regions: None,
            only: Vec::new(),
            policy: BackgroundPolicy::default(),
            blur_radius: None,
            threshold: None,
            min_brightness: statistical.min_brightness,
            max_brightness: statistical.max_brightness,
            canonical_size: Some(CANONICAL_MAP_SIZE),
            size_mismatch: SizeMismatch::default(),
            parallel: true,
            write_manifest: false,
        }
    }
}

impl CropConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| match e {
            CropError::Json(e) => CropError::Config(format!("{}: {}", path.display(), e)),
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric parameters for values the pipeline cannot use.
    pub fn validate(&self) -> Result<()> {
        if let Some(radius) = self.blur_radius {
            if !radius.is_finite() || radius < 0.0 {
                return Err(CropError::Config(format!("blur_radius must be >= 0, got {}", radius)));
            }
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(CropError::Config(format!("threshold must be >= 0, got {}", threshold)));
            }
        }
        if self.min_brightness >= self.max_brightness {
            return Err(CropError::Config(format!(
                "min_brightness ({}) must be below max_brightness ({})",
                self.min_brightness, self.max_brightness
            )));
        }
        if let Some((w, h)) = self.canonical_size {
            if w == 0 || h == 0 {
                return Err(CropError::Config(format!("canonical_size must be non-zero, got {}x{}", w, h)));
            }
        }
        Ok(())
    }

    /// The configured region table, filtered by `only`.
    pub fn region_table(&self) -> Result<RegionTable> {
        let table = match &self.regions {
            Some(regions) => RegionTable::new(regions.clone())?,
            None => RegionTable::builtin()?,
        };
        if self.only.is_empty() {
            Ok(table)
        } else {
            table.retain_named(&self.only)
        }
    }

    pub fn effective_blur_radius(&self) -> f32 {
        self.blur_radius.unwrap_or_else(|| self.policy.default_blur_radius())
    }

    pub fn effective_threshold(&self) -> f32 {
        self.threshold.unwrap_or_else(|| self.policy.default_threshold())
    }

    /// Build the classifier for one crop. `None` when the crop has no pixels to sample.
    pub fn classifier_for(&self, crop: &image::RgbaImage) -> Option<Box<dyn BackgroundClassifier>> {
        match self.policy {
            BackgroundPolicy::StatisticalThreshold => Some(Box::new(StatisticalThreshold {
                max_spread: self.effective_threshold(),
                min_brightness: self.min_brightness,
                max_brightness: self.max_brightness,
            })),
            BackgroundPolicy::EdgeSampledDistance => {
                let classifier = EdgeSampledDistance::from_crop(crop, self.effective_threshold())?;
                Some(Box::new(classifier))
            }
        }
    }
}
