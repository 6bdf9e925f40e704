//! The cropping run: load the map, then crop, clear the ocean, soften and
//! save every region.
//!
//! Regions are independent of each other and only read the source image, so
//! they are processed on the rayon pool unless the config asks for a
//! sequential run. Results are always reported in table order.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::background::remove_background;
use crate::config::{CropConfig, SizeMismatch};
use crate::crop::{crop, CropBounds, Placement};
use crate::error::{CropError, Result};
use crate::export::{self, Manifest, ManifestEntry};
use crate::regions::{Region, RegionTable};
use crate::smoothing::smooth_alpha;

/// Open the source map and convert it to RGBA8.
pub fn load_source(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|cause| CropError::Source {
        path: path.to_path_buf(),
        cause,
    })?;
    Ok(img.to_rgba8())
}

/// Check the image size against the table's canonical resolution and apply the
/// mismatch policy.
pub fn fit_regions(config: &CropConfig, table: RegionTable, width: u32, height: u32) -> Result<RegionTable> {
    let Some((cw, ch)) = config.canonical_size else {
        return Ok(table);
    };
    if (cw, ch) == (width, height) {
        return Ok(table);
    }

    match config.size_mismatch {
        SizeMismatch::Reject => Err(CropError::SizeMismatch {
            expected: (cw, ch),
            actual: (width, height),
        }),
        SizeMismatch::Rescale => {
            let sx = width as f64 / cw as f64;
            let sy = height as f64 / ch as f64;
            warn!(
                "Source is {}x{}, regions were measured on {}x{}; rescaling by {:.4}x{:.4}",
                width, height, cw, ch, sx, sy
            );
            Ok(table.scaled(sx, sy))
        }
    }
}

/// A crop after background removal and smoothing, not yet written.
pub struct ProcessedCrop {
    pub image: RgbaImage,
    pub bounds: CropBounds,
    /// Pixels classified as background
    pub removed: usize,
    /// Sampled ocean color, edge-sampled policy only
    pub background: Option<[u8; 3]>,
}

/// Crop one region and cut out its background. `None` when the clamped crop is empty.
pub fn process_region(source: &RgbaImage, region: &Region, config: &CropConfig) -> Option<ProcessedCrop> {
    let bounds = CropBounds::clamped(region, source.width(), source.height());
    if bounds.is_empty() {
        return None;
    }

    let mut image = crop(source, &bounds);
    let classifier = config.classifier_for(&image)?;
    let removed = remove_background(&mut image, classifier.as_ref());
    smooth_alpha(&mut image, config.effective_blur_radius());

    debug!(
        "{}: {} of {} pixels classified as background",
        region.name,
        removed,
        bounds.width() as u64 * bounds.height() as u64
    );

    Some(ProcessedCrop {
        image,
        bounds,
        removed,
        background: classifier.sampled_color(),
    })
}

/// Summary of one written island
#[derive(Clone, Debug, PartialEq)]
pub struct RegionReport {
    pub name: String,
    pub path: PathBuf,
    pub bounds: CropBounds,
    pub placement: Placement,
    pub removed: usize,
    pub background: Option<[u8; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegionOutcome {
    Written(RegionReport),
    Skipped { name: String, reason: String },
}

/// Result of a whole run
#[derive(Clone, Debug)]
pub struct RunReport {
    pub source_width: u32,
    pub source_height: u32,
    pub outcomes: Vec<RegionOutcome>,
    pub manifest_path: Option<PathBuf>,
}

impl RunReport {
    pub fn written(&self) -> impl Iterator<Item = &RegionReport> {
        self.outcomes.iter().filter_map(|o| match o {
            RegionOutcome::Written(report) => Some(report),
            RegionOutcome::Skipped { .. } => None,
        })
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }
}

fn crop_and_save(source: &RgbaImage, region: &Region, config: &CropConfig) -> Result<RegionOutcome> {
    let Some(processed) = process_region(source, region, config) else {
        warn!("Skipping {}: crop is empty after clamping to the image", region.name);
        return Ok(RegionOutcome::Skipped {
            name: region.name.clone(),
            reason: "empty crop after clamping to image bounds".to_string(),
        });
    };

    let path = export::save_crop(&config.output_dir, &region.name, &processed.image)?;
    Ok(RegionOutcome::Written(RegionReport {
        name: region.name.clone(),
        path,
        bounds: processed.bounds,
        placement: processed.bounds.placement(source.width(), source.height()),
        removed: processed.removed,
        background: processed.background,
    }))
}

/// Run the full pipeline described by `config`.
///
/// The source image is loaded before anything is written, so a missing or
/// unreadable map leaves the output directory untouched.
pub fn run(config: &CropConfig) -> Result<RunReport> {
    config.validate()?;
    let table = config.region_table()?;

    let source = load_source(&config.source_path)?;
    let (width, height) = source.dimensions();
    info!("Loaded {} ({}x{})", config.source_path.display(), width, height);

    let table = fit_regions(config, table, width, height)?;
    export::prepare_output_dir(&config.output_dir)?;

    info!(
        "Cropping {} regions with {} (threshold {}, blur {})",
        table.len(),
        config.policy.name(),
        config.effective_threshold(),
        config.effective_blur_radius()
    );

    let outcomes: Vec<RegionOutcome> = if config.parallel {
        table
            .as_slice()
            .par_iter()
            .map(|region| crop_and_save(&source, region, config))
            .collect::<Result<_>>()?
    } else {
        table
            .iter()
            .map(|region| crop_and_save(&source, region, config))
            .collect::<Result<_>>()?
    };

    let mut report = RunReport {
        source_width: width,
        source_height: height,
        outcomes,
        manifest_path: None,
    };

    if config.write_manifest {
        let manifest = build_manifest(&report, config);
        report.manifest_path = Some(manifest.write(&config.output_dir)?);
    }

    Ok(report)
}

fn build_manifest(report: &RunReport, config: &CropConfig) -> Manifest {
    let islands = report
        .written()
        .map(|r| ManifestEntry {
            name: r.name.clone(),
            file: r
                .path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            width: r.bounds.width(),
            height: r.bounds.height(),
            bounds: r.bounds,
            placement: r.placement,
            background: r.background,
        })
        .collect();

    Manifest {
        source_width: report.source_width,
        source_height: report.source_height,
        policy: config.policy.name().to_string(),
        islands,
    }
}
