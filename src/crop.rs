//! Clamped crop rectangles and sub-image extraction.

use image::RgbaImage;
use serde::Serialize;

use crate::regions::Region;

/// Pixel bounds of a crop, half-open: `[x1, x2) x [y1, y2)`.
///
/// Always satisfies `0 <= x1 <= x2 <= W` and `0 <= y1 <= y2 <= H` for the
/// image size it was clamped against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CropBounds {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// Placement of a crop on the full map, as percentages of the image size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
}

impl CropBounds {
    /// Clamp a region's rectangle to a `width x height` image.
    pub fn clamped(region: &Region, width: u32, height: u32) -> Self {
        let clamp_axis = |center: i32, half: i32, extent: u32| -> (u32, u32) {
            let extent = extent as i64;
            let lo = (center as i64 - half as i64).clamp(0, extent);
            let hi = (center as i64 + half as i64).clamp(0, extent);
            (lo as u32, hi.max(lo) as u32)
        };

        let (x1, x2) = clamp_axis(region.center_x, region.half_width, width);
        let (y1, y2) = clamp_axis(region.center_y, region.half_height, height);
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Left/top offset and width relative to the full image, in percent.
    pub fn placement(&self, image_width: u32, image_height: u32) -> Placement {
        let pct = |v: u32, total: u32| {
            if total == 0 {
                0.0
            } else {
                v as f64 / total as f64 * 100.0
            }
        };
        Placement {
            left_pct: pct(self.x1, image_width),
            top_pct: pct(self.y1, image_height),
            width_pct: pct(self.width(), image_width),
        }
    }
}

/// Copy the bounded sub-image out of `source`. The result owns its pixels.
pub fn crop(source: &RgbaImage, bounds: &CropBounds) -> RgbaImage {
    image::imageops::crop_imm(source, bounds.x1, bounds.y1, bounds.width(), bounds.height()).to_image()
}
