//! Ocean (background) detection and removal.
//!
//! Two classifiers are available:
//! - Statistical threshold: ocean pixels are low-saturation and mid-brightness,
//!   independent of crop content
//! - Edge-sampled distance: estimate the ocean color from the crop border and
//!   remove everything close to it in RGB space

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Which background classifier to run on each crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundPolicy {
    #[default]
    StatisticalThreshold,
    EdgeSampledDistance,
}

impl BackgroundPolicy {
    /// Parse from string (for CLI)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "statistical-threshold" | "statistical" | "threshold" | "a" => Some(Self::StatisticalThreshold),
            "edge-sampled-distance" | "edge-sampled" | "edge" | "b" => Some(Self::EdgeSampledDistance),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StatisticalThreshold => "statistical-threshold",
            Self::EdgeSampledDistance => "edge-sampled-distance",
        }
    }

    /// Classification threshold used when none is configured
    pub fn default_threshold(&self) -> f32 {
        match self {
            Self::StatisticalThreshold => 38.0,
            Self::EdgeSampledDistance => 42.0,
        }
    }

    /// Alpha blur radius used when none is configured
    pub fn default_blur_radius(&self) -> f32 {
        match self {
            Self::StatisticalThreshold => 1.2,
            Self::EdgeSampledDistance => 1.5,
        }
    }
}

/// Decides per pixel whether it belongs to the ocean.
pub trait BackgroundClassifier {
    fn is_background(&self, pixel: &Rgba<u8>) -> bool;

    /// Estimated background color, for classifiers that derive one.
    fn sampled_color(&self) -> Option<[u8; 3]> {
        None
    }
}

/// Global color-statistics classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticalThreshold {
    /// Pixels with `max(RGB) - min(RGB)` below this are candidates
    pub max_spread: f32,
    /// Exclusive brightness window, brightness = mean of RGB
    pub min_brightness: f32,
    pub max_brightness: f32,
}

impl Default for StatisticalThreshold {
    fn default() -> Self {
        Self {
            max_spread: 38.0,
            min_brightness: 65.0,
            max_brightness: 168.0,
        }
    }
}

impl StatisticalThreshold {
    pub fn spread(pixel: &Rgba<u8>) -> f32 {
        let [r, g, b, _] = pixel.0;
        (r.max(g).max(b) - r.min(g).min(b)) as f32
    }

    pub fn brightness(pixel: &Rgba<u8>) -> f32 {
        let [r, g, b, _] = pixel.0;
        (r as f32 + g as f32 + b as f32) / 3.0
    }
}

impl BackgroundClassifier for StatisticalThreshold {
    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        let brightness = Self::brightness(pixel);
        Self::spread(pixel) < self.max_spread
            && brightness > self.min_brightness
            && brightness < self.max_brightness
    }
}

/// Color-distance classifier against a background color sampled from the crop border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSampledDistance {
    pub background: [f32; 3],
    pub max_distance: f32,
}

impl EdgeSampledDistance {
    /// Sample the border of `crop` and build a classifier from its median color.
    /// Returns `None` for an empty image.
    pub fn from_crop(crop: &RgbaImage, max_distance: f32) -> Option<Self> {
        let population = sample_border(crop);
        let background = median_rgb(&population)?;
        Some(Self { background, max_distance })
    }

    pub fn distance(&self, pixel: &Rgba<u8>) -> f32 {
        let [r, g, b, _] = pixel.0;
        let dr = r as f32 - self.background[0];
        let dg = g as f32 - self.background[1];
        let db = b as f32 - self.background[2];
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

impl BackgroundClassifier for EdgeSampledDistance {
    fn is_background(&self, pixel: &Rgba<u8>) -> bool {
        self.distance(pixel) < self.max_distance
    }

    fn sampled_color(&self) -> Option<[u8; 3]> {
        Some(self.background.map(|c| c.round().clamp(0.0, 255.0) as u8))
    }
}

/// Border width used for sampling: `min(8, h/4, w/4)`, kept within `[1, min(w, h)]`.
pub fn border_width(width: u32, height: u32) -> u32 {
    8.min(height / 4).min(width / 4).max(1).min(width.min(height))
}

/// Collect the candidate background population from the crop border.
///
/// Top and bottom bands span the full width; the left and right bands cover
/// only the rows between them. When the crop is too short for that middle
/// band, the side bands use the full height so every edge group contributes
/// at least one pixel.
pub fn sample_border(crop: &RgbaImage) -> Vec<[u8; 3]> {
    let (w, h) = crop.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let b = border_width(w, h);
    let rgb = |x: u32, y: u32| {
        let p = crop.get_pixel(x, y);
        [p[0], p[1], p[2]]
    };

    let mut samples = Vec::with_capacity((2 * b * w + 2 * b * h) as usize);

    for y in (0..b).chain(h - b..h) {
        for x in 0..w {
            samples.push(rgb(x, y));
        }
    }

    let side_rows = if b < h.saturating_sub(b) { b..h - b } else { 0..h };
    for y in side_rows {
        for x in (0..b).chain(w - b..w) {
            samples.push(rgb(x, y));
        }
    }

    samples
}

/// Per-channel median; the two middle values are averaged for even counts.
pub fn median_rgb(samples: &[[u8; 3]]) -> Option<[f32; 3]> {
    if samples.is_empty() {
        return None;
    }

    let mut result = [0.0f32; 3];
    let mut channel: Vec<u8> = Vec::with_capacity(samples.len());
    for (c, out) in result.iter_mut().enumerate() {
        channel.clear();
        channel.extend(samples.iter().map(|s| s[c]));
        channel.sort_unstable();

        let mid = channel.len() / 2;
        *out = if channel.len() % 2 == 0 {
            (channel[mid - 1] as f32 + channel[mid] as f32) / 2.0
        } else {
            channel[mid] as f32
        };
    }
    Some(result)
}

/// Zero the alpha of every background pixel. Color channels and the alpha of
/// foreground pixels are untouched. Returns the number of pixels cleared.
pub fn remove_background(crop: &mut RgbaImage, classifier: &dyn BackgroundClassifier) -> usize {
    let mut removed = 0;
    for pixel in crop.pixels_mut() {
        if classifier.is_background(pixel) {
            pixel[3] = 0;
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100x100 gray (120) image with a red square over [40, 60)
    fn gray_with_red_square() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(100, 100, Rgba([120, 120, 120, 255]));
        for y in 40..60 {
            for x in 40..60 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        img
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(BackgroundPolicy::from_str("Statistical-Threshold"), Some(BackgroundPolicy::StatisticalThreshold));
        assert_eq!(BackgroundPolicy::from_str("edge"), Some(BackgroundPolicy::EdgeSampledDistance));
        assert_eq!(BackgroundPolicy::from_str("magic"), None);

        let parsed: BackgroundPolicy = serde_json::from_str("\"edge-sampled-distance\"").unwrap();
        assert_eq!(parsed, BackgroundPolicy::EdgeSampledDistance);
    }

    #[test]
    fn test_statistical_gray_and_red() {
        let mut img = gray_with_red_square();
        let removed = remove_background(&mut img, &StatisticalThreshold::default());

        assert_eq!(removed, 100 * 100 - 20 * 20);
        for (x, y, p) in img.enumerate_pixels() {
            let inside = (40..60).contains(&x) && (40..60).contains(&y);
            if inside {
                assert_eq!(*p, Rgba([255, 0, 0, 255]));
            } else {
                assert_eq!(*p, Rgba([120, 120, 120, 0]));
            }
        }
    }

    #[test]
    fn test_statistical_boundaries_are_exclusive() {
        let classifier = StatisticalThreshold::default();
        // brightness exactly 65 and 168 are kept
        assert!(!classifier.is_background(&Rgba([65, 65, 65, 255])));
        assert!(!classifier.is_background(&Rgba([168, 168, 168, 255])));
        assert!(classifier.is_background(&Rgba([66, 66, 66, 255])));
        assert!(classifier.is_background(&Rgba([167, 167, 167, 255])));
        // spread 38 is kept, 37 removed
        assert!(!classifier.is_background(&Rgba([100, 138, 100, 255])));
        assert!(classifier.is_background(&Rgba([100, 137, 100, 255])));
    }

    #[test]
    fn test_statistical_background_satisfies_predicates() {
        let classifier = StatisticalThreshold::default();
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(19) {
                    let p = Rgba([r as u8, g as u8, b as u8, 255]);
                    if classifier.is_background(&p) {
                        let brightness = StatisticalThreshold::brightness(&p);
                        assert!(StatisticalThreshold::spread(&p) < 38.0);
                        assert!(brightness > 65.0 && brightness < 168.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_border_width() {
        assert_eq!(border_width(100, 100), 8);
        assert_eq!(border_width(100, 20), 5);
        assert_eq!(border_width(3, 100), 1);
        assert_eq!(border_width(1, 1), 1);
    }

    #[test]
    fn test_sample_border_counts() {
        let img = RgbaImage::new(20, 12);
        // b = 3: 2 * 3 * 20 from top/bottom + 2 * 3 * (12 - 6) from sides
        assert_eq!(sample_border(&img).len(), 120 + 36);
    }

    #[test]
    fn test_sample_border_degenerate_crops() {
        assert!(sample_border(&RgbaImage::new(0, 5)).is_empty());

        // Every edge group still contributes in tiny crops
        assert_eq!(sample_border(&RgbaImage::new(1, 1)).len(), 4);
        assert_eq!(sample_border(&RgbaImage::new(7, 1)).len(), 7 + 7 + 2);
        assert_eq!(sample_border(&RgbaImage::new(1, 7)).len(), 2 + 2 * 5);
    }

    #[test]
    fn test_median_rgb() {
        assert_eq!(median_rgb(&[]), None);
        assert_eq!(median_rgb(&[[1, 2, 3]]), Some([1.0, 2.0, 3.0]));
        let samples = [[10, 0, 5], [30, 0, 5], [20, 100, 5], [40, 100, 6]];
        assert_eq!(median_rgb(&samples), Some([25.0, 50.0, 5.0]));
    }

    #[test]
    fn test_edge_sampled_removes_border_color() {
        let mut img = gray_with_red_square();
        let classifier = EdgeSampledDistance::from_crop(&img, 42.0).unwrap();
        assert_eq!(classifier.sampled_color(), Some([120, 120, 120]));

        let removed = remove_background(&mut img, &classifier);
        assert_eq!(removed, 100 * 100 - 20 * 20);
        assert_eq!(img.get_pixel(50, 50)[3], 255);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_edge_sampled_background_within_distance() {
        let mut img = RgbaImage::new(32, 32);
        for (x, y, p) in img.enumerate_pixels_mut() {
            let v = ((x * 7 + y * 13) % 256) as u8;
            *p = Rgba([v, v.wrapping_mul(3), 255 - v, 255]);
        }
        let classifier = EdgeSampledDistance::from_crop(&img, 42.0).unwrap();
        let before = img.clone();
        remove_background(&mut img, &classifier);

        for (x, y, p) in img.enumerate_pixels() {
            let original = before.get_pixel(x, y);
            if p[3] == 0 {
                assert!(classifier.distance(original) < 42.0);
            } else {
                assert!(classifier.distance(original) >= 42.0);
            }
        }
    }

    #[test]
    fn test_removal_only_touches_alpha() {
        let source = gray_with_red_square();
        for classifier in [
            Box::new(StatisticalThreshold::default()) as Box<dyn BackgroundClassifier>,
            Box::new(EdgeSampledDistance::from_crop(&source, 42.0).unwrap()),
        ] {
            let mut img = source.clone();
            remove_background(&mut img, classifier.as_ref());
            for (a, b) in img.pixels().zip(source.pixels()) {
                assert_eq!(a.0[..3], b.0[..3]);
            }
        }
    }
}
